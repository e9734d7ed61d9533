//! Driver for the Vishay VEML7700 ambient light sensor.
//!
//! The sensor is reached through anything implementing [`RegisterBus`]; [`I2cBus`] provides that
//! on top of an `embedded_hal` I2C peripheral.

pub mod bus;
pub mod device;
pub mod error;
pub mod settings;

pub use bus::{I2C_ADDR, I2cBus, Register, RegisterBus};
pub use device::{ConfigRegister, VALUE_ERROR, Veml7700};
pub use error::{Error, Result};
pub use settings::{
    IntegrationTime, InterruptStatus, PersistenceProtect, SensitivityMode, lux_resolution,
};
