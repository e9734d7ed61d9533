use embedded_hal::i2c::ErrorKind;
use thiserror::Error;

use crate::bus::Register;

/// Everything that can go wrong talking to the sensor.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("no bus bound to the driver, call begin() first")]
    BusNotInitialized,

    #[error("bus read of {register:?} failed: {kind}")]
    BusRead { register: Register, kind: ErrorKind },

    #[error("bus write of {register:?} failed: {kind}")]
    BusWrite { register: Register, kind: ErrorKind },

    #[error("invalid {0} setting")]
    InvalidParameter(&'static str),
}

pub type Result<T> = core::result::Result<T, Error>;
