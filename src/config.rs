use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::info;
use veml7700::{IntegrationTime, PersistenceProtect, RegisterBus, SensitivityMode, Veml7700};

/// USB IDs of the FTDI adapter the sensor hangs off.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
pub struct AdapterConfig {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        // FT232H
        AdapterConfig {
            vendor_id: 0x0403,
            product_id: 0x6014,
        }
    }
}

/// Sensor settings applied on top of the baseline configuration.
#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(default)]
pub struct SensorSettings {
    pub sensitivity: SensitivityMode,
    pub integration_time: IntegrationTime,
    pub persistence: PersistenceProtect,
    pub interrupt: bool,
    pub high_threshold: Option<u16>,
    pub low_threshold: Option<u16>,
}

impl Default for SensorSettings {
    fn default() -> Self {
        SensorSettings {
            sensitivity: SensitivityMode::X1,
            integration_time: IntegrationTime::Ms100,
            persistence: PersistenceProtect::One,
            interrupt: false,
            high_threshold: None,
            low_threshold: None,
        }
    }
}

impl SensorSettings {
    /// Write every setting to the sensor, stopping at the first failure.
    ///
    /// Thresholds go in before the interrupt is enabled so it never fires against stale values.
    pub fn apply_to<B: RegisterBus>(&self, sensor: &mut Veml7700<B>) -> veml7700::Result<()> {
        sensor.set_sensitivity_mode(self.sensitivity)?;
        sensor.set_integration_time(self.integration_time)?;
        sensor.set_persistence_protect(self.persistence)?;

        if let Some(high) = self.high_threshold {
            sensor.set_high_threshold(high)?;
        }
        if let Some(low) = self.low_threshold {
            sensor.set_low_threshold(low)?;
        }

        sensor.enable_interrupt(self.interrupt)?;

        info!(
            "applied sensor settings: gain={}, integration={}, persistence={}, interrupt={}",
            self.sensitivity, self.integration_time, self.persistence, self.interrupt
        );
        Ok(())
    }
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub adapter: AdapterConfig,
    #[serde(default)]
    pub sensor: SensorSettings,
    /// How often to read the sensor in the `run` loop.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

impl Config {
    pub fn from_str(conf: &str) -> Result<Self, anyhow::Error> {
        Ok(ron::from_str::<Config>(conf)?)
    }

    pub fn read_from_file<P: AsRef<Path>>(file: P) -> Result<Self, anyhow::Error> {
        Ok(ron::de::from_reader(BufReader::new(File::open(file)?))?)
    }
}
