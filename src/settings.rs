/// User-facing settings of the VEML7700 and the constant tables that go with them.
///
/// Every enumeration carries an `Invalid` variant. Getters hand it back when the register could
/// not be read, setters refuse it without touching the bus.
use std::fmt;

use serde::Deserialize;

/// ALS sensitivity mode selection (ALS_SM). Declared in register order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SensitivityMode {
    X1,
    X2,
    X1_8,
    X1_4,
    #[serde(skip_deserializing)]
    Invalid,
}

/// ALS integration time (ALS_IT).
///
/// The variants are in simple sequential order. The register field uses a different,
/// non-contiguous encoding, see [`IntegrationTime::code`] and [`IntegrationTime::from_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum IntegrationTime {
    Ms25,
    Ms50,
    Ms100,
    Ms200,
    Ms400,
    Ms800,
    #[serde(skip_deserializing)]
    Invalid,
}

/// ALS persistence protect number (ALS_PERS): how many consecutive threshold crossings are
/// needed before the interrupt flag is raised. Declared in register order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PersistenceProtect {
    One,
    Two,
    Four,
    Eight,
    #[serde(skip_deserializing)]
    Invalid,
}

/// Decoded contents of the interrupt status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptStatus {
    None,
    High,
    Low,
    Both,
    Invalid,
}

pub const NUM_SENSITIVITY_MODES: usize = 4;
pub const NUM_INTEGRATION_TIMES: usize = 6;

/// Lux per count vs. gain and integration time, from the VEML7700 application note.
///
/// Rows follow `SensitivityMode`, columns follow `IntegrationTime`.
const LUX_RESOLUTION: [[f32; NUM_INTEGRATION_TIMES]; NUM_SENSITIVITY_MODES] = [
    // 25ms    50ms    100ms   200ms   400ms   800ms
    [0.2304, 0.1152, 0.0576, 0.0288, 0.0144, 0.0072], // x1
    [0.1152, 0.0576, 0.0288, 0.0144, 0.0072, 0.0036], // x2
    [1.8432, 0.9216, 0.4608, 0.2304, 0.1152, 0.0576], // x1/8
    [0.9216, 0.4608, 0.2304, 0.1152, 0.0576, 0.0288], // x1/4
];

/// ALS_IT register codes, indexed by `IntegrationTime`.
const INTEGRATION_CODES: [u16; NUM_INTEGRATION_TIMES] =
    [0b1100, 0b1000, 0b0000, 0b0001, 0b0010, 0b0011];

const INVALID_STR: &str = "INVALID";

/// Counts-to-lux factor for a pair of settings, `None` if either one is `Invalid`.
pub fn lux_resolution(sm: SensitivityMode, it: IntegrationTime) -> Option<f32> {
    let row = LUX_RESOLUTION.get(sm as usize)?;
    row.get(it as usize).copied()
}

impl SensitivityMode {
    /// Decode the 2-bit ALS_SM field. Every code is a valid setting.
    pub fn from_code(code: u16) -> Self {
        match code & 0b11 {
            0 => SensitivityMode::X1,
            1 => SensitivityMode::X2,
            2 => SensitivityMode::X1_8,
            _ => SensitivityMode::X1_4,
        }
    }

    /// Register code, `None` for `Invalid`.
    pub fn code(self) -> Option<u16> {
        match self {
            SensitivityMode::Invalid => None,
            sm => Some(sm as u16),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SensitivityMode::X1 => "x1",
            SensitivityMode::X2 => "x2",
            SensitivityMode::X1_8 => "x1/8",
            SensitivityMode::X1_4 => "x1/4",
            SensitivityMode::Invalid => INVALID_STR,
        }
    }
}

impl IntegrationTime {
    /// Chip code for this integration time, `None` for `Invalid`.
    ///
    /// The variants are declared in the same order as the code table, so this is a plain index.
    pub fn code(self) -> Option<u16> {
        INTEGRATION_CODES.get(self as usize).copied()
    }

    /// Reverse of [`IntegrationTime::code`]. The ten unused 4-bit patterns decode as `Invalid`.
    pub fn from_code(code: u16) -> Self {
        match code {
            0b1100 => IntegrationTime::Ms25,
            0b1000 => IntegrationTime::Ms50,
            0b0000 => IntegrationTime::Ms100,
            0b0001 => IntegrationTime::Ms200,
            0b0010 => IntegrationTime::Ms400,
            0b0011 => IntegrationTime::Ms800,
            _ => IntegrationTime::Invalid,
        }
    }

    pub fn millis(self) -> Option<u32> {
        match self {
            IntegrationTime::Ms25 => Some(25),
            IntegrationTime::Ms50 => Some(50),
            IntegrationTime::Ms100 => Some(100),
            IntegrationTime::Ms200 => Some(200),
            IntegrationTime::Ms400 => Some(400),
            IntegrationTime::Ms800 => Some(800),
            IntegrationTime::Invalid => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IntegrationTime::Ms25 => "25ms",
            IntegrationTime::Ms50 => "50ms",
            IntegrationTime::Ms100 => "100ms",
            IntegrationTime::Ms200 => "200ms",
            IntegrationTime::Ms400 => "400ms",
            IntegrationTime::Ms800 => "800ms",
            IntegrationTime::Invalid => INVALID_STR,
        }
    }
}

impl PersistenceProtect {
    /// Decode the 2-bit ALS_PERS field. Every code is a valid setting.
    pub fn from_code(code: u16) -> Self {
        match code & 0b11 {
            0 => PersistenceProtect::One,
            1 => PersistenceProtect::Two,
            2 => PersistenceProtect::Four,
            _ => PersistenceProtect::Eight,
        }
    }

    pub fn code(self) -> Option<u16> {
        match self {
            PersistenceProtect::Invalid => None,
            pp => Some(pp as u16),
        }
    }

    /// Number of consecutive crossings this setting stands for.
    pub fn count(self) -> Option<u8> {
        self.code().map(|c| 1 << c)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PersistenceProtect::One => "1",
            PersistenceProtect::Two => "2",
            PersistenceProtect::Four => "4",
            PersistenceProtect::Eight => "8",
            PersistenceProtect::Invalid => INVALID_STR,
        }
    }
}

impl InterruptStatus {
    pub const HIGH_FLAG: u16 = 1 << 14;
    pub const LOW_FLAG: u16 = 1 << 15;

    /// Decode both flags from a single read of the status register.
    ///
    /// Reading the register clears both flags on the chip, so never split this into two reads.
    pub fn from_register(raw: u16) -> Self {
        let high = raw & Self::HIGH_FLAG != 0;
        let low = raw & Self::LOW_FLAG != 0;
        match (high, low) {
            (false, false) => InterruptStatus::None,
            (true, false) => InterruptStatus::High,
            (false, true) => InterruptStatus::Low,
            (true, true) => InterruptStatus::Both,
        }
    }

    pub fn high_exceeded(self) -> bool {
        matches!(self, InterruptStatus::High | InterruptStatus::Both)
    }

    pub fn low_exceeded(self) -> bool {
        matches!(self, InterruptStatus::Low | InterruptStatus::Both)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InterruptStatus::None => "none",
            InterruptStatus::High => "high threshold exceeded",
            InterruptStatus::Low => "low threshold exceeded",
            InterruptStatus::Both => "high and low thresholds exceeded",
            InterruptStatus::Invalid => INVALID_STR,
        }
    }
}

macro_rules! display_as_str {
    ($($t:ty),*) => {
        $(
            impl fmt::Display for $t {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_str!(
    SensitivityMode,
    IntegrationTime,
    PersistenceProtect,
    InterruptStatus
);
