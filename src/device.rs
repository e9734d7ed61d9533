/// Represents a VEML7700 ambient light sensor and provides convenience methods to control & read
/// from it.
///
/// The driver keeps no copy of the sensor configuration. Every getter reads the register, every
/// setter does a read-modify-write of the whole configuration register. Nothing here is atomic
/// with respect to other users of the same bus, callers must serialize access themselves.
use embedded_hal::i2c::I2c;
use log::debug;

use crate::bus::{I2cBus, Register, RegisterBus};
use crate::error::{Error, Result};
use crate::settings::{
    IntegrationTime, InterruptStatus, PersistenceProtect, SensitivityMode, lux_resolution,
};

/// Returned by the bare-value accessors for 16-bit readings when the read failed.
///
/// Also a perfectly legal reading, use the `get_*` forms to tell the two apart.
pub const VALUE_ERROR: u16 = 0xFFFF;

/// Configuration register (ALS_CONF_0), packed as:
///
/// | bits  | field                    |
/// |-------|--------------------------|
/// | 0     | ALS_SD shut down         |
/// | 1     | ALS_INT_EN               |
/// | 2-3   | reserved                 |
/// | 4-5   | ALS_PERS                 |
/// | 6-9   | ALS_IT                   |
/// | 10    | reserved                 |
/// | 11-12 | ALS_SM                   |
/// | 13-15 | reserved                 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigRegister(pub u16);

pub mod field {
    pub const SD_SHIFT: u16 = 0;
    pub const SD_MASK: u16 = 0b1 << SD_SHIFT;
    pub const INT_EN_SHIFT: u16 = 1;
    pub const INT_EN_MASK: u16 = 0b1 << INT_EN_SHIFT;
    pub const PERS_SHIFT: u16 = 4;
    pub const PERS_MASK: u16 = 0b11 << PERS_SHIFT;
    pub const IT_SHIFT: u16 = 6;
    pub const IT_MASK: u16 = 0b1111 << IT_SHIFT;
    pub const SM_SHIFT: u16 = 11;
    pub const SM_MASK: u16 = 0b11 << SM_SHIFT;

    pub const RESERVED_MASK: u16 = !(SD_MASK | INT_EN_MASK | PERS_MASK | IT_MASK | SM_MASK);
}

impl ConfigRegister {
    /// Powered on, interrupts disabled, persistence 1, 100ms, gain x1. All reserved bits clear.
    pub fn baseline() -> Self {
        ConfigRegister(0)
            .with_shutdown(false)
            .with_interrupt_enabled(false)
            .with_field(field::PERS_MASK, field::PERS_SHIFT, 0)
            // 0b0000 is 100ms
            .with_field(field::IT_MASK, field::IT_SHIFT, 0b0000)
            .with_field(field::SM_MASK, field::SM_SHIFT, 0)
    }

    fn field(self, mask: u16, shift: u16) -> u16 {
        (self.0 & mask) >> shift
    }

    /// Replace one field, leaving every other bit (reserved ones included) untouched.
    fn with_field(self, mask: u16, shift: u16, value: u16) -> Self {
        ConfigRegister((self.0 & !mask) | ((value << shift) & mask))
    }

    pub fn shutdown(self) -> bool {
        self.field(field::SD_MASK, field::SD_SHIFT) != 0
    }

    pub fn with_shutdown(self, shutdown: bool) -> Self {
        self.with_field(field::SD_MASK, field::SD_SHIFT, shutdown as u16)
    }

    pub fn interrupt_enabled(self) -> bool {
        self.field(field::INT_EN_MASK, field::INT_EN_SHIFT) != 0
    }

    pub fn with_interrupt_enabled(self, enabled: bool) -> Self {
        self.with_field(field::INT_EN_MASK, field::INT_EN_SHIFT, enabled as u16)
    }

    pub fn persistence_protect(self) -> PersistenceProtect {
        PersistenceProtect::from_code(self.field(field::PERS_MASK, field::PERS_SHIFT))
    }

    /// `None` if `pp` is `Invalid`.
    pub fn with_persistence_protect(self, pp: PersistenceProtect) -> Option<Self> {
        let code = pp.code()?;
        Some(self.with_field(field::PERS_MASK, field::PERS_SHIFT, code))
    }

    pub fn integration_time(self) -> IntegrationTime {
        IntegrationTime::from_code(self.field(field::IT_MASK, field::IT_SHIFT))
    }

    pub fn with_integration_time(self, it: IntegrationTime) -> Option<Self> {
        let code = it.code()?;
        Some(self.with_field(field::IT_MASK, field::IT_SHIFT, code))
    }

    pub fn sensitivity_mode(self) -> SensitivityMode {
        SensitivityMode::from_code(self.field(field::SM_MASK, field::SM_SHIFT))
    }

    pub fn with_sensitivity_mode(self, sm: SensitivityMode) -> Option<Self> {
        let code = sm.code()?;
        Some(self.with_field(field::SM_MASK, field::SM_SHIFT, code))
    }
}

pub struct Veml7700<B: RegisterBus> {
    bus: Option<B>,
}

impl<B: RegisterBus> Default for Veml7700<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: I2c> Veml7700<I2cBus<I>> {
    /// Bind to an I2C peripheral and put the sensor in its baseline configuration.
    pub fn from_i2c(i2c: I) -> Result<Self> {
        Self::from_bus(I2cBus::new(i2c))
    }
}

impl<B: RegisterBus> Veml7700<B> {
    /// A driver with no bus bound. Everything except `begin` fails with `BusNotInitialized`.
    pub const fn new() -> Self {
        Veml7700 { bus: None }
    }

    /// `new` followed by `begin`.
    pub fn from_bus(bus: B) -> Result<Self> {
        let mut sensor = Self::new();
        sensor.begin(Some(bus))?;
        Ok(sensor)
    }

    /// Bind a bus without touching the sensor configuration, for inspecting a part that is
    /// already set up.
    pub fn attach(bus: B) -> Self {
        Veml7700 { bus: Some(bus) }
    }

    /// Bind the bus and write the baseline configuration.
    ///
    /// The sensor keeps its configuration across a host restart if it stayed powered, so this
    /// always overwrites it. Succeeds only if the write succeeded; the value is not read back.
    pub fn begin(&mut self, bus: Option<B>) -> Result<()> {
        let Some(bus) = bus else {
            debug!("begin: no bus supplied");
            return Err(Error::BusNotInitialized);
        };
        self.bus = Some(bus);

        self.write(Register::Configuration, ConfigRegister::baseline().0)
    }

    /// Unbind and hand back the bus.
    pub fn release(self) -> Option<B> {
        self.bus
    }

    fn bus(&mut self) -> Result<&mut B> {
        self.bus.as_mut().ok_or(Error::BusNotInitialized)
    }

    fn read(&mut self, register: Register) -> Result<u16> {
        self.bus()?
            .read_register(register)
            .map_err(|kind| {
                debug!("read of {register:?} failed: {kind}");
                Error::BusRead { register, kind }
            })
    }

    fn write(&mut self, register: Register, value: u16) -> Result<()> {
        self.bus()?
            .write_register(register, value)
            .map_err(|kind| {
                debug!("write of {register:?} failed: {kind}");
                Error::BusWrite { register, kind }
            })
    }

    fn read_config(&mut self) -> Result<ConfigRegister> {
        self.read(Register::Configuration).map(ConfigRegister)
    }

    /// Read the configuration register, change one field, write the whole register back.
    /// Nothing is written if the read fails.
    fn update_config(&mut self, f: impl FnOnce(ConfigRegister) -> ConfigRegister) -> Result<()> {
        let config = self.read_config()?;
        self.write(Register::Configuration, f(config).0)
    }

    /// True if the configuration register can be read. The part has no ID register.
    pub fn is_connected(&mut self) -> bool {
        self.read_config().is_ok()
    }

    // Shut down (ALS_SD)

    pub fn set_shutdown(&mut self, shutdown: bool) -> Result<()> {
        self.update_config(|c| c.with_shutdown(shutdown))
    }

    pub fn power_on(&mut self) -> Result<()> {
        self.set_shutdown(false)
    }

    pub fn shutdown(&mut self) -> Result<()> {
        self.set_shutdown(true)
    }

    pub fn get_shutdown(&mut self) -> Result<bool> {
        self.read_config().map(ConfigRegister::shutdown)
    }

    /// Reports `true` if the register can't be read.
    pub fn is_shutdown(&mut self) -> bool {
        self.get_shutdown().unwrap_or(true)
    }

    // Interrupt enable (ALS_INT_EN)

    pub fn enable_interrupt(&mut self, enable: bool) -> Result<()> {
        self.update_config(|c| c.with_interrupt_enabled(enable))
    }

    pub fn get_interrupt_enabled(&mut self) -> Result<bool> {
        self.read_config().map(ConfigRegister::interrupt_enabled)
    }

    pub fn is_interrupt_enabled(&mut self) -> bool {
        self.get_interrupt_enabled().unwrap_or(false)
    }

    // Persistence protect (ALS_PERS)

    pub fn set_persistence_protect(&mut self, pp: PersistenceProtect) -> Result<()> {
        let code = pp
            .code()
            .ok_or(Error::InvalidParameter("persistence protect"))?;
        self.update_config(|c| c.with_field(field::PERS_MASK, field::PERS_SHIFT, code))
    }

    pub fn get_persistence_protect(&mut self) -> Result<PersistenceProtect> {
        self.read_config().map(ConfigRegister::persistence_protect)
    }

    pub fn persistence_protect(&mut self) -> PersistenceProtect {
        self.get_persistence_protect()
            .unwrap_or(PersistenceProtect::Invalid)
    }

    pub fn persistence_protect_str(&mut self) -> &'static str {
        self.persistence_protect().as_str()
    }

    // Integration time (ALS_IT)

    pub fn set_integration_time(&mut self, it: IntegrationTime) -> Result<()> {
        let code = it
            .code()
            .ok_or(Error::InvalidParameter("integration time"))?;
        self.update_config(|c| c.with_field(field::IT_MASK, field::IT_SHIFT, code))
    }

    /// An unused chip code in the register comes back as `IntegrationTime::Invalid`.
    pub fn get_integration_time(&mut self) -> Result<IntegrationTime> {
        self.read_config().map(ConfigRegister::integration_time)
    }

    pub fn integration_time(&mut self) -> IntegrationTime {
        self.get_integration_time()
            .unwrap_or(IntegrationTime::Invalid)
    }

    pub fn integration_time_str(&mut self) -> &'static str {
        self.integration_time().as_str()
    }

    // Sensitivity mode (ALS_SM)

    pub fn set_sensitivity_mode(&mut self, sm: SensitivityMode) -> Result<()> {
        let code = sm
            .code()
            .ok_or(Error::InvalidParameter("sensitivity mode"))?;
        self.update_config(|c| c.with_field(field::SM_MASK, field::SM_SHIFT, code))
    }

    pub fn get_sensitivity_mode(&mut self) -> Result<SensitivityMode> {
        self.read_config().map(ConfigRegister::sensitivity_mode)
    }

    pub fn sensitivity_mode(&mut self) -> SensitivityMode {
        self.get_sensitivity_mode()
            .unwrap_or(SensitivityMode::Invalid)
    }

    pub fn sensitivity_mode_str(&mut self) -> &'static str {
        self.sensitivity_mode().as_str()
    }

    // Threshold window (ALS_WH, ALS_WL)

    pub fn set_high_threshold(&mut self, threshold: u16) -> Result<()> {
        self.write(Register::HighThreshold, threshold)
    }

    pub fn get_high_threshold(&mut self) -> Result<u16> {
        self.read(Register::HighThreshold)
    }

    pub fn high_threshold(&mut self) -> u16 {
        self.get_high_threshold().unwrap_or(VALUE_ERROR)
    }

    pub fn set_low_threshold(&mut self, threshold: u16) -> Result<()> {
        self.write(Register::LowThreshold, threshold)
    }

    pub fn get_low_threshold(&mut self) -> Result<u16> {
        self.read(Register::LowThreshold)
    }

    pub fn low_threshold(&mut self) -> u16 {
        self.get_low_threshold().unwrap_or(VALUE_ERROR)
    }

    // Output data

    /// Raw ambient light (ALS) counts.
    pub fn get_ambient_light(&mut self) -> Result<u16> {
        self.read(Register::AmbientOutput)
    }

    pub fn ambient_light(&mut self) -> u16 {
        self.get_ambient_light().unwrap_or(VALUE_ERROR)
    }

    /// Raw white channel counts.
    pub fn get_white_level(&mut self) -> Result<u16> {
        self.read(Register::WhiteOutput)
    }

    pub fn white_level(&mut self) -> u16 {
        self.get_white_level().unwrap_or(VALUE_ERROR)
    }

    /// Ambient light in lux: the ALS count times the resolution for the current gain and
    /// integration time.
    ///
    /// Reads sensitivity, integration time and the ALS count in that order and stops at the first
    /// failure. An unused integration code in the register fails with `InvalidParameter` before
    /// the count is read. The result is not clamped to the sensor's physical range (~167k lux).
    pub fn get_lux(&mut self) -> Result<f32> {
        let sm = self.get_sensitivity_mode()?;
        let it = self.get_integration_time()?;
        // the register may hold one of the unused integration codes
        let resolution =
            lux_resolution(sm, it).ok_or(Error::InvalidParameter("integration time"))?;

        let ambient = self.get_ambient_light()?;
        Ok(ambient as f32 * resolution)
    }

    /// Lux, or 0.0 if anything failed.
    pub fn lux(&mut self) -> f32 {
        self.get_lux().unwrap_or(0.0)
    }

    // Interrupt status

    /// Read the interrupt status register once and decode both threshold flags.
    ///
    /// The read itself clears the flags on the chip: a second call only sees crossings that
    /// happened in between.
    pub fn get_interrupt_status(&mut self) -> Result<InterruptStatus> {
        self.read(Register::InterruptStatus)
            .map(InterruptStatus::from_register)
    }

    pub fn interrupt_status(&mut self) -> InterruptStatus {
        self.get_interrupt_status()
            .unwrap_or(InterruptStatus::Invalid)
    }

    /// Clear both threshold flags by reading the status register and dropping the result.
    pub fn clear_interrupt_status(&mut self) -> Result<()> {
        self.get_interrupt_status().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    /// In-memory register file with failure injection and transaction counters.
    #[derive(Debug, Default)]
    struct FakeBus {
        pub regs: [u16; 8],
        pub fail_reads: bool,
        /// Fail reads of this one register only.
        pub fail_register: Option<Register>,
        pub fail_writes: bool,
        pub reads: usize,
        pub writes: Vec<(Register, u16)>,
        /// Clear the status register on read, like the chip does.
        pub clear_status_on_read: bool,
    }

    impl FakeBus {
        pub fn with(regs: &[(Register, u16)]) -> Self {
            let mut bus = FakeBus::default();
            for &(register, value) in regs {
                bus.regs[register.command() as usize] = value;
            }
            bus
        }

        pub fn transactions(&self) -> usize {
            self.reads + self.writes.len()
        }

        pub fn config(&self) -> u16 {
            self.regs[Register::Configuration.command() as usize]
        }
    }

    impl RegisterBus for FakeBus {
        fn read_register(&mut self, register: Register) -> core::result::Result<u16, ErrorKind> {
            self.reads += 1;
            if self.fail_reads || self.fail_register == Some(register) {
                return Err(ErrorKind::Other);
            }
            let value = self.regs[register.command() as usize];
            if self.clear_status_on_read && register == Register::InterruptStatus {
                self.regs[register.command() as usize] = 0;
            }
            Ok(value)
        }

        fn write_register(
            &mut self,
            register: Register,
            value: u16,
        ) -> core::result::Result<(), ErrorKind> {
            self.writes.push((register, value));
            if self.fail_writes {
                return Err(ErrorKind::Other);
            }
            self.regs[register.command() as usize] = value;
            Ok(())
        }
    }

    fn config(it: IntegrationTime, sm: SensitivityMode) -> u16 {
        ConfigRegister::baseline()
            .with_integration_time(it)
            .and_then(|c| c.with_sensitivity_mode(sm))
            .unwrap()
            .0
    }

    #[test]
    fn baseline_is_all_zero() {
        assert_eq!(ConfigRegister(0x0000), ConfigRegister::baseline());
        let c = ConfigRegister::baseline();
        assert!(!c.shutdown());
        assert!(!c.interrupt_enabled());
        assert_eq!(PersistenceProtect::One, c.persistence_protect());
        assert_eq!(IntegrationTime::Ms100, c.integration_time());
        assert_eq!(SensitivityMode::X1, c.sensitivity_mode());
    }

    #[test]
    fn field_layout() {
        let c = ConfigRegister(0)
            .with_shutdown(true)
            .with_interrupt_enabled(true)
            .with_persistence_protect(PersistenceProtect::Eight)
            .and_then(|c| c.with_integration_time(IntegrationTime::Ms25))
            .and_then(|c| c.with_sensitivity_mode(SensitivityMode::X1_4))
            .unwrap();

        assert_eq!(0b000_11_0_1100_11_00_1_1, c.0);
        assert_eq!(0, c.0 & field::RESERVED_MASK);
    }

    #[test]
    fn field_writes_keep_other_bits() {
        // reserved bits set by someone else survive a field update
        let c = ConfigRegister(field::RESERVED_MASK | field::SD_MASK);
        let c = c
            .with_integration_time(IntegrationTime::Ms800)
            .unwrap()
            .with_interrupt_enabled(true);

        assert_eq!(field::RESERVED_MASK, c.0 & field::RESERVED_MASK);
        assert!(c.shutdown());
        assert!(c.interrupt_enabled());
        assert_eq!(IntegrationTime::Ms800, c.integration_time());
    }

    #[test]
    fn begin_without_bus() {
        let mut sensor: Veml7700<FakeBus> = Veml7700::new();
        assert_eq!(Err(Error::BusNotInitialized), sensor.begin(None));
        assert_eq!(Err(Error::BusNotInitialized), sensor.get_ambient_light());
        assert_eq!(VALUE_ERROR, sensor.white_level());
        assert!(!sensor.is_connected());
        assert!(sensor.release().is_none());
    }

    #[test]
    fn begin_writes_baseline() {
        let bus = FakeBus::with(&[(Register::Configuration, 0b1110_0011_1111_0011)]);
        let mut sensor = Veml7700::new();

        sensor.begin(Some(bus)).unwrap();

        let bus = sensor.release().unwrap();
        assert_eq!(vec![(Register::Configuration, 0x0000)], bus.writes);
        assert_eq!(0, bus.reads);
    }

    #[test]
    fn begin_reports_failed_write() {
        let bus = FakeBus {
            fail_writes: true,
            ..Default::default()
        };
        let mut sensor = Veml7700::new();

        assert!(matches!(
            sensor.begin(Some(bus)),
            Err(Error::BusWrite {
                register: Register::Configuration,
                ..
            })
        ));
    }

    #[test]
    fn begin_over_i2c() {
        let expectations = [
            I2cTransaction::write(0x10, vec![0x00, 0x00, 0x00]),
            I2cTransaction::write_read(0x10, vec![0x00], vec![0x00, 0x00]),
        ];
        let i2c = I2cMock::new(&expectations);

        let mut sensor = Veml7700::from_i2c(i2c).unwrap();
        assert!(sensor.is_connected());

        sensor.release().unwrap().release().done();
    }

    #[test]
    fn is_connected_follows_bus() {
        let mut sensor = Veml7700::attach(FakeBus::default());
        assert!(sensor.is_connected());

        let mut sensor = Veml7700::attach(FakeBus {
            fail_reads: true,
            ..Default::default()
        });
        assert!(!sensor.is_connected());
    }

    #[test]
    fn setters_modify_one_field() {
        let mut bus = FakeBus::default();
        let mut sensor = Veml7700::attach(&mut bus);

        sensor.set_integration_time(IntegrationTime::Ms25).unwrap();
        sensor.set_sensitivity_mode(SensitivityMode::X2).unwrap();
        sensor
            .set_persistence_protect(PersistenceProtect::Four)
            .unwrap();
        sensor.enable_interrupt(true).unwrap();
        sensor.shutdown().unwrap();

        assert_eq!(IntegrationTime::Ms25, sensor.integration_time());
        assert_eq!(SensitivityMode::X2, sensor.sensitivity_mode());
        assert_eq!(PersistenceProtect::Four, sensor.persistence_protect());
        assert!(sensor.is_interrupt_enabled());
        assert!(sensor.is_shutdown());

        sensor.power_on().unwrap();
        assert!(!sensor.is_shutdown());
        assert_eq!("25ms", sensor.integration_time_str());
        assert_eq!("x2", sensor.sensitivity_mode_str());
        assert_eq!("4", sensor.persistence_protect_str());

        drop(sensor);
        assert_eq!(0b000_01_0_1100_10_00_1_0, bus.config());
        // every setter is exactly one read then one write
        assert_eq!(6, bus.writes.len());
    }

    #[test]
    fn setter_preserves_reserved_bits_read_back() {
        let mut bus = FakeBus::with(&[(Register::Configuration, 0xE404)]);
        let mut sensor = Veml7700::attach(&mut bus);

        sensor.set_sensitivity_mode(SensitivityMode::X1_8).unwrap();

        drop(sensor);
        assert_eq!(vec![(Register::Configuration, 0xF404)], bus.writes);
    }

    #[test]
    fn no_write_on_read_failure() {
        let mut bus = FakeBus {
            fail_reads: true,
            ..Default::default()
        };
        let mut sensor = Veml7700::attach(&mut bus);

        let read_error = Err(Error::BusRead {
            register: Register::Configuration,
            kind: ErrorKind::Other,
        });
        assert_eq!(read_error, sensor.set_shutdown(true));
        assert_eq!(read_error, sensor.enable_interrupt(true));
        assert_eq!(
            read_error,
            sensor.set_persistence_protect(PersistenceProtect::Two)
        );
        assert_eq!(
            read_error,
            sensor.set_integration_time(IntegrationTime::Ms400)
        );
        assert_eq!(
            read_error,
            sensor.set_sensitivity_mode(SensitivityMode::X1_4)
        );

        drop(sensor);
        assert_eq!(5, bus.reads);
        assert!(bus.writes.is_empty());
    }

    #[test]
    fn write_failure_is_reported() {
        let mut bus = FakeBus {
            fail_writes: true,
            ..Default::default()
        };
        let mut sensor = Veml7700::attach(&mut bus);

        assert_eq!(
            Err(Error::BusWrite {
                register: Register::Configuration,
                kind: ErrorKind::Other,
            }),
            sensor.set_integration_time(IntegrationTime::Ms200)
        );
        assert_eq!(
            Err(Error::BusWrite {
                register: Register::LowThreshold,
                kind: ErrorKind::Other,
            }),
            sensor.set_low_threshold(5)
        );
    }

    #[test]
    fn invalid_parameters_touch_nothing() {
        let mut bus = FakeBus::default();
        let mut sensor = Veml7700::attach(&mut bus);

        assert_eq!(
            Err(Error::InvalidParameter("persistence protect")),
            sensor.set_persistence_protect(PersistenceProtect::Invalid)
        );
        assert_eq!(
            Err(Error::InvalidParameter("integration time")),
            sensor.set_integration_time(IntegrationTime::Invalid)
        );
        assert_eq!(
            Err(Error::InvalidParameter("sensitivity mode")),
            sensor.set_sensitivity_mode(SensitivityMode::Invalid)
        );

        drop(sensor);
        assert_eq!(0, bus.transactions());
    }

    #[test]
    fn getters_fall_back_to_sentinels() {
        let mut bus = FakeBus {
            fail_reads: true,
            ..Default::default()
        };
        let mut sensor = Veml7700::attach(&mut bus);

        assert!(sensor.get_sensitivity_mode().is_err());
        assert_eq!(SensitivityMode::Invalid, sensor.sensitivity_mode());
        assert_eq!(IntegrationTime::Invalid, sensor.integration_time());
        assert_eq!(PersistenceProtect::Invalid, sensor.persistence_protect());
        assert_eq!("INVALID", sensor.integration_time_str());
        assert_eq!("INVALID", sensor.sensitivity_mode_str());
        assert_eq!("INVALID", sensor.persistence_protect_str());
        assert!(sensor.is_shutdown());
        assert!(!sensor.is_interrupt_enabled());
        assert_eq!(VALUE_ERROR, sensor.high_threshold());
        assert_eq!(VALUE_ERROR, sensor.low_threshold());
        assert_eq!(VALUE_ERROR, sensor.ambient_light());
        assert_eq!(VALUE_ERROR, sensor.white_level());
        assert_eq!(0.0, sensor.lux());
        assert_eq!(InterruptStatus::Invalid, sensor.interrupt_status());
    }

    #[test]
    fn unused_integration_code_reads_as_invalid() {
        let raw = 0b0101 << field::IT_SHIFT;
        let mut sensor = Veml7700::attach(FakeBus::with(&[(Register::Configuration, raw)]));

        assert_eq!(Ok(IntegrationTime::Invalid), sensor.get_integration_time());

        let mut bus = sensor.release().unwrap();
        bus.reads = 0;
        let mut sensor = Veml7700::attach(&mut bus);
        assert_eq!(
            Err(Error::InvalidParameter("integration time")),
            sensor.get_lux()
        );

        // stopped before reading the ALS count
        drop(sensor);
        assert_eq!(2, bus.reads);
    }

    #[test]
    fn thresholds_round_trip() {
        let mut sensor = Veml7700::attach(FakeBus::default());

        for value in [0x0000, 0xFFFF] {
            sensor.set_high_threshold(value).unwrap();
            sensor.set_low_threshold(value).unwrap();
            assert_eq!(Ok(value), sensor.get_high_threshold());
            assert_eq!(value, sensor.low_threshold());
        }

        // independent registers
        sensor.set_high_threshold(1234).unwrap();
        sensor.set_low_threshold(99).unwrap();
        assert_eq!(1234, sensor.high_threshold());
        assert_eq!(99, sensor.low_threshold());
    }

    #[test]
    fn raw_readings() {
        let mut sensor = Veml7700::attach(FakeBus::with(&[
            (Register::AmbientOutput, 1000),
            (Register::WhiteOutput, 0xFFFF),
        ]));

        assert_eq!(Ok(1000), sensor.get_ambient_light());
        // a real full-scale reading, only the get_ form can tell it from an error
        assert_eq!(Ok(0xFFFF), sensor.get_white_level());
        assert_eq!(VALUE_ERROR, sensor.white_level());
    }

    #[test]
    fn lux_at_baseline() {
        let mut sensor = Veml7700::attach(FakeBus::with(&[
            (
                Register::Configuration,
                config(IntegrationTime::Ms100, SensitivityMode::X1),
            ),
            (Register::AmbientOutput, 1000),
        ]));

        let lux = sensor.get_lux().unwrap();
        assert!((lux - 57.6).abs() < 1e-3, "lux = {lux}");
    }

    #[test]
    fn lux_uses_current_settings() {
        let mut sensor = Veml7700::attach(FakeBus::with(&[
            (
                Register::Configuration,
                config(IntegrationTime::Ms25, SensitivityMode::X1_8),
            ),
            (Register::AmbientOutput, 100),
        ]));
        assert!((sensor.lux() - 184.32).abs() < 1e-2);

        sensor.set_integration_time(IntegrationTime::Ms800).unwrap();
        sensor.set_sensitivity_mode(SensitivityMode::X2).unwrap();
        assert!((sensor.lux() - 0.36).abs() < 1e-4);
    }

    #[test]
    fn lux_performs_three_reads() {
        let mut bus = FakeBus::with(&[(Register::AmbientOutput, 10)]);
        let mut sensor = Veml7700::attach(&mut bus);
        sensor.get_lux().unwrap();

        drop(sensor);
        assert_eq!(3, bus.reads);
        assert!(bus.writes.is_empty());
    }

    #[test]
    fn lux_stops_at_first_failure() {
        let mut bus = FakeBus {
            fail_reads: true,
            ..Default::default()
        };
        let mut sensor = Veml7700::attach(&mut bus);

        assert_eq!(
            Err(Error::BusRead {
                register: Register::Configuration,
                kind: ErrorKind::Other,
            }),
            sensor.get_lux()
        );

        drop(sensor);
        assert_eq!(1, bus.reads);
    }

    #[test]
    fn lux_reports_failed_ambient_read() {
        let mut bus = FakeBus::with(&[(Register::AmbientOutput, 1000)]);
        bus.fail_register = Some(Register::AmbientOutput);
        let mut sensor = Veml7700::attach(&mut bus);

        assert_eq!(
            Err(Error::BusRead {
                register: Register::AmbientOutput,
                kind: ErrorKind::Other,
            }),
            sensor.get_lux()
        );
        assert_eq!(0.0, sensor.lux());

        drop(sensor);
        // sensitivity, integration time, ALS count; twice
        assert_eq!(6, bus.reads);
        assert!(bus.writes.is_empty());
    }

    #[test]
    fn interrupt_status_single_read() {
        let mut bus = FakeBus::with(&[(Register::InterruptStatus, 0xC000)]);
        bus.clear_status_on_read = true;
        let mut sensor = Veml7700::attach(&mut bus);

        let status = sensor.get_interrupt_status().unwrap();
        assert_eq!(InterruptStatus::Both, status);
        assert!(status.high_exceeded() && status.low_exceeded());

        // flags were cleared by the first read
        assert_eq!(InterruptStatus::None, sensor.interrupt_status());

        drop(sensor);
        assert_eq!(2, bus.reads);
    }

    #[test]
    fn fresh_bus_reports_no_interrupt() {
        let mut sensor = Veml7700::attach(FakeBus::default());
        assert_eq!(InterruptStatus::None, sensor.interrupt_status());
    }

    #[test]
    fn clear_interrupt_status_reads_once() {
        let mut bus = FakeBus::with(&[(Register::InterruptStatus, 0x4000)]);
        bus.clear_status_on_read = true;
        let mut sensor = Veml7700::attach(&mut bus);

        sensor.clear_interrupt_status().unwrap();
        assert_eq!(InterruptStatus::None, sensor.interrupt_status());

        drop(sensor);
        assert_eq!(2, bus.reads);
        assert!(bus.writes.is_empty());
    }
}
