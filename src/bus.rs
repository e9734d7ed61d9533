/// Register-level access to the VEML7700 over I2C.
///
/// Datasheet for the sensor: https://www.vishay.com/docs/84286/veml7700.pdf
///
/// Every register on this part is 16 bits wide and is addressed by a one byte command code.
/// Values go over the wire LSB first.
use embedded_hal::i2c::{Error as _, ErrorKind, I2c, SevenBitAddress};
use log::{debug, trace};

/// Fixed bus address, the part has no address select pin.
pub const I2C_ADDR: SevenBitAddress = 0x10;

/// Register map. Command codes 3 and 7 are not used by this part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    Configuration = 0x00,
    HighThreshold = 0x01,
    LowThreshold = 0x02,
    AmbientOutput = 0x04,
    WhiteOutput = 0x05,
    InterruptStatus = 0x06,
}

impl Register {
    pub const fn command(self) -> u8 {
        self as u8
    }
}

/// Anything that can read and write whole 16-bit registers of the sensor.
pub trait RegisterBus {
    fn read_register(&mut self, register: Register) -> Result<u16, ErrorKind>;
    fn write_register(&mut self, register: Register, value: u16) -> Result<(), ErrorKind>;
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn read_register(&mut self, register: Register) -> Result<u16, ErrorKind> {
        (**self).read_register(register)
    }

    fn write_register(&mut self, register: Register, value: u16) -> Result<(), ErrorKind> {
        (**self).write_register(register, value)
    }
}

/// `RegisterBus` on top of an `embedded_hal` I2C implementation.
#[derive(Debug)]
pub struct I2cBus<I: I2c> {
    i2c: I,
}

impl<I: I2c> I2cBus<I> {
    pub fn new(i2c: I) -> Self {
        I2cBus { i2c }
    }

    /// Give back the underlying I2C peripheral.
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: I2c> RegisterBus for I2cBus<I> {
    fn read_register(&mut self, register: Register) -> Result<u16, ErrorKind> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(I2C_ADDR, &[register.command()], &mut buf)
            .map_err(|e| {
                debug!("I2C read failed! register={register:?}, error={e:?}");
                e.kind()
            })?;

        let value = u16::from_le_bytes(buf);
        trace!("read {register:?} = {value:#06x}");
        Ok(value)
    }

    fn write_register(&mut self, register: Register, value: u16) -> Result<(), ErrorKind> {
        let [lsb, msb] = value.to_le_bytes();
        trace!("write {register:?} = {value:#06x}");
        self.i2c
            .write(I2C_ADDR, &[register.command(), lsb, msb])
            .map_err(|e| {
                debug!("I2C write failed! register={register:?}, error={e:?}");
                e.kind()
            })
    }
}
