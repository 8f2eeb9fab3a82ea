//! One-wire addressing and the bridge to the `one-wire-bus` driver
//!
//! The bus protocol itself lives in `one-wire-bus`, which is written against
//! the embedded-hal 0.2 traits. [`BusPin`] and [`BusDelay`] let an
//! embedded-hal 1.0 pin and delay drive it.

use core::cell::RefCell;
use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_02::blocking::delay::{DelayMs, DelayUs};
use embedded_hal_02::digital::v2 as hal02;
use one_wire_bus::Address;
use one_wire_bus::crc::crc8;

use crate::config::ConfigError;

/// The 64-bit ROM code burned into every one-wire device.
///
/// Byte 0 is the family code, bytes 1..7 the serial number and byte 7 the
/// CRC-8 of the first seven bytes. Bytes are kept in bus (transmit) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RomCode(pub [u8; 8]);

impl RomCode {
    pub const fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    pub const fn family(&self) -> u8 {
        self.0[0]
    }

    pub fn is_valid(&self) -> bool {
        crc8(&self.0[..7]) == self.0[7]
    }

    /// Parse 16 hex digits in bus order, as printed by `Display`.
    pub fn from_hex(s: &str) -> Result<Self, ConfigError> {
        let s = s.trim();
        if s.len() != 16 || !s.is_ascii() {
            return Err(ConfigError::InvalidRomCode);
        }

        let mut bytes = [0u8; 8];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| ConfigError::InvalidRomCode)?;
        }

        let rom = Self(bytes);
        if rom.is_valid() {
            Ok(rom)
        } else {
            Err(ConfigError::InvalidRomCode)
        }
    }
}

impl fmt::Display for RomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

// `one-wire-bus` transmits `Address` little-endian, so the family code is the
// low byte.
impl From<Address> for RomCode {
    fn from(address: Address) -> Self {
        Self(address.0.to_le_bytes())
    }
}

impl From<RomCode> for Address {
    fn from(rom: RomCode) -> Self {
        Address(u64::from_le_bytes(rom.0))
    }
}

/// An embedded-hal 1.0 one-wire line seen through the embedded-hal 0.2 pin
/// traits.
///
/// `set_low` must pull the line low and `set_high` must release it to the
/// pull-up; `is_high` samples the line.
pub struct BusPin<P> {
    // 0.2 samples through `&self`, 1.0 through `&mut self`
    pin: RefCell<P>,
}

impl<P> BusPin<P> {
    pub const fn new(pin: P) -> Self {
        Self {
            pin: RefCell::new(pin),
        }
    }

    pub fn into_inner(self) -> P {
        self.pin.into_inner()
    }
}

impl<P: OutputPin> hal02::OutputPin for BusPin<P> {
    type Error = P::Error;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.pin.get_mut().set_low()
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.pin.get_mut().set_high()
    }
}

impl<P: InputPin> hal02::InputPin for BusPin<P> {
    type Error = P::Error;

    fn is_high(&self) -> Result<bool, Self::Error> {
        self.pin.borrow_mut().is_high()
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        self.pin.borrow_mut().is_low()
    }
}

/// An embedded-hal 1.0 delay with the embedded-hal 0.2 blocking delay traits.
pub struct BusDelay<D>(pub D);

impl<D: DelayNs> DelayUs<u16> for BusDelay<D> {
    fn delay_us(&mut self, us: u16) {
        DelayNs::delay_us(&mut self.0, u32::from(us));
    }
}

impl<D: DelayNs> DelayMs<u16> for BusDelay<D> {
    fn delay_ms(&mut self, ms: u16) {
        DelayNs::delay_ms(&mut self.0, u32::from(ms));
    }
}
