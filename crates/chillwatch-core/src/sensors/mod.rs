pub mod door;
pub mod onewire;
pub mod temperature;

use heapless::Vec;
use thiserror_no_std::Error;

use onewire::RomCode;

/// Upper bound on devices remembered from a single bus scan.
pub const MAX_DEVICES: usize = 8;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor}: no presence pulse during {operation}")]
    NoPresence {
        sensor: &'static str,
        operation: &'static str,
    },
    #[error("{sensor}: CRC mismatch during {operation}")]
    CrcMismatch {
        sensor: &'static str,
        operation: &'static str,
    },
    #[error("{sensor}: {operation} failed ({details})")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
        details: &'static str,
    },
}

/// A bus of addressable temperature sensors.
///
/// Reads are blocking and are never retried; a failure goes straight back to
/// the caller.
pub trait TemperatureBus {
    /// Enumerate the addresses of every device on the bus.
    fn scan(&mut self) -> Result<Vec<RomCode, MAX_DEVICES>, SensorError>;

    /// Run a conversion on one device and return its temperature in Celsius.
    fn read_celsius(&mut self, rom: &RomCode) -> Result<f32, SensorError>;
}

pub use door::DoorSwitch;
pub use onewire::{BusDelay, BusPin};
pub use temperature::Ds18b20Bus;
