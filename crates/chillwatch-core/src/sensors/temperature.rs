//! DS18B20 temperature sensors on a shared one-wire bus

use ds18b20::{Ds18b20, Resolution};
use embedded_hal_02::blocking::delay::{DelayMs, DelayUs};
use embedded_hal_02::digital::v2::{InputPin, OutputPin};
use heapless::Vec;
use log::{error, warn};
use one_wire_bus::{Address, OneWire, OneWireError};

use super::onewire::RomCode;
use super::{MAX_DEVICES, SensorError, TemperatureBus};

pub use ds18b20::FAMILY_CODE;

const SENSOR: &str = "DS18B20";

/// Convert a CRC-checked scratchpad to degrees Celsius.
///
/// Bytes 0 and 1 hold the signed temperature in 1/16 degree steps. The
/// power-on value of 85.0 is returned as read.
pub fn celsius_from_scratchpad(scratchpad: &[u8; 9]) -> f32 {
    let raw = i16::from_le_bytes([scratchpad[0], scratchpad[1]]);
    f32::from(raw) / 16.0
}

fn bus_error<E>(error: OneWireError<E>, operation: &'static str) -> SensorError {
    let details = match error {
        OneWireError::CrcMismatch => {
            return SensorError::CrcMismatch {
                sensor: SENSOR,
                operation,
            };
        }
        OneWireError::BusNotHigh => "bus held low",
        OneWireError::PinError(_) => "GPIO error",
        OneWireError::UnexpectedResponse => "unexpected response",
        OneWireError::FamilyCodeMismatch => "not a DS18B20",
        OneWireError::Timeout => "timeout",
    };
    SensorError::ReadFailed {
        sensor: SENSOR,
        operation,
        details,
    }
}

/// DS18B20 access through `one-wire-bus`.
///
/// Every read converts and then blocks for the full 12-bit conversion time.
/// Waiting the full time also works for parasite-powered sensors, which
/// cannot signal completion.
pub struct Ds18b20Bus<P, D> {
    wire: OneWire<P>,
    delay: D,
}

impl<P, D, E> Ds18b20Bus<P, D>
where
    P: InputPin<Error = E> + OutputPin<Error = E>,
    D: DelayUs<u16> + DelayMs<u16>,
{
    /// Take the bus pin and release the line to the pull-up.
    pub fn new(pin: P, delay: D) -> Result<Self, SensorError> {
        let wire = OneWire::new(pin).map_err(|e| bus_error(e, "release line"))?;
        Ok(Self { wire, delay })
    }

    fn convert_and_read(&mut self, rom: &RomCode) -> Result<f32, SensorError> {
        let sensor =
            Ds18b20::new::<E>(Address::from(*rom)).map_err(|e| bus_error(e, "address"))?;

        // `send_command` ignores a missing presence pulse
        let present = self
            .wire
            .reset(&mut self.delay)
            .map_err(|e| bus_error(e, "reset"))?;
        if !present {
            return Err(SensorError::NoPresence {
                sensor: SENSOR,
                operation: "match ROM",
            });
        }

        sensor
            .start_temp_measurement(&mut self.wire, &mut self.delay)
            .map_err(|e| bus_error(e, "convert T"))?;
        Resolution::Bits12.delay_for_measurement_time(&mut self.delay);

        // `Ds18b20::read_data` decodes the raw value unsigned
        let scratchpad =
            ds18b20::read_scratchpad(sensor.address(), &mut self.wire, &mut self.delay)
                .map_err(|e| bus_error(e, "read scratchpad"))?;
        Ok(celsius_from_scratchpad(&scratchpad))
    }
}

impl<P, D, E> TemperatureBus for Ds18b20Bus<P, D>
where
    P: InputPin<Error = E> + OutputPin<Error = E>,
    D: DelayUs<u16> + DelayMs<u16>,
{
    /// Devices after a failed search step are dropped with a warning; the
    /// error is only returned when nothing was found.
    fn scan(&mut self) -> Result<Vec<RomCode, MAX_DEVICES>, SensorError> {
        let mut found: Vec<RomCode, MAX_DEVICES> = Vec::new();
        for address in self.wire.devices(false, &mut self.delay) {
            let rom = match address {
                Ok(address) => RomCode::from(address),
                Err(e) if found.is_empty() => return Err(bus_error(e, "search ROM")),
                Err(e) => {
                    warn!("One-wire search stopped early: {}", bus_error(e, "search ROM"));
                    break;
                }
            };
            if rom.family() != FAMILY_CODE {
                warn!("{} is not a DS18B20 (family {:#04x})", rom, rom.family());
            }
            if found.push(rom).is_err() {
                warn!("More than {} one-wire devices, ignoring the rest", MAX_DEVICES);
                break;
            }
        }
        Ok(found)
    }

    fn read_celsius(&mut self, rom: &RomCode) -> Result<f32, SensorError> {
        self.convert_and_read(rom).inspect_err(|e| {
            error!("Reading {} failed: {}", rom, e);
        })
    }
}
