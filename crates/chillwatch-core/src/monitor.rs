//! The monitor context
//!
//! Built once at startup and then owned by the server loop, which passes it by
//! `&mut` into the route handlers. Holds the temperature bus and, for each
//! enclosure, the sensor address and the door switch bound to it.

use embedded_hal::digital::InputPin;
use heapless::Vec;
use log::{info, warn};

use crate::app_state::AppError;
use crate::config::{SensorAddresses, Units};
use crate::enclosure::Enclosure;
use crate::reading::{EnclosureReading, Snapshot};
use crate::sensors::onewire::RomCode;
use crate::sensors::{DoorSwitch, SensorError, TemperatureBus};

struct Binding<P> {
    rom: RomCode,
    door: DoorSwitch<P>,
}

pub struct Monitor<B, P> {
    bus: B,
    /// Indexed by [`Enclosure::index`]
    bindings: [Binding<P>; 2],
}

impl<B, P> Monitor<B, P>
where
    B: TemperatureBus,
    P: InputPin,
{
    /// Scan the bus and bind every enclosure to a sensor and a door pin.
    ///
    /// With more than one unit each enclosure gets its configured address;
    /// the scan is only logged and a mismatch with the wired sensors is not
    /// detected here. With a single unit the first discovered sensor serves
    /// both enclosures.
    pub fn bind(
        mut bus: B,
        units: &Units,
        addresses: &SensorAddresses,
        fridge_door: P,
        freezer_door: P,
    ) -> Result<Self, AppError> {
        let discovered = match bus.scan() {
            Ok(discovered) => discovered,
            Err(e) if units.is_single() => return Err(e.into()),
            Err(e) => {
                warn!("One-wire scan failed: {}", e);
                Vec::new()
            }
        };

        info!("Connected 1-wire devices:");
        for rom in &discovered {
            info!("  {}", rom);
        }

        let (fridge_rom, freezer_rom) = if units.is_single() {
            let rom = *discovered.first().ok_or(AppError::NoSensors)?;
            info!("Single sensor mode: {} serves fridge and freezer", rom);
            (rom, rom)
        } else {
            (
                addresses.for_enclosure(Enclosure::Fridge),
                addresses.for_enclosure(Enclosure::Freezer),
            )
        };

        Ok(Self {
            bus,
            bindings: [
                Binding {
                    rom: fridge_rom,
                    door: DoorSwitch::new(fridge_door),
                },
                Binding {
                    rom: freezer_rom,
                    door: DoorSwitch::new(freezer_door),
                },
            ],
        })
    }

    /// The sensor address bound to an enclosure.
    pub fn sensor_address(&self, enclosure: Enclosure) -> RomCode {
        self.bindings[enclosure.index()].rom
    }

    /// Sample one enclosure's temperature and door state.
    pub fn read(&mut self, enclosure: Enclosure) -> Result<EnclosureReading, SensorError> {
        info!("Reading {} temperature...", enclosure);
        let binding = &mut self.bindings[enclosure.index()];
        let celsius = self.bus.read_celsius(&binding.rom)?;
        let door_open = binding.door.is_open()?;
        let reading = EnclosureReading::new(celsius, door_open);
        info!("  {:?}", reading);
        Ok(reading)
    }

    /// Sample both enclosures.
    pub fn snapshot(&mut self) -> Result<Snapshot, SensorError> {
        Ok(Snapshot {
            fridge: self.read(Enclosure::Fridge)?,
            freezer: self.read(Enclosure::Freezer)?,
        })
    }
}
