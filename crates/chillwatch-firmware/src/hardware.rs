//! Sensor hardware initialization
//!
//! | Signal           | GPIO   |
//! |------------------|--------|
//! | One-wire bus     | GPIO6  |
//! | Fridge door      | GPIO7  |
//! | Freezer door     | GPIO8  |
//!
//! Door switches connect the pin to ground while the door is closed.

use chillwatch_core::sensors::{BusDelay, BusPin, Ds18b20Bus, SensorError};
use esp_hal::delay::Delay;
use esp_hal::gpio::{Input, InputConfig, InputPin, Pull};
use esp_hal::peripherals::{GPIO6, GPIO7, GPIO8};
use log::info;

use crate::dual_mode_pin::DualModePin;

/// Conversions block the executor for 750 ms per sensor. The network task
/// stalls while a request is served, which the one-at-a-time server accepts.
pub type SensorBus = Ds18b20Bus<BusPin<DualModePin<'static>>, BusDelay<Delay>>;

pub struct SensorHardware {
    pub bus: SensorBus,
    pub fridge_door: Input<'static>,
    pub freezer_door: Input<'static>,
}

fn door_input<'d>(pin: impl InputPin + 'd) -> Input<'d> {
    Input::new(pin, InputConfig::default().with_pull(Pull::Up))
}

/// Claim the sensor pins and release the one-wire line to its pull-up.
pub fn init_sensor_hardware(
    one_wire: GPIO6<'static>,
    fridge_door: GPIO7<'static>,
    freezer_door: GPIO8<'static>,
) -> Result<SensorHardware, SensorError> {
    let fridge_door = door_input(fridge_door);
    let freezer_door = door_input(freezer_door);

    let bus = Ds18b20Bus::new(
        BusPin::new(DualModePin::new(one_wire)),
        BusDelay(Delay::new()),
    )?;
    info!("One-wire bus ready on GPIO6");

    Ok(SensorHardware {
        bus,
        fridge_door,
        freezer_door,
    })
}
