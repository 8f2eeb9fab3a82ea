//! Desktop simulator for the chillwatch fridge/freezer monitor.
//!
//! Serves the same routes as the firmware over a std `TcpListener`, backed by
//! synthetic temperature sensors and door switches so the endpoints can be
//! exercised without hardware.
//!
//! # Environment
//!
//! | Variable                 | Default                  | Meaning                           |
//! |--------------------------|--------------------------|-----------------------------------|
//! | `CHILLWATCH_ADDR`        | `127.0.0.1:8080`         | Listen address                    |
//! | `CHILLWATCH_UNITS`       | `fridge,freezer`         | Monitored units, comma separated  |
//! | `CHILLWATCH_FRIDGE_ROM`  | simulated fridge sensor  | Configured address, 16 hex digits |
//! | `CHILLWATCH_FREEZER_ROM` | simulated freezer sensor | Configured address, 16 hex digits |
//! | `RUST_LOG`               | unset                    | `env_logger` filter, e.g. `info`  |
//!
//! The simulated bus carries one sensor per configured unit at the default
//! addresses, so configuring any other address reproduces the 500 response of
//! a miswired unit.

use std::convert::Infallible;
use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};

use embedded_hal::digital::{ErrorType, InputPin};
use heapless::Vec;
use log::{error, info, warn};
use thiserror_no_std::Error;

use chillwatch_core::app_state::{AppError, AppRunState, AppState};
use chillwatch_core::config::{SensorAddresses, Units};
use chillwatch_core::http::{MAX_REQUEST_SIZE, find_head_end};
use chillwatch_core::routes::{self, MAX_BODY_SIZE};
use chillwatch_core::sensors::onewire::RomCode;
use chillwatch_core::sensors::{MAX_DEVICES, SensorError, TemperatureBus};
use chillwatch_core::{Enclosure, Monitor};

const DEFAULT_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_UNITS: &str = "fridge,freezer";

const SOCKET_TIMEOUT: Duration = Duration::from_secs(10);

const FRIDGE_ROM: RomCode = RomCode::new([0x28, 0x64, 0x59, 0xAA, 0x05, 0x00, 0x00, 0xE0]);
const FREEZER_ROM: RomCode = RomCode::new([0x28, 0x0D, 0xA7, 0xAA, 0x05, 0x00, 0x00, 0xB1]);

// ---------------------------------------------------------------------------
// Synthetic hardware
// ---------------------------------------------------------------------------

/// A temperature bus with one sensor per enclosure, drifting sinusoidally.
struct SimulatedBus {
    started: Instant,
    devices: Vec<RomCode, MAX_DEVICES>,
}

impl SimulatedBus {
    fn new(units: &Units) -> Self {
        let mut devices = Vec::new();
        for enclosure in units.as_slice() {
            let rom = match enclosure {
                Enclosure::Fridge => FRIDGE_ROM,
                Enclosure::Freezer => FREEZER_ROM,
            };
            // Capacity is larger than the number of enclosures
            let _ = devices.push(rom);
        }
        Self {
            started: Instant::now(),
            devices,
        }
    }

    fn celsius_at(rom: &RomCode, t: f64) -> f32 {
        let celsius = if *rom == FREEZER_ROM {
            // -19.5 to -16.5 °C
            -18.0 + 1.5 * (t / 90.0).sin()
        } else {
            // 2.5 to 4.5 °C
            3.5 + (t / 120.0).sin()
        };
        // DS18B20 resolution is 1/16 °C
        ((celsius * 16.0).round() / 16.0) as f32
    }
}

impl TemperatureBus for SimulatedBus {
    fn scan(&mut self) -> Result<Vec<RomCode, MAX_DEVICES>, SensorError> {
        Ok(self.devices.clone())
    }

    fn read_celsius(&mut self, rom: &RomCode) -> Result<f32, SensorError> {
        if !self.devices.contains(rom) {
            return Err(SensorError::NoPresence {
                sensor: "ds18b20",
                operation: "match ROM",
            });
        }
        Ok(Self::celsius_at(
            rom,
            self.started.elapsed().as_secs_f64(),
        ))
    }
}

/// A door that opens for `open_for` at the start of every `period`.
struct SimulatedDoor {
    started: Instant,
    offset: Duration,
    period: Duration,
    open_for: Duration,
}

impl SimulatedDoor {
    fn new(offset: Duration) -> Self {
        Self {
            started: Instant::now(),
            offset,
            period: Duration::from_secs(90),
            open_for: Duration::from_secs(15),
        }
    }

    fn is_open_at(&self, elapsed: Duration) -> bool {
        let phase = (elapsed + self.offset).as_millis() % self.period.as_millis();
        phase < self.open_for.as_millis()
    }
}

impl ErrorType for SimulatedDoor {
    type Error = Infallible;
}

impl InputPin for SimulatedDoor {
    /// High means open, as with the pulled-up reed switch
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.is_open_at(self.started.elapsed()))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|open| !open)
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

fn serve_connection(
    stream: &mut TcpStream,
    monitor: &mut Monitor<SimulatedBus, SimulatedDoor>,
) -> io::Result<()> {
    stream.set_read_timeout(Some(SOCKET_TIMEOUT))?;
    stream.set_write_timeout(Some(SOCKET_TIMEOUT))?;

    let mut request = [0u8; MAX_REQUEST_SIZE];
    let mut len = 0;
    loop {
        let n = stream.read(&mut request[len..])?;
        if n == 0 {
            if len == 0 {
                return Ok(());
            }
            break;
        }
        len += n;
        if len == request.len() || find_head_end(&request[..len]).is_some() {
            break;
        }
    }

    let mut body = [0u8; MAX_BODY_SIZE];
    let response = routes::handle(&request[..len], monitor, &mut body);
    let head = response
        .head()
        .map_err(|e| io::Error::other(e.to_string()))?;

    stream.write_all(head.as_bytes())?;
    stream.write_all(response.body)?;
    stream.flush()
}

#[derive(Error, Debug)]
enum SimulatorError {
    #[error("{0}")]
    App(#[from] AppError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn rom_from_env(key: &str, default: RomCode) -> Result<RomCode, AppError> {
    match std::env::var(key) {
        Ok(hex) => Ok(RomCode::from_hex(&hex)?),
        Err(_) => Ok(default),
    }
}

fn run(state: &mut AppState) -> Result<Infallible, SimulatorError> {
    let units = Units::parse(&env_or("CHILLWATCH_UNITS", DEFAULT_UNITS)).map_err(AppError::from)?;
    let addresses = SensorAddresses {
        fridge: rom_from_env("CHILLWATCH_FRIDGE_ROM", FRIDGE_ROM)?,
        freezer: rom_from_env("CHILLWATCH_FREEZER_ROM", FREEZER_ROM)?,
    };

    let mut monitor = Monitor::bind(
        SimulatedBus::new(&units),
        &units,
        &addresses,
        SimulatedDoor::new(Duration::ZERO),
        SimulatedDoor::new(Duration::from_secs(45)),
    )?;
    state.transition(AppRunState::SensorsBound);

    let addr = env_or("CHILLWATCH_ADDR", DEFAULT_ADDR);
    let listener = TcpListener::bind(&addr)?;
    state.transition(AppRunState::Serving);
    info!("Listening on http://{}", listener.local_addr()?);

    loop {
        match listener.accept() {
            Ok((mut stream, peer)) => {
                if let Err(e) = serve_connection(&mut stream, &mut monitor) {
                    warn!("connection error from {}: {}", peer, e);
                }
            }
            Err(e) => warn!("accept error: {}", e),
        }
    }
}

fn main() {
    env_logger::init();
    info!("Starting chillwatch simulator");

    let mut state = AppState::new();
    let Err(e) = run(&mut state);

    state.transition(AppRunState::Error);
    error!("Fatal: {}", e);
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(list: &str) -> Units {
        Units::parse(list).unwrap()
    }

    #[test]
    fn test_bus_scans_one_sensor_per_unit() {
        let mut bus = SimulatedBus::new(&units("fridge,freezer"));
        assert_eq!(bus.scan().unwrap().as_slice(), &[FRIDGE_ROM, FREEZER_ROM]);

        let mut bus = SimulatedBus::new(&units("freezer"));
        assert_eq!(bus.scan().unwrap().as_slice(), &[FREEZER_ROM]);
    }

    #[test]
    fn test_temperatures_stay_in_band() {
        for t in (0..600).map(f64::from) {
            let fridge = SimulatedBus::celsius_at(&FRIDGE_ROM, t);
            let freezer = SimulatedBus::celsius_at(&FREEZER_ROM, t);
            assert!((2.5..=4.5).contains(&fridge), "fridge {fridge} at {t}");
            assert!((-19.5..=-16.5).contains(&freezer), "freezer {freezer} at {t}");
        }
    }

    #[test]
    fn test_unknown_sensor_is_absent() {
        let mut bus = SimulatedBus::new(&units("fridge"));
        assert!(matches!(
            bus.read_celsius(&FREEZER_ROM),
            Err(SensorError::NoPresence { .. })
        ));
    }

    #[test]
    fn test_error_messages() {
        let err = SimulatorError::from(AppError::NoSensors);
        assert_eq!(err.to_string(), AppError::NoSensors.to_string());

        let err = SimulatorError::from(io::Error::other("address in use"));
        assert_eq!(err.to_string(), "I/O error: address in use");
    }

    #[test]
    fn test_door_cycle() {
        let door = SimulatedDoor::new(Duration::ZERO);
        assert!(door.is_open_at(Duration::from_secs(0)));
        assert!(door.is_open_at(Duration::from_secs(14)));
        assert!(!door.is_open_at(Duration::from_secs(15)));
        assert!(!door.is_open_at(Duration::from_secs(89)));
        assert!(door.is_open_at(Duration::from_secs(90)));

        let offset = SimulatedDoor::new(Duration::from_secs(45));
        assert!(!offset.is_open_at(Duration::from_secs(0)));
        assert!(offset.is_open_at(Duration::from_secs(45)));
    }
}
