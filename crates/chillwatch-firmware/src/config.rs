//! Device configuration
//!
//! Edit these constants to match the installation. Pin assignments live in
//! [`crate::hardware`].

use chillwatch_core::Enclosure;
use chillwatch_core::config::{
    Config, ConfigError, InternetConfig, NetworkConfig, SensorAddresses, Units,
};
use chillwatch_core::sensors::onewire::RomCode;

use crate::wifi_secrets::{WIFI_PASSWORD, WIFI_SSID};

/// `false` leases an address over DHCP and ignores the three fields below.
pub const STATIC_IP: bool = false;
pub const IP_ADDRESS: &str = "192.168.1.242";
pub const NETMASK: &str = "255.255.255.0";
pub const GATEWAY: &str = "192.168.1.1";

/// Monitored enclosures. A single entry switches to single-sensor mode, where
/// the first sensor found on the bus reports for both.
pub const UNITS: &[Enclosure] = &[Enclosure::Fridge, Enclosure::Freezer];

// Sensor addresses, only used when more than one unit is monitored
pub const FRIDGE_ROM: RomCode = RomCode::new([0x28, 0x64, 0x59, 0xAA, 0x05, 0x00, 0x00, 0xE0]);
pub const FREEZER_ROM: RomCode = RomCode::new([0x28, 0x0D, 0xA7, 0xAA, 0x05, 0x00, 0x00, 0xB1]);

/// Validate the constants above into a [`Config`].
pub fn load() -> Result<Config<'static>, ConfigError> {
    Ok(Config {
        internet: InternetConfig::new(WIFI_SSID, WIFI_PASSWORD)?,
        network: NetworkConfig::from_strs(STATIC_IP, IP_ADDRESS, NETMASK, GATEWAY)?,
        units: Units::new(UNITS)?,
        sensors: SensorAddresses {
            fridge: FRIDGE_ROM,
            freezer: FREEZER_ROM,
        },
    })
}
