//! Device configuration
//!
//! The firmware fills these types from source-level constants and build-time
//! credentials; the simulator fills them from its environment. Everything is
//! validated once at startup and is immutable afterwards.

use core::net::Ipv4Addr;

use heapless::Vec;
use thiserror_no_std::Error;

use crate::enclosure::Enclosure;
use crate::sensors::onewire::RomCode;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("WiFi SSID is empty")]
    MissingSsid,
    #[error("invalid IPv4 address for {field}")]
    InvalidAddress { field: &'static str },
    #[error("netmask {0} is not a contiguous prefix")]
    NonContiguousNetmask(Ipv4Addr),
    #[error("no enclosures configured")]
    NoUnits,
    #[error("enclosure {0} configured twice")]
    DuplicateUnit(Enclosure),
    #[error("unknown enclosure name")]
    UnknownUnit,
    #[error("ROM code must be 16 hex digits with a valid CRC")]
    InvalidRomCode,
}

/// Complete device configuration
#[derive(Debug, Clone)]
pub struct Config<'a> {
    pub internet: InternetConfig<'a>,
    pub network: NetworkConfig,
    pub units: Units,
    pub sensors: SensorAddresses,
}

/// Wireless credentials
#[derive(Debug, Clone, Copy)]
pub struct InternetConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

impl<'a> InternetConfig<'a> {
    pub fn new(ssid: &'a str, password: &'a str) -> Result<Self, ConfigError> {
        if ssid.is_empty() {
            return Err(ConfigError::MissingSsid);
        }
        Ok(Self { ssid, password })
    }
}

/// How the station obtains its IPv4 address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkConfig {
    Dhcp,
    Static(StaticIpv4),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticIpv4 {
    pub address: Ipv4Addr,
    pub prefix_len: u8,
    pub gateway: Ipv4Addr,
}

impl NetworkConfig {
    /// Build the network configuration from dotted-quad strings.
    ///
    /// The strings are only parsed when `static_ip` is set; a malformed
    /// address or a non-contiguous netmask is an error, never a silent
    /// fallback to DHCP.
    pub fn from_strs(
        static_ip: bool,
        address: &str,
        netmask: &str,
        gateway: &str,
    ) -> Result<Self, ConfigError> {
        if !static_ip {
            return Ok(NetworkConfig::Dhcp);
        }

        let address = parse_ipv4(address, "ip_address")?;
        let netmask = parse_ipv4(netmask, "netmask")?;
        let gateway = parse_ipv4(gateway, "gateway")?;
        let prefix_len =
            netmask_to_prefix(netmask).ok_or(ConfigError::NonContiguousNetmask(netmask))?;

        Ok(NetworkConfig::Static(StaticIpv4 {
            address,
            prefix_len,
            gateway,
        }))
    }

    pub fn is_static(&self) -> bool {
        matches!(self, NetworkConfig::Static(_))
    }
}

fn parse_ipv4(s: &str, field: &'static str) -> Result<Ipv4Addr, ConfigError> {
    s.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidAddress { field })
}

/// Convert a dotted netmask into a CIDR prefix length.
///
/// Returns `None` when the set bits are not contiguous from the top.
pub fn netmask_to_prefix(mask: Ipv4Addr) -> Option<u8> {
    let value = u32::from_be_bytes(mask.octets());
    let prefix = value.leading_ones();
    let reconstructed = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
    (reconstructed == value).then_some(prefix as u8)
}

/// The ordered set of monitored enclosures
///
/// With a single entry the device runs in single-sensor mode: whatever sensor
/// the bus scan finds first serves both enclosures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Units {
    entries: Vec<Enclosure, 2>,
}

impl Units {
    pub fn new(enclosures: &[Enclosure]) -> Result<Self, ConfigError> {
        if enclosures.is_empty() {
            return Err(ConfigError::NoUnits);
        }

        let mut entries = Vec::new();
        for &enclosure in enclosures {
            if entries.contains(&enclosure) {
                return Err(ConfigError::DuplicateUnit(enclosure));
            }
            // Two distinct enclosures exist, so a third entry is always a duplicate.
            entries
                .push(enclosure)
                .map_err(|_| ConfigError::DuplicateUnit(enclosure))?;
        }

        Ok(Self { entries })
    }

    /// Parse a comma-separated list such as `"fridge,freezer"`.
    pub fn parse(list: &str) -> Result<Self, ConfigError> {
        let mut enclosures: Vec<Enclosure, 4> = Vec::new();
        for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let enclosure = Enclosure::from_name(name).ok_or(ConfigError::UnknownUnit)?;
            enclosures
                .push(enclosure)
                .map_err(|_| ConfigError::DuplicateUnit(enclosure))?;
        }
        Self::new(&enclosures)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_single(&self) -> bool {
        self.entries.len() == 1
    }

    pub fn as_slice(&self) -> &[Enclosure] {
        &self.entries
    }
}

/// Explicit sensor addresses, only consulted when more than one unit is configured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorAddresses {
    pub fridge: RomCode,
    pub freezer: RomCode,
}

impl SensorAddresses {
    pub fn for_enclosure(&self, enclosure: Enclosure) -> RomCode {
        match enclosure {
            Enclosure::Fridge => self.fridge,
            Enclosure::Freezer => self.freezer,
        }
    }
}
