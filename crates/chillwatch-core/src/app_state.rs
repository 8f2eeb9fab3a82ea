//! Application-wide state and error types for chillwatch

use core::fmt::{Debug, Write};
use core::net::Ipv4Addr;

use log::info;
use thiserror_no_std::Error;

use crate::config::ConfigError;
use crate::sensors::SensorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppRunState {
    Uninitialized,
    WifiConnecting,
    WifiConnected,
    SensorsBound,
    Serving,
    Error,
}

/// Startup progress of the device
///
/// Only the startup sequence mutates this; once the server loop runs it is
/// frozen in [`AppRunState::Serving`].
#[derive(Debug)]
pub struct AppState {
    pub run_state: AppRunState,
    pub ipv4: Option<Ipv4Addr>,
}

impl AppState {
    /// Create a new uninitialized app state
    pub const fn new() -> Self {
        Self {
            run_state: AppRunState::Uninitialized,
            ipv4: None,
        }
    }

    /// Move to the next startup phase, logging the transition
    pub fn transition(&mut self, next: AppRunState) {
        info!("State: {:?} -> {:?}", self.run_state, next);
        self.run_state = next;
    }

    /// Record the acquired address and mark the link as up
    pub fn wifi_connected(&mut self, ipv4: Ipv4Addr) {
        info!("Connected to WiFi: {}", ipv4);
        self.ipv4 = Some(ipv4);
        self.transition(AppRunState::WifiConnected);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Fatal startup failures. None of these are retried; the device halts and
/// waits for an external reset.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("WiFi connection failed: {0}")]
    Wifi(heapless::String<64>),
    #[error("No IPv4 configuration within {0} s")]
    NetworkTimeout(u32),
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("No temperature sensors found on the one-wire bus")]
    NoSensors,
    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),
}

impl AppError {
    /// Wrap a driver error, keeping as much of its debug text as fits.
    pub fn wifi(context: &str, err: impl Debug) -> Self {
        Self::Wifi(truncated(format_args!("{}: {:?}", context, err)))
    }
}

/// Format into a fixed-capacity string, dropping whatever does not fit.
pub fn truncated<const N: usize>(args: core::fmt::Arguments<'_>) -> heapless::String<N> {
    struct Truncating<'a, const N: usize>(&'a mut heapless::String<N>);

    impl<const N: usize> Write for Truncating<'_, N> {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            for c in s.chars() {
                if self.0.push(c).is_err() {
                    return Err(core::fmt::Error);
                }
            }
            Ok(())
        }
    }

    let mut out = heapless::String::new();
    // A full buffer ends formatting early; the prefix is what we keep.
    let _ = Truncating(&mut out).write_fmt(args);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let mut state = AppState::new();
        assert_eq!(state.run_state, AppRunState::Uninitialized);

        state.transition(AppRunState::WifiConnecting);
        state.wifi_connected(Ipv4Addr::new(192, 168, 1, 242));
        assert_eq!(state.run_state, AppRunState::WifiConnected);
        assert_eq!(state.ipv4, Some(Ipv4Addr::new(192, 168, 1, 242)));
    }

    #[test]
    fn test_truncated_keeps_prefix() {
        let s: heapless::String<8> = truncated(format_args!("{}-{}", "abcdef", 12345));
        assert_eq!(s.as_str(), "abcdef-1");
    }

    #[test]
    fn test_error_messages() {
        let err = AppError::wifi("connect", "AuthenticationFailed");
        assert_eq!(
            std::format!("{}", err),
            "WiFi connection failed: connect: \"AuthenticationFailed\""
        );

        let err: AppError = ConfigError::NoUnits.into();
        assert_eq!(
            std::format!("{}", err),
            "Invalid configuration: no enclosures configured"
        );
    }
}
