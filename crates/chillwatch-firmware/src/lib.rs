//! ESP32-S3 firmware-specific modules for chillwatch
//!
//! This crate contains hardware-specific code that cannot compile on desktop
//! targets: ESP32 peripheral initialization, the Wi-Fi link, the one-wire pin
//! driver, WiFi credential management and the TCP server loop.

#![no_std]

extern crate alloc;

pub mod config;
pub mod dual_mode_pin;
pub mod hardware;
pub mod network;
pub mod server;
pub mod wifi_secrets;
