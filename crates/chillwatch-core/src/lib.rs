//! Hardware-independent core library for chillwatch
//!
//! This crate contains all platform-agnostic logic for the fridge/freezer
//! monitor: configuration types, the DS18B20 bus over `one-wire-bus`, door
//! switches, the monitor context, the route table and the HTTP codec.
//!
//! It is `#![no_std]` so it compiles on both embedded targets (ESP32-S3) and
//! desktop hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

pub mod app_state;
pub mod config;
pub mod enclosure;
pub mod http;
pub mod monitor;
pub mod reading;
pub mod routes;
pub mod sensors;

pub use enclosure::Enclosure;
pub use monitor::Monitor;
pub use reading::{EnclosureReading, Snapshot};
