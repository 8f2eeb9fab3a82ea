//! Reported readings and unit conversion

use serde::Serialize;

/// Convert Celsius to Fahrenheit.
pub fn celsius_to_fahrenheit(celsius: f32) -> f32 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Round to two decimal places, ties to even.
///
/// Ties are decided on the exact binary value, so 4.125 becomes 4.12 while
/// 4.375 becomes 4.38.
pub fn round_hundredths(value: f32) -> f32 {
    // Exact: an f32 significand times 100 fits in an f64 significand
    let scaled = f64::from(value) * 100.0;
    if !(-1e15..1e15).contains(&scaled) {
        // Also catches NaN; anything this large has no hundredths to round
        return value;
    }

    let truncated = scaled as i64;
    let fraction = scaled - truncated as f64;
    let odd = truncated % 2 != 0;
    let rounded = if fraction > 0.5 || (fraction == 0.5 && odd) {
        truncated + 1
    } else if fraction < -0.5 || (fraction == -0.5 && odd) {
        truncated - 1
    } else {
        truncated
    };
    rounded as f32 / 100.0
}

/// One enclosure's state as served over HTTP
///
/// Field order is the JSON key order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnclosureReading {
    pub temp_f: f32,
    pub temp_c: f32,
    pub door_open: bool,
}

impl EnclosureReading {
    /// Build a reading from a raw Celsius sample and the raw door pin level.
    ///
    /// Fahrenheit is derived from the already rounded Celsius value so the
    /// two reported numbers always agree with each other.
    pub fn new(celsius: f32, door_open: bool) -> Self {
        let temp_c = round_hundredths(celsius);
        Self {
            temp_f: round_hundredths(celsius_to_fahrenheit(temp_c)),
            temp_c,
            door_open,
        }
    }
}

/// Both enclosures, as served on `/`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Snapshot {
    pub fridge: EnclosureReading,
    pub freezer: EnclosureReading,
}
