//! Reed switch door inputs

use embedded_hal::digital::{Error as _, InputPin};
use log::error;

use super::SensorError;

/// A door reed switch on a pulled-up input.
///
/// The raw pin level is reported as the door state: high means open. There is
/// no inversion and no debouncing, so a change at the pin shows up on the very
/// next read.
pub struct DoorSwitch<P> {
    pin: P,
}

impl<P: InputPin> DoorSwitch<P> {
    pub const fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn is_open(&mut self) -> Result<bool, SensorError> {
        self.pin.is_high().map_err(|e| {
            error!("Door pin read failed: {:?}", e.kind());
            SensorError::ReadFailed {
                sensor: "door",
                operation: "read pin level",
                details: "GPIO error",
            }
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use core::cell::Cell;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorKind, ErrorType};
    use std::rc::Rc;

    /// Input pin whose level the test controls through a shared handle.
    #[derive(Clone, Default)]
    pub(crate) struct FakePin {
        pub(crate) level: Rc<Cell<bool>>,
    }

    impl ErrorType for FakePin {
        type Error = Infallible;
    }

    impl InputPin for FakePin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.level.get())
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.level.get())
        }
    }

    pub(crate) struct BrokenPin;

    impl ErrorType for BrokenPin {
        type Error = ErrorKind;
    }

    impl InputPin for BrokenPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Err(ErrorKind::Other)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Err(ErrorKind::Other)
        }
    }

    #[test]
    fn test_level_passes_through() {
        let pin = FakePin::default();
        let mut door = DoorSwitch::new(pin.clone());

        assert!(!door.is_open().unwrap());
        pin.level.set(true);
        assert!(door.is_open().unwrap());
        pin.level.set(false);
        assert!(!door.is_open().unwrap());
    }

    #[test]
    fn test_pin_error_is_reported() {
        let mut door = DoorSwitch::new(BrokenPin);
        assert!(matches!(
            door.is_open(),
            Err(SensorError::ReadFailed { sensor: "door", .. })
        ));
    }
}
