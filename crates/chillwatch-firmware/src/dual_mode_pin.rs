//! Dual-mode GPIO pin for the one-wire bus
//!
//! The one-wire line is never driven high. "Low" enables the output driver
//! with its latch held low; "high" disables the driver so the external
//! pull-up resistor raises the line. The input buffer stays enabled so the
//! line can be sampled in either mode.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use esp_hal::gpio::{Flex, InputConfig, Pin, Pull};

/// A GPIO that switches between driving low and floating.
pub struct DualModePin<'d> {
    pin: Flex<'d>,
}

impl<'d> DualModePin<'d> {
    pub fn new(pin: impl Pin + 'd) -> Self {
        let mut pin = Flex::new(pin);
        // The weak internal pull-up only helps on short runs; a 4.7k external
        // resistor is still required.
        pin.apply_input_config(&InputConfig::default().with_pull(Pull::Up));
        pin.set_input_enable(true);
        pin.set_low();

        let mut this = Self { pin };
        this.set_as_input();
        this
    }

    /// Release the line to the pull-up
    pub fn set_as_input(&mut self) {
        self.pin.set_output_enable(false);
    }

    /// Pull the line low
    pub fn set_as_output(&mut self) {
        self.pin.set_output_enable(true);
    }
}

impl ErrorType for DualModePin<'_> {
    type Error = Infallible;
}

impl OutputPin for DualModePin<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_as_output();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_as_input();
        Ok(())
    }
}

impl InputPin for DualModePin<'_> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pin.is_high())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pin.is_low())
    }
}
