//! Static, per-device configuration surface.

use core::convert::Infallible;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin, PinState};

/// A pin that is always absent: reads high, writes are no-ops.
///
/// Used as the default `ResetPin`/`PowerPin` type parameter for devices that
/// wire neither GPIO and rely solely on the modem's own power-on reset.
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl InputPin for NoPin {
    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(false)
    }
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Wraps an active-high pin so that `set_high`/`set_low` read as active-low,
/// for boards whose power-enable line is wired the other way round.
pub struct ReverseOutputPin<P: OutputPin<Error = Infallible>>(pub P);

impl<P: OutputPin<Error = Infallible>> ErrorType for ReverseOutputPin<P> {
    type Error = Infallible;
}

impl<P: OutputPin<Error = Infallible>> OutputPin for ReverseOutputPin<P> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_high()
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_low()
    }

    fn set_state(&mut self, state: PinState) -> Result<(), Self::Error> {
        match state {
            PinState::Low => self.0.set_state(PinState::High),
            PinState::High => self.0.set_state(PinState::Low),
        }
    }
}

/// Per-device static configuration: GPIOs and PPP dial-up credentials.
///
/// One implementation per device-tree node / board; the values it returns
/// are read once per state transition, never cached by the lifecycle driver.
pub trait CellularConfig {
    /// Active-low power-enable GPIO, asserted for 1500 ms on cold bring-up
    /// and on power-down. Devices with no such line should wire `NoPin`.
    type PowerPin: OutputPin;
    /// Active-high reset GPIO, pulsed for 100 ms when no power pin is present.
    type ResetPin: OutputPin;

    fn power_pin(&mut self) -> Option<&mut Self::PowerPin>;
    fn reset_pin(&mut self) -> Option<&mut Self::ResetPin>;

    /// Access Point Name used in the `AT+CGDCONT` dial command.
    fn apn(&self) -> &str;
    /// PPP username, sent as the third `AT+CGDCONT` field (may be empty).
    fn username(&self) -> &str;
    /// PPP password, sent as the fourth `AT+CGDCONT` field (may be empty).
    fn password(&self) -> &str;
}
