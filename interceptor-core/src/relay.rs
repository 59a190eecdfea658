//! The relay that connects the override path to the actuator.
use core::convert::Infallible;
use embedded_hal::digital::v2::OutputPin;

/// Pin driven high means the relay is closed (override path connected).
/// Boards with an active-low driver pass an inverted pin.
pub struct Relay<P> {
    pin: P,
    closed: bool,
}

impl<P> Relay<P>
where
    P: OutputPin<Error = Infallible>,
{
    /// Takes the pin and opens the relay
    pub fn new(pin: P) -> Self {
        let mut relay = Self { pin, closed: true };
        relay.set(false);
        relay
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[inline]
    pub fn close(&mut self) {
        self.set(true);
    }

    #[inline]
    pub fn open(&mut self) {
        self.set(false);
    }

    /// Drives the pin every call, even when the level doesn't change
    pub fn set(&mut self, closed: bool) {
        let res = if closed {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        res.unwrap_or_else(|never| match never {});

        if closed != self.closed {
            debug!("Relay {}", if closed { "closed" } else { "open" });
            self.closed = closed;
        }
    }
}
