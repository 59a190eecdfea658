//! Command timeout, runs in the fixed-rate timer interrupt.
use crate::cells::SharedCells;
use crate::relay::Relay;
use crate::state::{Event, SafetyState};
use core::convert::Infallible;
use embedded_hal::digital::v2::OutputPin;

pub struct TimeoutMonitor {
    threshold: u32,
}

impl TimeoutMonitor {
    pub const fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    /// Count one control tick. Once `threshold` ticks pass with no accepted
    /// command the state is forced to TimeoutFault and the relay opened,
    /// and both are re-asserted every tick until a command is accepted.
    ///
    /// Returns true while timed out.
    pub fn tick<P>(&self, cells: &SharedCells, relay: &mut Relay<P>) -> bool
    where
        P: OutputPin<Error = Infallible>,
    {
        if cells.count_timeout_tick(self.threshold) < self.threshold {
            return false;
        }

        if cells.state() != SafetyState::TimeoutFault {
            warn!("No command for {} ticks", self.threshold);
        }
        cells.raise(Event::CommandTimeout);
        relay.open();
        true
    }
}
