//! Stand-ins for the hardware, for unit tests
use crate::hal::{AnalogIn, AnalogOut, Channel, TxSlot};
use core::convert::Infallible;
use embedded_can::StandardId;
use embedded_hal::digital::v2::OutputPin;
use embedded_hal::watchdog::Watchdog;
use std::cell::Cell;
use std::rc::Rc;

/// Output pin that remembers its last level. Clones share state.
#[derive(Clone, Default)]
pub struct MockPin {
    level: Rc<Cell<Option<bool>>>,
    writes: Rc<Cell<usize>>,
}

impl MockPin {
    pub fn level(&self) -> Option<bool> {
        self.level.get()
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl OutputPin for MockPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.level.set(Some(false));
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.level.set(Some(true));
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

#[derive(Default)]
pub struct MockAdc {
    pub a: u16,
    pub b: u16,
}

impl AnalogIn for MockAdc {
    fn read(&mut self, channel: Channel) -> u16 {
        match channel {
            Channel::A => self.a,
            Channel::B => self.b,
        }
    }
}

#[derive(Default)]
pub struct MockDac {
    pub writes: Vec<(Channel, u16)>,
}

impl MockDac {
    pub fn last(&self, channel: Channel) -> Option<u16> {
        self.writes
            .iter()
            .rev()
            .find(|(c, _)| *c == channel)
            .map(|(_, v)| *v)
    }
}

impl AnalogOut for MockDac {
    fn write(&mut self, channel: Channel, value: u16) {
        self.writes.push((channel, value));
    }
}

#[derive(Default)]
pub struct MockWatchdog {
    pub feeds: usize,
}

impl Watchdog for MockWatchdog {
    fn feed(&mut self) {
        self.feeds += 1;
    }
}

/// Transmit slot that drains only when told to
pub struct MockTx {
    pub drains: bool,
    pending: bool,
    pub sent: Vec<(u16, Vec<u8>)>,
}

impl MockTx {
    pub fn draining() -> Self {
        Self {
            drains: true,
            pending: false,
            sent: Vec::new(),
        }
    }

    pub fn stuck() -> Self {
        Self {
            drains: false,
            ..Self::draining()
        }
    }
}

impl TxSlot for MockTx {
    fn is_free(&self) -> bool {
        !self.pending
    }

    fn submit(&mut self, id: StandardId, data: &[u8]) {
        assert!(!self.pending, "submitted into a busy slot");
        self.sent.push((id.as_raw(), data.to_vec()));
        self.pending = !self.drains;
    }
}
