//! Telemetry/echo frames, sent from the fixed-rate timer interrupt.
//!
//! Each tick reports the latest sensor readings and the safety state. A
//! frame still sitting in the transmit slot from the previous tick is a
//! fault in its own right: whoever listens to telemetry is being starved.
use crate::cells::SharedCells;
use crate::crc::Crc8;
use crate::frame::{SequenceIndex, TelemetryFrame};
use crate::hal::TxSlot;
use crate::state::Event;
use core::convert::Infallible;
use embedded_can::StandardId;
use embedded_hal::digital::v2::OutputPin;

pub struct Telemetry<L> {
    id: StandardId,
    crc: &'static Crc8,
    index: SequenceIndex,
    led: L,
    led_on: bool,
}

impl<L> Telemetry<L>
where
    L: OutputPin<Error = Infallible>,
{
    pub fn new(id: StandardId, crc: &'static Crc8, led: L) -> Self {
        Self {
            id,
            crc,
            index: SequenceIndex::default(),
            led,
            led_on: false,
        }
    }

    /// Index the next frame will carry
    #[inline]
    pub fn index(&self) -> SequenceIndex {
        self.index
    }

    /// Returns the frame submitted this tick, or None if the slot was busy
    pub fn tick<T: TxSlot>(&mut self, cells: &SharedCells, tx: &mut T) -> Option<TelemetryFrame> {
        let sent = if tx.is_free() {
            let frame = TelemetryFrame {
                sensors: cells.sensors(),
                state: cells.state(),
                index: self.index,
            };
            tx.submit(self.id, &frame.encode(self.crc));
            Some(frame)
        } else {
            warn!("Telemetry slot not drained");
            cells.raise(Event::TransmitBacklog);
            None
        };

        // Advances on every tick, sent or not
        self.index = self.index.next();
        self.toggle_led();
        sent
    }

    fn toggle_led(&mut self) {
        self.led_on = !self.led_on;
        let res = if self.led_on {
            self.led.set_high()
        } else {
            self.led.set_low()
        };
        res.unwrap_or_else(|never| match never {});
    }
}
