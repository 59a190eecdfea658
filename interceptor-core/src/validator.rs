//! Command validation, runs in the CAN receive interrupt.
//!
//! A frame must pass its checksum and carry the sequence index directly
//! after the previous frame's before it has any effect. The stored index
//! follows every checksum-valid frame, in sequence or not, so after one
//! dropped frame the next in-order frame is accepted again.
use crate::cells::SharedCells;
use crate::crc::Crc8;
use crate::frame::{CommandFrame, FrameError, Pair, SequenceIndex, Setpoints};
use crate::relay::Relay;
use crate::state::Event;
use core::convert::Infallible;
use embedded_hal::digital::v2::OutputPin;

/// What the validator did with a frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Verdict {
    /// Discarded, state set to BadChecksumFault
    Rejected(FrameError),
    /// Checksum fine but not the next index. Only the index was updated.
    OutOfSequence {
        expected: SequenceIndex,
        received: SequenceIndex,
    },
    /// Setpoints applied, relay closed
    Enabled(Setpoints),
    /// Setpoints zeroed, relay opened. `clean` if the frame carried no
    /// setpoints, which clears the fault state.
    Disabled { clean: bool },
}

pub struct CommandValidator {
    crc: &'static Crc8,
}

impl CommandValidator {
    pub const fn new(crc: &'static Crc8) -> Self {
        Self { crc }
    }

    pub fn on_frame<P>(&self, data: &[u8], cells: &SharedCells, relay: &mut Relay<P>) -> Verdict
    where
        P: OutputPin<Error = Infallible>,
    {
        let cmd = match CommandFrame::decode(data, self.crc) {
            Ok(cmd) => cmd,
            Err(err) => {
                warn!("Command rejected {:?}", err);
                cells.raise(Event::ChecksumMismatch);
                return Verdict::Rejected(err);
            }
        };

        let previous = cells.sequence();
        cells.set_sequence(cmd.index);
        if !previous.is_followed_by(cmd.index) {
            debug!("Command index {} after {}", cmd.index.raw(), previous.raw());
            return Verdict::OutOfSequence {
                expected: previous.next(),
                received: cmd.index,
            };
        }

        let verdict = if cmd.enable {
            debug!("Setpoints {} {}", cmd.setpoints.a, cmd.setpoints.b);
            relay.close();
            cells.set_setpoints(cmd.setpoints);
            cells.raise(Event::EnableAccepted);
            Verdict::Enabled(cmd.setpoints)
        } else {
            relay.open();
            cells.set_setpoints(Pair::ZERO);
            let clean = cmd.setpoints.is_zero();
            cells.raise(if clean {
                Event::DisableAccepted
            } else {
                Event::DisableWithPayload
            });
            Verdict::Disabled { clean }
        };

        cells.reset_timeout();
        verdict
    }
}
