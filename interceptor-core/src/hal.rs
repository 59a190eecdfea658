//! Hardware the core drives, as seen from the control logic.
//!
//! The firmware implements these over the real peripherals. Discrete
//! outputs (relay, LED) use embedded-hal's `OutputPin` and the liveness
//! feed uses its `Watchdog`, so only the analog and CAN sides need traits
//! of their own.
use embedded_can::StandardId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    A,
    B,
}

/// Pedal position sensor inputs
pub trait AnalogIn {
    fn read(&mut self, channel: Channel) -> u16;
}

/// Outputs towards the drive-by-wire actuator
pub trait AnalogOut {
    fn write(&mut self, channel: Channel, value: u16);
}

/// Transmit side of the CAN peripheral, one frame slot
pub trait TxSlot {
    /// True once the previously submitted frame has left the slot
    fn is_free(&self) -> bool;

    /// Submit a frame. Only called when `is_free()`.
    fn submit(&mut self, id: StandardId, data: &[u8]);
}
