//! Build-time configuration of the interceptor.
//!
//! The firmware picks a `Mode` once at startup and everything else follows
//! from it.
use crate::blend::BlendMode;
use embedded_can::StandardId;

/// Control ticks without an accepted command before the relay is opened
pub const TIMEOUT_TICKS: u32 = 5;

/// Sensor divergence above which the commanded values are ignored
pub const DIVERGENCE_THRESHOLD: u16 = 0x900;

/// Nominal rate of the fixed control tick
pub const TICK_RATE_HZ: u32 = 732;

pub const CAN_BITRATE: u32 = 500_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Pedal interceptor: commanded value can only raise each output
    Direct,
    /// Commanded values drive the outputs unless the sensors disagree
    Divergence,
}

#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub mode: Mode,
    pub blend: BlendMode,
    /// Commands (and boot requests) arrive on this ID
    pub command_id: StandardId,
    /// Telemetry is sent on this ID
    pub telemetry_id: StandardId,
    pub timeout_ticks: u32,
}

const fn std_id(raw: u16) -> StandardId {
    match StandardId::new(raw) {
        Some(id) => id,
        None => panic!("CAN ID out of range"),
    }
}

impl Config {
    pub const fn new(mode: Mode) -> Self {
        let (blend, command, telemetry) = match mode {
            Mode::Direct => (BlendMode::Direct, 0x200, 0x201),
            Mode::Divergence => (
                BlendMode::Divergence {
                    threshold: DIVERGENCE_THRESHOLD,
                },
                0x300,
                0x301,
            ),
        };
        Self {
            mode,
            blend,
            command_id: std_id(command),
            telemetry_id: std_id(telemetry),
            timeout_ticks: TIMEOUT_TICKS,
        }
    }
}
