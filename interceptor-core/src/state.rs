//! The single fault/state register and its transition table.
//!
//! Every handler that can fault reports an `Event`. Each event maps to one
//! fixed target state regardless of the current one ("last write wins"), or
//! to no change at all.
use atomic_enum::atomic_enum;
use enum_iterator::Sequence;

/// Codes are the values reported in the telemetry flags byte
#[atomic_enum]
#[derive(PartialEq, Eq, Sequence)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyState {
    NoFault = 0,
    StartupFault = 1,
    // Not raised by the core, reserved for sensor plausibility checks
    SensorFault = 2,
    SendFault = 3,
    BusErrorFault = 4,
    TimeoutFault = 5,
    BadChecksumFault = 6,
    InvalidChecksumFault = 7,
    // Reserved for bounds checks on commanded values
    RequestTooHighFault = 8,
    RequestInvalidFault = 9,
}

impl SafetyState {
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::NoFault,
            1 => Self::StartupFault,
            2 => Self::SensorFault,
            3 => Self::SendFault,
            4 => Self::BusErrorFault,
            5 => Self::TimeoutFault,
            6 => Self::BadChecksumFault,
            7 => Self::InvalidChecksumFault,
            8 => Self::RequestTooHighFault,
            9 => Self::RequestInvalidFault,
            _ => return None,
        })
    }

    /// Only NoFault grants the override path any authority over the outputs
    #[inline]
    pub fn permits_override(self) -> bool {
        self == Self::NoFault
    }
}

/// Something one of the handlers observed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Sequence)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Command frame failed its checksum (or was truncated)
    ChecksumMismatch,
    /// In-sequence enable command applied
    EnableAccepted,
    /// In-sequence disable command with all-zero setpoints
    DisableAccepted,
    /// In-sequence disable command that still carried setpoints
    DisableWithPayload,
    /// No accepted command for the timeout period
    CommandTimeout,
    /// Previous telemetry frame still waiting in the transmit slot
    TransmitBacklog,
    /// CAN peripheral reported an error condition
    BusError,
}

impl Event {
    /// The state this event forces, if any
    pub const fn target(self) -> Option<SafetyState> {
        match self {
            Event::ChecksumMismatch => Some(SafetyState::BadChecksumFault),
            Event::EnableAccepted => None,
            Event::DisableAccepted => Some(SafetyState::NoFault),
            Event::DisableWithPayload => Some(SafetyState::InvalidChecksumFault),
            Event::CommandTimeout => Some(SafetyState::TimeoutFault),
            Event::TransmitBacklog => Some(SafetyState::SendFault),
            Event::BusError => Some(SafetyState::BusErrorFault),
        }
    }
}

/// Pure transition function for the state register
pub const fn transition(state: SafetyState, event: Event) -> SafetyState {
    match event.target() {
        Some(next) => next,
        None => state,
    }
}
