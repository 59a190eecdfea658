//! Wire format of the command and telemetry frames.
//!
//! Both directions share one 6 byte layout:
//!
//! | byte | command             | telemetry              |
//! |------|---------------------|------------------------|
//! | 0    | CRC-8 of bytes 1..6 | CRC-8 of bytes 1..6    |
//! | 1..3 | setpoint 0 (LE)     | sensor A (LE)          |
//! | 3..5 | setpoint 1 (LE)     | sensor B (LE)          |
//! | 5    | enable:1 _:3 idx:4  | state:4 idx:4          |
use crate::crc::Crc8;
use crate::state::SafetyState;
use byteorder::{ByteOrder, LittleEndian};

pub const FRAME_LEN: usize = 6;

const ENABLE_BIT: u8 = 0x80;
const NIBBLE: u8 = 0x0F;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Fewer than FRAME_LEN bytes received
    Length(usize),
    /// Checksum byte doesn't match the payload
    Checksum { expected: u8, received: u8 },
}

/// 4-bit rolling counter, wraps 15 -> 0
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequenceIndex(u8);

impl SequenceIndex {
    /// Only the low nibble of `raw` is kept
    pub const fn new(raw: u8) -> Self {
        Self(raw & NIBBLE)
    }

    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn next(self) -> Self {
        Self::new(self.0.wrapping_add(1))
    }

    /// True if `other` directly follows this index
    #[inline]
    pub fn is_followed_by(self, other: SequenceIndex) -> bool {
        self.next() == other
    }
}

/// A pair of values for the two pedal channels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pair {
    pub a: u16,
    pub b: u16,
}

impl Pair {
    pub const ZERO: Pair = Pair { a: 0, b: 0 };

    pub const fn new(a: u16, b: u16) -> Self {
        Self { a, b }
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.a == 0 && self.b == 0
    }

    /// Both halves in one word, `a` in the low half
    #[inline]
    pub const fn pack(self) -> u32 {
        (self.a as u32) | ((self.b as u32) << 16)
    }

    #[inline]
    pub const fn unpack(word: u32) -> Self {
        Self {
            a: word as u16,
            b: (word >> 16) as u16,
        }
    }

    fn read(buf: &[u8]) -> Self {
        Self {
            a: LittleEndian::read_u16(&buf[0..2]),
            b: LittleEndian::read_u16(&buf[2..4]),
        }
    }

    fn write(&self, buf: &mut [u8]) {
        LittleEndian::write_u16(&mut buf[0..2], self.a);
        LittleEndian::write_u16(&mut buf[2..4], self.b);
    }
}

/// Externally commanded target values for the two outputs
pub type Setpoints = Pair;

/// Latest values read from the two pedal position sensors
pub type SensorReadings = Pair;

/// Override command, received from the controlling node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandFrame {
    pub setpoints: Setpoints,
    pub enable: bool,
    pub index: SequenceIndex,
}

impl CommandFrame {
    /// Check the checksum of `data` and decode it. Bytes past FRAME_LEN are
    /// ignored.
    pub fn decode(data: &[u8], crc: &Crc8) -> Result<Self, FrameError> {
        if data.len() < FRAME_LEN {
            return Err(FrameError::Length(data.len()));
        }
        let data = &data[..FRAME_LEN];

        let expected = crc.checksum(data);
        if data[0] != expected {
            return Err(FrameError::Checksum {
                expected,
                received: data[0],
            });
        }

        Ok(Self {
            setpoints: Pair::read(&data[1..5]),
            enable: data[5] & ENABLE_BIT != 0,
            index: SequenceIndex::new(data[5]),
        })
    }

    pub fn encode(&self, crc: &Crc8) -> [u8; FRAME_LEN] {
        let mut data = [0u8; FRAME_LEN];
        self.setpoints.write(&mut data[1..5]);
        data[5] = self.index.raw() | if self.enable { ENABLE_BIT } else { 0 };
        data[0] = crc.checksum(&data);
        data
    }
}

/// Status report, sent every control tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryFrame {
    pub sensors: SensorReadings,
    pub state: SafetyState,
    pub index: SequenceIndex,
}

impl TelemetryFrame {
    pub fn encode(&self, crc: &Crc8) -> [u8; FRAME_LEN] {
        let mut data = [0u8; FRAME_LEN];
        self.sensors.write(&mut data[1..5]);
        data[5] = ((self.state.code() & NIBBLE) << 4) | self.index.raw();
        data[0] = crc.checksum(&data);
        data
    }

    /// Inverse of `encode`, for whoever is listening to telemetry. Returns
    /// None for a state code outside the known set.
    pub fn decode(data: &[u8], crc: &Crc8) -> Result<Option<Self>, FrameError> {
        if data.len() < FRAME_LEN {
            return Err(FrameError::Length(data.len()));
        }
        let data = &data[..FRAME_LEN];
        let expected = crc.checksum(data);
        if data[0] != expected {
            return Err(FrameError::Checksum {
                expected,
                received: data[0],
            });
        }
        Ok(SafetyState::from_code(data[5] >> 4).map(|state| Self {
            sensors: Pair::read(&data[1..5]),
            state,
            index: SequenceIndex::new(data[5]),
        }))
    }
}
