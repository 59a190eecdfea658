//! Reset-into-bootloader requests.
//!
//! These arrive on the command ID as 8 byte frames, which can never be
//! mistaken for a 6 byte command. Detection here only says which mode was
//! asked for; storing the magic and resetting is the firmware's job.
use byteorder::{ByteOrder, LittleEndian};

const REQUEST_PREFIX: u32 = 0xdead_face;
const SOFTLOADER_SUFFIX: u32 = 0x0ab0_0b1e;
const BOOTLOADER_SUFFIX: u32 = 0x02b0_0b1e;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootMode {
    Softloader,
    Bootloader,
}

impl BootMode {
    /// Value left in RAM across the reset for the bootloader to find
    pub const fn magic(self) -> u32 {
        match self {
            BootMode::Softloader => 0xdead_c0de,
            BootMode::Bootloader => 0xdead_beef,
        }
    }
}

pub fn detect(data: &[u8]) -> Option<BootMode> {
    if data.len() < 8 || LittleEndian::read_u32(&data[0..4]) != REQUEST_PREFIX {
        return None;
    }
    match LittleEndian::read_u32(&data[4..8]) {
        SOFTLOADER_SUFFIX => Some(BootMode::Softloader),
        BOOTLOADER_SUFFIX => Some(BootMode::Bootloader),
        suffix => {
            warn!("Failed entering softloader or bootloader ({=u32:#x})", suffix);
            None
        }
    }
}
