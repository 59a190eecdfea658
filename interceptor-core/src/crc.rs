//! Table driven CRC-8 used by both directions of the interceptor protocol.
//!
//! MSB-first, seed 0, no final XOR. The first byte of every frame is the
//! checksum field itself, so it is skipped when checksumming a frame.

/// Polynomial used on the wire (x^8 + x^4 + x^3 + x^2 + 1)
pub const POLY_1D: u8 = 0x1D;

/// Build the 256 entry lookup table for `poly`.
pub const fn build_table(poly: u8) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ poly
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

#[derive(Clone)]
pub struct Crc8 {
    table: [u8; 256],
}

impl Crc8 {
    pub const fn new(poly: u8) -> Self {
        Self {
            table: build_table(poly),
        }
    }

    /// CRC of every byte in `data`
    pub fn compute(&self, data: &[u8]) -> u8 {
        data.iter().fold(0, |crc, b| self.table[(crc ^ b) as usize])
    }

    /// Checksum of a frame, covering everything after byte 0
    pub fn checksum(&self, frame: &[u8]) -> u8 {
        match frame.split_first() {
            Some((_, payload)) => self.compute(payload),
            None => 0,
        }
    }

    /// True if byte 0 of `frame` matches the checksum of the rest
    pub fn verify(&self, frame: &[u8]) -> bool {
        frame.first() == Some(&self.checksum(frame))
    }
}

/// The protocol's CRC, computed at compile time
pub static CRC8_1D: Crc8 = Crc8::new(POLY_1D);
