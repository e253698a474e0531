//! CRC-8 used by UAVTalk
//!
//! Polynomial 0x07, initial value 0x00, no reflection, no final XOR. The
//! checksum covers every frame byte from SYNC through the last DATA byte.

/// Generator polynomial (x^8 + x^2 + x + 1)
pub const CRC8_POLY: u8 = 0x07;

/// Lookup table, built at compile time
static CRC8_TABLE: [u8; 256] = build_table(CRC8_POLY);

const fn build_table(poly: u8) -> [u8; 256] {
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

/// Running CRC-8 state
///
/// A plain value: `update` consumes the state and returns the next one, so
/// the parser can keep it across calls without any hidden mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Crc8(u8);

impl Crc8 {
    /// Fresh checksum state
    pub const fn new() -> Self {
        Self(0)
    }

    /// Fold one byte into the checksum
    #[must_use]
    pub fn update(self, byte: u8) -> Self {
        Self(CRC8_TABLE[(self.0 ^ byte) as usize])
    }

    /// Fold a slice into the checksum
    #[must_use]
    pub fn update_slice(self, bytes: &[u8]) -> Self {
        bytes.iter().fold(self, |crc, &b| crc.update(b))
    }

    /// Value to compare against the wire CRC byte
    pub const fn finalize(self) -> u8 {
        self.0
    }
}

/// Checksum of a complete byte sequence
pub fn checksum(bytes: &[u8]) -> u8 {
    Crc8::new().update_slice(bytes).finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_value() {
        // Standard CRC-8 (SMBus/ATM) check value
        assert_eq!(checksum(b"123456789"), 0xF4);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(Crc8::new().finalize(), 0);
    }

    #[test]
    fn test_incremental_matches_slice() {
        let data = [0x3C, 0x20, 0x0A, 0x00, 0x84, 0x80, 0x47, 0xD4, 0x00, 0x00];
        let mut crc = Crc8::new();
        for &b in &data {
            crc = crc.update(b);
        }
        assert_eq!(crc.finalize(), checksum(&data));
    }

    #[test]
    fn test_table_matches_bitwise() {
        for i in 0..=255u8 {
            let mut crc = i;
            for _ in 0..8 {
                crc = if crc & 0x80 != 0 { (crc << 1) ^ CRC8_POLY } else { crc << 1 };
            }
            assert_eq!(Crc8::new().update(i).finalize(), crc);
        }
    }
}
