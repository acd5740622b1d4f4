//! Object table CRC
//!
//! The information block and object table are protected by a 24-bit CRC
//! stored in the three bytes that follow the last object entry.
//!
//! The algorithm consumes the data as little-endian 16-bit words:
//! - shift the running CRC left by one and XOR in the word
//! - if bit 24 became set, XOR with polynomial 0x80001B
//! - an odd trailing byte is processed with a zero high byte
//! - the result is truncated to 24 bits

/// CRC-24 polynomial used by the object protocol
pub const CRC24_POLY: u32 = 0x0080_001B;

/// Size of the stored CRC in bytes
pub const CRC_SIZE: usize = 3;

const CRC24_MASK: u32 = 0x00FF_FFFF;

fn crc24_step(crc: u32, lo: u8, hi: u8) -> u32 {
    let word = u32::from(lo) | (u32::from(hi) << 8);
    let mut result = (crc << 1) ^ word;

    if result & 0x0100_0000 != 0 {
        result ^= CRC24_POLY;
    }

    result & CRC24_MASK
}

/// Calculate the CRC over `data`
pub fn crc24(data: &[u8]) -> u32 {
    let mut crc = 0u32;

    let mut words = data.chunks_exact(2);
    for pair in &mut words {
        crc = crc24_step(crc, pair[0], pair[1]);
    }
    if let [last] = words.remainder() {
        crc = crc24_step(crc, *last, 0);
    }

    crc
}

/// Reassemble the stored CRC from its three wire bytes (low byte first)
pub fn stored_crc(raw: [u8; CRC_SIZE]) -> u32 {
    u32::from(raw[0]) | (u32::from(raw[1]) << 8) | (u32::from(raw[2]) << 16)
}

/// Split a CRC into its three wire bytes
pub fn crc_bytes(crc: u32) -> [u8; CRC_SIZE] {
    [crc as u8, (crc >> 8) as u8, (crc >> 16) as u8]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(crc24(&[]), 0);
    }

    #[test]
    fn test_single_word() {
        // 0 << 1 ^ 0x0201 = 0x0201, no overflow
        assert_eq!(crc24(&[0x01, 0x02]), 0x0201);
    }

    #[test]
    fn test_odd_length_pads_high_byte() {
        assert_eq!(crc24(&[0x01, 0x02, 0x03]), crc24(&[0x01, 0x02, 0x03, 0x00]));
    }

    #[test]
    fn test_polynomial_applied_on_overflow() {
        // Drive the register to 0x800000 and shift once more.
        // 0x800000 << 1 = 0x1000000 -> ^ poly -> 0x180001B -> masked 0x80001B
        assert_eq!(crc24_step(0x0080_0000, 0, 0), 0x0080_001B);
    }

    #[test]
    fn test_stored_crc_is_little_endian() {
        assert_eq!(stored_crc([0x56, 0x34, 0x12]), 0x12_3456);
        assert_eq!(crc_bytes(0x12_3456), [0x56, 0x34, 0x12]);
    }

    proptest! {
        #[test]
        fn prop_crc_fits_24_bits(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            prop_assert!(crc24(&data) <= CRC24_MASK);
        }

        #[test]
        fn prop_embedded_crc_verifies(data in proptest::collection::vec(any::<u8>(), 7..256)) {
            let crc = crc24(&data);
            let mut table = data.clone();
            table.extend_from_slice(&crc_bytes(crc));

            let body = &table[..data.len()];
            let tail = [table[data.len()], table[data.len() + 1], table[data.len() + 2]];
            prop_assert_eq!(crc24(body), stored_crc(tail));
        }

        #[test]
        fn prop_single_bit_flip_detected(
            data in proptest::collection::vec(any::<u8>(), 1..128),
            idx in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let i = idx.index(data.len());
            let mut flipped = data.clone();
            flipped[i] ^= 1 << bit;
            prop_assert_ne!(crc24(&data), crc24(&flipped));
        }
    }
}
