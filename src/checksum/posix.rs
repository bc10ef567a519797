//! POSIX `cksum` CRC primitive
//!
//! Polynomial 0x04C11DB7, MSB-first, register starts at zero. At finalize the
//! total length is folded in least significant byte first (only the
//! significant bytes), then the register is inverted. Output matches GNU
//! `cksum`.

const POLYNOMIAL: u32 = 0x04C1_1DB7;

/// Starting accumulator for POSIX cksum.
pub const SEED: u32 = 0;

const TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0u32;
    while i < 256 {
        let mut crc = i << 24;
        let mut j = 0;
        while j < 8 {
            if crc & 0x8000_0000 != 0 {
                crc = (crc << 1) ^ POLYNOMIAL;
            } else {
                crc <<= 1;
            }
            j += 1;
        }
        table[i as usize] = crc;
        i += 1;
    }
    table
};

#[inline]
fn fold_byte(crc: u32, byte: u8) -> u32 {
    (crc << 8) ^ TABLE[((crc >> 24) ^ u32::from(byte)) as usize]
}

/// Returns the initial accumulator value.
pub fn seed() -> u32 {
    SEED
}

/// Folds `data` into `state`.
pub fn update(state: u32, data: &[u8]) -> u32 {
    data.iter().fold(state, |crc, &byte| fold_byte(crc, byte))
}

/// Folds the total length into `state` and inverts it.
pub fn finalize(total_length: u64, state: u32) -> u32 {
    let mut crc = state;
    let mut len = total_length;
    while len > 0 {
        crc = fold_byte(crc, (len & 0xFF) as u8);
        len >>= 8;
    }
    !crc
}
