//! CRC-32 (IEEE 802.3) primitive
//!
//! Exposes the incremental contract:
//! - `seed()` starts an accumulation at `SEED`
//! - `update()` folds a chunk, any chunking gives the same result
//! - `finalize()` turns the accumulator into the published CRC
//!
//! The accumulator is the raw (non-inverted) register. Folding is delegated to
//! `crc32fast`, which picks a hardware path where the CPU has one.

use crc32fast::Hasher;

/// Starting accumulator for a series of partial CRC accumulations.
pub const SEED: u32 = 0xFFFF_FFFF;

/// Returns the initial accumulator value.
pub fn seed() -> u32 {
    SEED
}

/// Folds `data` into `state`.
pub fn update(state: u32, data: &[u8]) -> u32 {
    // crc32fast carries the inverted register between calls
    let mut hasher = Hasher::new_with_initial(!state);
    hasher.update(data);
    !hasher.finalize()
}

/// Derives the final CRC. The length does not take part in IEEE CRC-32.
pub fn finalize(_total_length: u64, state: u32) -> u32 {
    !state
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_shot(data: &[u8]) -> u32 {
        finalize(data.len() as u64, update(seed(), data))
    }

    #[test]
    fn test_known_vector() {
        assert_eq!(one_shot(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(one_shot(b""), 0);
    }

    #[test]
    fn test_matches_crc32fast_one_shot() {
        let data = b"the quick brown fox jumps over the lazy dog";
        assert_eq!(one_shot(data), crc32fast::hash(data));
    }

    #[test]
    fn test_chunking_invariance() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i * 31 % 251) as u8).collect();
        let expected = one_shot(&data);

        for chunk_size in [1, 3, 7, 16, 64, 4095, 9999] {
            let mut state = seed();
            for chunk in data.chunks(chunk_size) {
                state = update(state, chunk);
            }
            assert_eq!(
                finalize(data.len() as u64, state),
                expected,
                "chunk size {} changed the checksum",
                chunk_size
            );
        }
    }

    #[test]
    fn test_empty_chunks_are_neutral() {
        let mut state = update(seed(), b"1234");
        state = update(state, b"");
        state = update(state, b"56789");
        assert_eq!(finalize(9, state), 0xCBF4_3926);
    }
}
