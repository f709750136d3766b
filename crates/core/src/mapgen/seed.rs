//! Deterministic seed mixing and pseudo-random stream helpers for map generation.

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::{Rng, SeedableRng};

const QUERY_STREAM: u64 = 0x5175_6572_7953_6565;

/// Stream consumed by placement and routing, in that order.
pub(super) fn layout_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Independent stream for random-position queries so they never shift the layout.
pub(super) fn query_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(mix_seed_stream(seed, QUERY_STREAM))
}

pub(super) fn random_index(rng: &mut ChaCha8Rng, len: usize) -> usize {
    debug_assert!(len > 0);
    (rng.next_u64() % len as u64) as usize
}

pub(super) fn random_i32(rng: &mut ChaCha8Rng, min_value: i32, max_value: i32) -> i32 {
    debug_assert!(min_value <= max_value);
    let range_size = (i64::from(max_value) - i64::from(min_value) + 1) as u64;
    min_value + (rng.next_u64() % range_size) as i32
}

/// Uniform sample in `[0, 1)` built from the top 53 bits.
pub(super) fn random_unit(rng: &mut ChaCha8Rng) -> f64 {
    (rng.next_u64() >> 11) as f64 * (1.0 / (1_u64 << 53) as f64)
}

pub(super) fn roll(rng: &mut ChaCha8Rng, chance: f64) -> bool {
    random_unit(rng) < chance
}

pub(super) fn mix_seed_stream(seed: u64, stream: u64) -> u64 {
    let mut mixed = seed ^ stream.wrapping_mul(0xD6E8_FD9A_5B89_7A4D);
    mixed ^= mixed >> 33;
    mixed = mixed.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    mixed ^= mixed >> 33;
    mixed = mixed.wrapping_mul(0xC4CE_B9FE_1A85_EC53);
    mixed ^ (mixed >> 33)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_i32_stays_inside_requested_bounds() {
        let mut rng = layout_rng(12_345);
        for _ in 0..200 {
            let value = random_i32(&mut rng, -3, 4);
            assert!((-3..=4).contains(&value));
        }
    }

    #[test]
    fn random_unit_is_half_open() {
        let mut rng = layout_rng(7);
        for _ in 0..1_000 {
            let value = random_unit(&mut rng);
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn roll_respects_certain_and_impossible_chances() {
        let mut rng = layout_rng(99);
        for _ in 0..100 {
            assert!(!roll(&mut rng, 0.0));
            assert!(roll(&mut rng, 1.0));
        }
    }

    #[test]
    fn query_stream_differs_from_layout_stream() {
        let mut layout = layout_rng(42);
        let mut query = query_rng(42);
        assert_ne!(layout.next_u64(), query.next_u64());
        assert_eq!(query_rng(42).next_u64(), query_rng(42).next_u64());
    }
}
