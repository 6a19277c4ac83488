//! Fast PRNG for battle simulation. Uses SplitMix64 for throughput and good statistical quality.
//! Deterministic: same seed produces the same sequence. Not cryptographically secure.
//!
//! Every worker thread and every board owns its own `Rng`, so random draws never
//! contend on a shared generator.

const SPLITMIX64_GOLDEN: u64 = 0x9e3779b97f4a7c15;
const SPLITMIX64_M1: u64 = 0xbf58476d1ce4e5b9;
const SPLITMIX64_M2: u64 = 0x94d049bb133111eb;

#[derive(Debug, Clone, Copy)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed from OS entropy. Used when the caller supplies no explicit seed.
    pub fn from_entropy() -> Self {
        let mut buf = [0_u8; 8];
        // Zero seed on entropy failure is still a valid generator.
        let _ = getrandom::getrandom(&mut buf);
        Self::new(u64::from_le_bytes(buf))
    }

    /// Derive an independent stream for worker/board `index`. Streams from the
    /// same base seed and distinct indices do not overlap in practice.
    pub fn split(base_seed: u64, index: u64) -> Self {
        let mut rng = Self::new(base_seed ^ index.wrapping_mul(SPLITMIX64_GOLDEN));
        // Burn one output so adjacent indices decorrelate immediately.
        let _ = rng.next_u64();
        rng
    }

    /// Returns the next 64-bit value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(SPLITMIX64_GOLDEN);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(SPLITMIX64_M1);
        z = (z ^ (z >> 27)).wrapping_mul(SPLITMIX64_M2);
        z ^ (z >> 31)
    }

    /// Uniform draw in `[0, bound)`. `bound` must be non-zero.
    #[inline]
    pub fn next_below(&mut self, bound: usize) -> usize {
        debug_assert!(bound > 0);
        // Widening multiply avoids the modulo bias of `next_u64() % bound`.
        (((self.next_u64() as u128) * (bound as u128)) >> 64) as usize
    }

    /// Bernoulli draw with probability `1/denominator`.
    #[inline]
    pub fn one_in(&mut self, denominator: usize) -> bool {
        self.next_below(denominator) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splitmix64_deterministic() {
        let mut a = Rng::new(7);
        let mut b = Rng::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn splitmix64_different_seeds_differ() {
        let mut a = Rng::new(1);
        let mut b = Rng::new(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn split_streams_differ_per_index() {
        let mut a = Rng::split(42, 0);
        let mut b = Rng::split(42, 1);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn next_below_stays_in_bounds() {
        let mut rng = Rng::new(99);
        for bound in [1, 2, 3, 10, 1000] {
            for _ in 0..200 {
                assert!(rng.next_below(bound) < bound);
            }
        }
    }

    #[test]
    fn one_in_one_is_always_true() {
        let mut rng = Rng::new(5);
        for _ in 0..50 {
            assert!(rng.one_in(1));
        }
    }
}
