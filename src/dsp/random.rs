//! Per-component pseudorandom source.
//!
//! Every stochastic component owns one of these instead of sharing a global
//! generator, so two voices never contend and a seeded voice renders the same
//! noise every time.

/// A pseudorandom number generator for audio-rate noise and jitter.
#[derive(Debug, Clone)]
pub struct Random(oorandom::Rand32);

impl Default for Random {
    fn default() -> Self {
        Self::new_with_seed(0x2137_a3f1)
    }
}

impl Random {
    /// Pass the same number to get the same stream back again.
    pub fn new_with_seed(seed: u64) -> Self {
        Self(oorandom::Rand32::new(seed))
    }

    #[inline]
    pub fn get_word(&mut self) -> u32 {
        self.0.rand_u32()
    }

    /// Uniform in [0, 1).
    #[inline]
    pub fn get_float(&mut self) -> f32 {
        self.0.rand_float()
    }

    /// Uniform in [-1, 1).
    #[inline]
    pub fn get_bipolar(&mut self) -> f32 {
        self.get_float() * 2.0 - 1.0
    }
}
