//! 4x FIR decimator for engines that render oversampled.
//!
//! The FM engine computes four samples per output sample. Each oversampled
//! sample is split between two 4-tap halves of a symmetric 8-tap low-pass:
//! the "head" accumulates the output being built, the "tail" starts on the
//! next one. The tail survives across blocks through the borrowed state.

pub const OVERSAMPLING: usize = 4;

const FIR_COEFFICIENTS: [f32; OVERSAMPLING] = [0.024_424_15, 0.092_973_15, 0.167_129_38, 0.215_473_32];

pub struct Downsampler<'a> {
    head: f32,
    tail: f32,
    state: &'a mut f32,
}

impl<'a> Downsampler<'a> {
    pub fn new(state: &'a mut f32) -> Self {
        Self {
            head: *state,
            tail: 0.0,
            state,
        }
    }

    /// Adds oversampled sample `i` (0..4) of the current output sample.
    #[inline]
    pub fn accumulate(&mut self, i: usize, sample: f32) {
        let i = i & (OVERSAMPLING - 1);
        self.head += sample * FIR_COEFFICIENTS[OVERSAMPLING - 1 - i];
        self.tail += sample * FIR_COEFFICIENTS[i];
    }

    /// Returns the finished output sample and starts the next one.
    #[inline]
    pub fn read(&mut self) -> f32 {
        let value = self.head;
        self.head = self.tail;
        self.tail = 0.0;
        value
    }
}

impl Drop for Downsampler<'_> {
    fn drop(&mut self) {
        *self.state = self.head;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dc_passes_with_unity_gain() {
        let mut state = 0.0;
        let mut downsampler = Downsampler::new(&mut state);
        let mut last = 0.0;
        for _ in 0..8 {
            for i in 0..OVERSAMPLING {
                downsampler.accumulate(i, 1.0);
            }
            last = downsampler.read();
        }
        assert!((last - 1.0).abs() < 1e-4, "dc gain {}", last);
    }

    #[test]
    fn tail_carries_across_blocks() {
        let mut state = 0.0;
        {
            let mut downsampler = Downsampler::new(&mut state);
            for i in 0..OVERSAMPLING {
                downsampler.accumulate(i, 1.0);
            }
            downsampler.read();
        }
        assert!((state - 0.5).abs() < 1e-4, "carried tail {}", state);
    }
}
