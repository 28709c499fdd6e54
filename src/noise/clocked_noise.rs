//! Sample-and-hold noise with a band-limited clock.
//!
//! A new random value is latched every time the clock phase wraps. Each step
//! is a discontinuity, so it is smoothed with a BLEP exactly like a square
//! wave edge. Once the clock runs above a quarter of the sample rate the
//! latched steps are so short they are replaced by raw white noise.

use crate::dsp::parameter_interpolator::ParameterInterpolator;
use crate::dsp::polyblep::{next_blep_sample, this_blep_sample};
use crate::dsp::random::Random;

#[derive(Debug, Clone)]
pub struct ClockedNoise {
    phase: f32,
    sample: f32,
    next_sample: f32,
    frequency: f32,
    random: Random,
}

impl Default for ClockedNoise {
    fn default() -> Self {
        Self::new(0x5eed)
    }
}

impl ClockedNoise {
    pub fn new(seed: u64) -> Self {
        Self {
            phase: 0.0,
            sample: 0.0,
            next_sample: 0.0,
            frequency: 0.001,
            random: Random::new_with_seed(seed),
        }
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.sample = 0.0;
        self.next_sample = 0.0;
        self.frequency = 0.001;
    }

    /// Renders one block of noise clocked at `frequency`. `sync` restarts the
    /// clock so that a new value is latched on the first sample.
    pub fn render(&mut self, sync: bool, frequency: f32, out: &mut [f32]) {
        let size = out.len();
        let frequency = frequency.clamp(0.0, 1.0);
        let mut fm = ParameterInterpolator::new(&mut self.frequency, frequency, size);

        let mut next_sample = self.next_sample;
        let mut sample = self.sample;

        if sync {
            self.phase = 1.0;
        }

        for out_sample in out.iter_mut() {
            let mut this_sample = next_sample;
            next_sample = 0.0;

            let frequency = fm.next();
            let raw_sample = self.random.get_bipolar();
            let raw_amount = (4.0 * (frequency - 0.25)).clamp(0.0, 1.0);

            self.phase += frequency;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
                let t = if frequency > 0.0 {
                    (self.phase / frequency).min(1.0)
                } else {
                    0.0
                };
                let discontinuity = raw_sample - sample;
                this_sample += discontinuity * this_blep_sample(t);
                next_sample += discontinuity * next_blep_sample(t);
                sample = raw_sample;
            }
            next_sample += sample;
            *out_sample = this_sample + raw_amount * (raw_sample - this_sample);
        }

        self.next_sample = next_sample;
        self.sample = sample;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slow_clock_holds_values() {
        let mut noise = ClockedNoise::new(1);
        let mut out = [0.0; 24];
        for _ in 0..10 {
            noise.render(false, 0.001, &mut out);
        }
        // Between clock ticks the output is flat.
        let flat = out.windows(2).filter(|w| w[0] == w[1]).count();
        assert!(flat >= 20, "only {} flat steps", flat);
    }

    #[test]
    fn output_is_bounded() {
        let mut noise = ClockedNoise::new(2);
        let mut out = [0.0; 24];
        for i in 0..200 {
            noise.render(i % 17 == 0, 0.1 + (i as f32) * 0.004, &mut out);
            assert!(out.iter().all(|x| x.is_finite() && x.abs() <= 1.5));
        }
    }

    #[test]
    fn sync_latches_immediately() {
        let mut noise = ClockedNoise::new(4);
        let mut out = [0.0; 8];
        noise.render(false, 0.0, &mut out);
        assert!(out.iter().all(|&x| x == 0.0));
        noise.render(true, 0.0, &mut out);
        assert!(out[1..].iter().any(|&x| x != 0.0));
    }
}
