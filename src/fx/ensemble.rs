//! String-machine ensemble: three modulated taps across a stereo pair.
//!
//! Each channel reads its own line twice and the opposite line once, at
//! three LFO phases 120 degrees apart. A slow sine gives the broad chorus
//! motion and a faster one the shimmer on top.

use crate::config::SampleRate;
use crate::dsp::delay::DelayLine;
use crate::dsp::tables::sine;

use super::scaled_delay;

const LINE_SIZE: usize = 2048;
const SLOW_RATE: f32 = 1.57e-5;
const FAST_RATE: f32 = 1.37e-4;
const BASE_DELAY: f32 = 192.0;

pub struct Ensemble {
    line_l: DelayLine<LINE_SIZE>,
    line_r: DelayLine<LINE_SIZE>,
    phase_1: f32,
    phase_2: f32,
    slow_rate: f32,
    fast_rate: f32,
    /// Samples per 48 kHz sample.
    delay_scale: f32,
    base_delay: f32,

    amount: f32,
    depth: f32,
}

impl Ensemble {
    pub fn new(sample_rate: &SampleRate) -> Self {
        let mut ensemble = Self {
            line_l: DelayLine::new(),
            line_r: DelayLine::new(),
            phase_1: 0.0,
            phase_2: 0.0,
            slow_rate: SLOW_RATE,
            fast_rate: FAST_RATE,
            delay_scale: 1.0,
            base_delay: BASE_DELAY,
            amount: 0.0,
            depth: 0.0,
        };
        ensemble.init(sample_rate);
        ensemble
    }

    pub fn init(&mut self, sample_rate: &SampleRate) {
        let ratio = sample_rate.rate_ratio();
        self.slow_rate = SLOW_RATE * ratio;
        self.fast_rate = FAST_RATE * ratio;
        self.delay_scale = 1.0 / ratio;
        self.base_delay = scaled_delay(BASE_DELAY, sample_rate, LINE_SIZE) as f32;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.line_l.reset();
        self.line_r.reset();
        self.phase_1 = 0.0;
        self.phase_2 = 0.0;
    }

    /// Dry/wet balance, 0..1.
    pub fn set_amount(&mut self, amount: f32) {
        self.amount = amount.clamp(0.0, 1.0);
    }

    /// Modulation depth, 0..1.
    pub fn set_depth(&mut self, depth: f32) {
        self.depth = depth.clamp(0.0, 1.0);
    }

    /// Processes the stereo pair in place.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let slow_depth = self.depth * 160.0 * self.delay_scale;
        let fast_depth = self.depth * 16.0 * self.delay_scale;
        let base = self.base_delay;
        let amount = self.amount;

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            self.phase_1 += self.slow_rate;
            if self.phase_1 >= 1.0 {
                self.phase_1 -= 1.0;
            }
            self.phase_2 += self.fast_rate;
            if self.phase_2 >= 1.0 {
                self.phase_2 -= 1.0;
            }

            let tap = |offset: f32| {
                base + sine(self.phase_1 + offset) * slow_depth + sine(self.phase_2 + offset) * fast_depth
            };
            let mod_1 = tap(0.0);
            let mod_2 = tap(1.0 / 3.0);
            let mod_3 = tap(2.0 / 3.0);

            self.line_l.write(*l);
            self.line_r.write(*r);

            let wet_l = 0.33
                * (self.line_l.read_linear(mod_1) + self.line_l.read_linear(mod_2) + self.line_r.read_linear(mod_3));
            let wet_r = 0.33
                * (self.line_r.read_linear(mod_1) + self.line_r.read_linear(mod_2) + self.line_l.read_linear(mod_3));
            *l = wet_l * amount + *l * (1.0 - amount);
            *r = wet_r * amount + *r * (1.0 - amount);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_setting_passes_the_input() {
        let mut ensemble = Ensemble::new(&SampleRate::default());
        ensemble.set_amount(0.0);
        ensemble.set_depth(1.0);
        let input: Vec<f32> = (0..480).map(|i| (i as f32 * 0.05).sin()).collect();
        let mut left = input.clone();
        let mut right = input.clone();
        ensemble.process(&mut left, &mut right);
        assert_eq!(left, input);
        assert_eq!(right, input);
    }

    #[test]
    fn wet_signal_arrives_after_the_base_delay() {
        let mut ensemble = Ensemble::new(&SampleRate::default());
        ensemble.set_amount(1.0);
        ensemble.set_depth(0.0);
        let mut left = vec![0.0; 400];
        let mut right = vec![0.0; 400];
        left[0] = 1.0;
        ensemble.process(&mut left, &mut right);
        assert!(left[..150].iter().all(|&x| x == 0.0));
        let echo: f32 = left[150..250].iter().map(|x| x.abs()).sum();
        assert!((echo - 0.66).abs() < 0.05, "echo {}", echo);
        let cross: f32 = right.iter().map(|x| x.abs()).sum();
        assert!((cross - 0.33).abs() < 0.05, "cross {}", cross);
    }
}
