//! Saturation and limiting
//!
//! Two stages that keep engine output in range without audible pumping.
//!
//! # Soft saturation
//!
//! Everything here bottoms out in the rational tanh approximation from
//! [`crate::dsp::units::soft_limit`]:
//!
//!   f(x) = x (27 + x^2) / (27 + 9 x^2)
//!
//! It is transparent for small signals, bends gently near +/-1 and is
//! clipped flat beyond +/-3.
//!
//! # Limiter
//!
//! A peak follower with a fast attack and a very slow release. While the
//! tracked peak stays under 1.0 the signal passes untouched (apart from the
//! 0.8 headroom trim); above it the gain is `1 / peak`.
//!
//! ```text
//!   |s| ──→ [slope follower] ──→ peak ──→ gain = min(1, 1/peak)
//!    s ──────────────────────────────→ (×) ──→ ×0.8 ──→ soft_limit ──→ out
//! ```
//!
//! Engines with wildly varying output levels (swarm, noise, particles, speech)
//! get a negative gain in the voice's engine table, which routes them through
//! the limiter with `-gain` as pre-gain.
//!
//! # Overdrive
//!
//! Drive in [0, 1]. Pre-gain grows roughly with drive^5 near the top of the
//! range; post-gain compensates so the perceived level stays put.

use crate::dsp::parameter_interpolator::ParameterInterpolator;
use crate::dsp::units::{slope, soft_clip, soft_limit};

#[derive(Debug, Clone, Copy)]
pub struct Limiter {
    peak: f32,
}

impl Default for Limiter {
    fn default() -> Self {
        Self::new()
    }
}

impl Limiter {
    pub fn new() -> Self {
        Self { peak: 0.5 }
    }

    pub fn reset(&mut self) {
        self.peak = 0.5;
    }

    /// Limits `in_out` in place after applying `pre_gain`.
    pub fn process(&mut self, pre_gain: f32, in_out: &mut [f32]) {
        for sample in in_out.iter_mut() {
            let s = *sample * pre_gain;
            slope(&mut self.peak, s.abs(), 0.05, 0.00002);
            let gain = if self.peak <= 1.0 { 1.0 } else { 1.0 / self.peak };
            *sample = soft_limit(s * gain * 0.8);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Overdrive {
    pre_gain: f32,
    post_gain: f32,
}

impl Overdrive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.pre_gain = 0.0;
        self.post_gain = 0.0;
    }

    /// Saturates `in_out` in place.
    pub fn process(&mut self, drive: f32, in_out: &mut [f32]) {
        let drive = drive.clamp(0.0, 1.0);
        let drive_2 = drive * drive;
        let pre_gain_a = drive * 0.5;
        let pre_gain_b = drive_2 * drive_2 * drive * 24.0;
        let pre_gain = pre_gain_a + (pre_gain_b - pre_gain_a) * drive_2;
        let drive_squished = drive * (2.0 - drive);
        let post_gain = 1.0 / soft_clip(0.33 + drive_squished * (pre_gain - 0.33));

        let size = in_out.len();
        let mut pre_gain_modulation = ParameterInterpolator::new(&mut self.pre_gain, pre_gain, size);
        let mut post_gain_modulation =
            ParameterInterpolator::new(&mut self.post_gain, post_gain, size);

        for sample in in_out.iter_mut() {
            let pre = pre_gain_modulation.next() * *sample;
            *sample = soft_clip(pre) * post_gain_modulation.next();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_passes_quiet_signals() {
        let mut limiter = Limiter::new();
        let mut buffer = vec![0.1; 64];
        limiter.process(1.0, &mut buffer);
        // 0.1 * 0.8 through soft_limit is ~0.08.
        assert!((buffer[63] - 0.08).abs() < 0.001, "got {}", buffer[63]);
    }

    #[test]
    fn limiter_tames_hot_signals() {
        let mut limiter = Limiter::new();
        let mut buffer: Vec<f32> = (0..4_096).map(|i| 8.0 * (i as f32 * 0.05).sin()).collect();
        limiter.process(2.0, &mut buffer);
        let tail_peak = buffer[2_048..].iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        assert!(tail_peak <= 1.0, "limited output peaked at {}", tail_peak);
    }

    #[test]
    fn overdrive_keeps_level_reasonable() {
        let mut overdrive = Overdrive::new();
        for drive in [0.0, 0.3, 0.7, 1.0] {
            let mut buffer: Vec<f32> = (0..256).map(|i| 0.5 * (i as f32 * 0.1).sin()).collect();
            overdrive.process(drive, &mut buffer);
            overdrive.process(drive, &mut buffer);
            assert!(
                buffer.iter().all(|x| x.is_finite() && x.abs() < 4.0),
                "overdrive at drive {} blew up",
                drive
            );
        }
    }
}
