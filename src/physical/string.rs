//! Karplus-Strong string with dispersion and a curved-bridge nonlinearity.
//!
//! The loop is a delay line, a low-pass damping filter and a DC blocker.
//! Two optional colourings act on the loop delay:
//!
//! - dispersion (positive `non_linearity`): part of the delay is moved into
//!   an all-pass, which delays upper partials less than lower ones, the way
//!   a stiff piano string does. Near the top of the range a little
//!   filtered noise jitters the delay too.
//! - curved bridge (negative `non_linearity`): the delay shortens while the
//!   string is far from rest, like a string slapping against a sitar
//!   bridge.
//!
//! Notes lower than the delay line can hold are rendered at a reduced
//! internal rate and interpolated back up.

use crate::config::SampleRate;
use crate::dsp::delay::DelayLine;
use crate::dsp::filter::{DcBlocker, FilterMode, FrequencyApproximation, Svf};
use crate::dsp::random::Random;
use crate::dsp::tables::{SVF_SHIFT, SVF_SHIFT_SIZE};
use crate::dsp::units::{crossfade, interpolate, one_pole, semitones_to_ratio};
use crate::dsp::ParameterInterpolator;

pub const STRING_DELAY_SIZE: usize = 1024;
const STRETCH_DELAY_SIZE: usize = STRING_DELAY_SIZE / 4;

pub struct WaveguideString {
    string: DelayLine<STRING_DELAY_SIZE>,
    stretch: DelayLine<STRETCH_DELAY_SIZE>,
    iir_damping_filter: Svf,
    dc_blocker: DcBlocker,

    delay: f32,
    dispersion_noise: f32,
    curved_bridge: f32,

    src_phase: f32,
    out_sample: [f32; 2],

    inv_sample_rate: f32,
    random: Random,
}

impl WaveguideString {
    pub fn new(sample_rate: &SampleRate) -> Self {
        Self {
            string: DelayLine::new(),
            stretch: DelayLine::new(),
            iir_damping_filter: Svf::new(),
            dc_blocker: DcBlocker::new(20.0 * sample_rate.inv_sample_rate),
            delay: 100.0,
            dispersion_noise: 0.0,
            curved_bridge: 0.0,
            src_phase: 0.0,
            out_sample: [0.0; 2],
            inv_sample_rate: sample_rate.inv_sample_rate,
            random: Random::default(),
        }
    }

    pub fn init(&mut self, sample_rate: &SampleRate) {
        self.inv_sample_rate = sample_rate.inv_sample_rate;
        self.dc_blocker = DcBlocker::new(20.0 * sample_rate.inv_sample_rate);
        self.reset();
    }

    pub fn reset(&mut self) {
        self.string.reset();
        self.stretch.reset();
        self.iir_damping_filter.reset();
        self.dc_blocker.reset();
        self.dispersion_noise = 0.0;
        self.curved_bridge = 0.0;
        self.out_sample = [0.0; 2];
        self.src_phase = 0.0;
    }

    /// Excites the string with `input` and adds its output into `out`.
    ///
    /// `non_linearity` is in [-1, 1]: negative for the curved bridge,
    /// positive for dispersion.
    pub fn process(
        &mut self,
        f0: f32,
        non_linearity: f32,
        brightness: f32,
        damping: f32,
        input: &[f32],
        out: &mut [f32],
    ) {
        let non_linearity = non_linearity.clamp(-1.0, 1.0);
        if non_linearity <= 0.0 {
            self.process_internal::<false>(f0, -non_linearity, brightness, damping, input, out);
        } else {
            self.process_internal::<true>(f0, non_linearity, brightness, damping, input, out);
        }
    }

    fn process_internal<const DISPERSION: bool>(
        &mut self,
        f0: f32,
        non_linearity_amount: f32,
        brightness: f32,
        damping: f32,
        input: &[f32],
        out: &mut [f32],
    ) {
        let f0 = f0.max(1e-6);
        let mut brightness = brightness.clamp(0.0, 1.0);
        let damping = damping.clamp(0.0, 1.0);

        let delay = (1.0 / f0).clamp(4.0, (STRING_DELAY_SIZE - 4) as f32);

        // Too low for the delay line: run the loop slower.
        let mut src_ratio = delay * f0;
        if src_ratio >= 0.9999 {
            self.src_phase = 1.0;
            src_ratio = 1.0;
        }

        let mut damping_cutoff = (12.0 + damping * damping * 60.0 + brightness * 24.0).min(84.0);
        let mut damping_f = (f0 * semitones_to_ratio(damping_cutoff)).min(0.499);

        // Crossfade to infinite decay.
        if damping >= 0.95 {
            let to_infinite = 20.0 * (damping - 0.95);
            brightness += to_infinite * (1.0 - brightness);
            damping_f += to_infinite * (0.4999 - damping_f);
            damping_cutoff += to_infinite * (128.0 - damping_cutoff);
        }

        self.iir_damping_filter
            .set_f_q(damping_f, 0.5, FrequencyApproximation::Fast);

        let damping_compensation = interpolate(
            &SVF_SHIFT,
            damping_cutoff / SVF_SHIFT_SIZE as f32,
            SVF_SHIFT_SIZE as f32,
        );

        let size = out.len();
        let mut delay_modulation =
            ParameterInterpolator::new(&mut self.delay, delay * damping_compensation, size);

        let stretch_point = non_linearity_amount * (2.0 - non_linearity_amount) * 0.225;
        let stretch_correction = (160.0 * self.inv_sample_rate * delay).clamp(1.0, 2.1);

        let noise_amount_sqrt = if non_linearity_amount > 0.75 {
            4.0 * (non_linearity_amount - 0.75)
        } else {
            0.0
        };
        let noise_amount = noise_amount_sqrt * noise_amount_sqrt * 0.1;
        let noise_filter = 0.06 + 0.94 * brightness * brightness;

        let bridge_curving_sqrt = non_linearity_amount;
        let bridge_curving = bridge_curving_sqrt * bridge_curving_sqrt * 0.01;

        let ap_gain = -0.618 * non_linearity_amount / (0.15 + non_linearity_amount.abs());

        for (&x, y) in input.iter().zip(out.iter_mut()) {
            self.src_phase += src_ratio;
            if self.src_phase > 1.0 {
                self.src_phase -= 1.0;

                let mut delay = delay_modulation.next();
                let mut s;

                if DISPERSION {
                    let noise = self.random.get_float() - 0.5;
                    one_pole(&mut self.dispersion_noise, noise, noise_filter);
                    delay *= 1.0 + self.dispersion_noise * noise_amount;
                } else {
                    delay *= 1.0 - self.curved_bridge * bridge_curving;
                }

                if DISPERSION {
                    let ap_delay = delay * stretch_point;
                    let main_delay =
                        delay - ap_delay * (0.408 - stretch_point * 0.308) * stretch_correction;
                    if ap_delay >= 4.0 && main_delay >= 4.0 {
                        s = self.string.read_linear(main_delay);
                        s = self.stretch.allpass_linear(s, ap_delay, ap_gain);
                    } else {
                        s = self.string.read_hermite(delay);
                    }
                } else {
                    s = self.string.read_hermite(delay);
                }

                if !DISPERSION {
                    let value = s.abs() - 0.025;
                    let sign = if s > 0.0 { 1.0 } else { -1.5 };
                    self.curved_bridge = (value.abs() + value) * sign;
                }

                s += x;
                s = s.clamp(-20.0, 20.0);
                s = self.dc_blocker.process(s);
                s = self.iir_damping_filter.process(s, FilterMode::LowPass);
                self.string.write(s);

                self.out_sample[1] = self.out_sample[0];
                self.out_sample[0] = s;
            }
            *y += crossfade(self.out_sample[1], self.out_sample[0], self.src_phase);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pluck(f0: f32, non_linearity: f32, damping: f32, blocks: usize) -> Vec<f32> {
        let sr = SampleRate::default();
        let mut string = WaveguideString::new(&sr);
        let mut out = vec![0.0; blocks * 24];
        for (n, chunk) in out.chunks_mut(24).enumerate() {
            let mut input = [0.0; 24];
            if n == 0 {
                for (i, x) in input.iter_mut().enumerate() {
                    *x = if i % 2 == 0 { 0.5 } else { -0.5 };
                }
            }
            string.process(f0, non_linearity, 0.5, damping, &input, chunk);
        }
        out
    }

    #[test]
    fn pluck_decays() {
        let out = pluck(220.0 / 48_000.0, 0.0, 0.3, 1_000);
        let head: f32 = out[..4_800].iter().map(|x| x * x).sum();
        let tail: f32 = out[19_200..].iter().map(|x| x * x).sum();
        assert!(head > 0.0);
        assert!(tail < head * 0.1, "head {} tail {}", head, tail);
    }

    #[test]
    fn every_mode_stays_bounded() {
        for &non_linearity in &[-1.0, -0.5, 0.0, 0.5, 1.0] {
            for &damping in &[0.0, 0.5, 0.97, 1.0] {
                let out = pluck(110.0 / 48_000.0, non_linearity, damping, 400);
                assert!(
                    out.iter().all(|x| x.is_finite() && x.abs() < 25.0),
                    "blew up at nl={} damping={}",
                    non_linearity,
                    damping
                );
            }
        }
    }

    #[test]
    fn low_notes_use_rate_reduction() {
        // 20 Hz needs a 2400-sample loop, longer than the delay line.
        let out = pluck(20.0 / 48_000.0, 0.0, 0.5, 200);
        assert!(out.iter().any(|&x| x != 0.0));
        assert!(out.iter().all(|x| x.is_finite()));
    }
}
