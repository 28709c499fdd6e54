//! Band-limited base oscillator and the sine family.

/*
Band-limited oscillators
========================

A naive sawtooth is `phase` itself: ramp up, snap back to zero. Sampled at
discrete instants, that snap is infinitely sharp and its harmonics fold back
below Nyquist as inharmonic "aliases".

The fix used everywhere in this crate: keep the naive waveform, and at every
discontinuity add a small polynomial residual (the difference between an
ideal band-limited step and the naive step) to the two samples straddling the
event.

    phase ──→ naive value ──┐
                            ├──→ this_sample ──→ out
    crossing at t ──→ BLEP ─┤
                            └──→ next_sample (carried one sample forward)

`t` is the fraction of a sample *after* the crossing at which it happened:

    t = phase_after_wrap / frequency

Jumps in value (saw reset, square edges) use BLEP. Jumps in slope (triangle
corners) use the integrated residual, BLAMP, scaled by the change of slope.

The carried residual is why every oscillator here has a `next_sample` field:
the correction for an edge in the last sample of a block lands in the first
sample of the next.


Shapes
------

    ImpulseTrain    differentiated saw, one band-limited click per period
    Saw             ╱│╱│╱│
    Triangle        ╱╲╱╲╱╲
    Slope           triangle with movable peak (pw)
    Square          ┌┐_┌┐_   pulse width pw
    SquareBright    square through a one-pole high-pass
    SquareDark      square through a one-pole low-pass
    SquareTriangle  square heavily integrated into a rounded triangle
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::parameter_interpolator::ParameterInterpolator;
use crate::dsp::polyblep::{
    next_blep_sample, next_integrated_blep_sample, this_blep_sample, this_integrated_blep_sample,
};
use crate::dsp::tables::{sine, SINE, SINE_SIZE};

/// Upper frequency bound of the base oscillator (cycles per sample).
pub const MAX_FREQUENCY: f32 = 0.25;
/// Lower frequency bound; keeps the crossing back-solve away from zero.
pub const MIN_FREQUENCY: f32 = 0.000_001;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OscillatorShape {
    ImpulseTrain,
    #[default]
    Saw,
    Triangle,
    Slope,
    Square,
    SquareBright,
    SquareDark,
    SquareTriangle,
}

/// Phase accumulator with BLEP/BLAMP correction.
#[derive(Debug, Clone, Copy, Default)]
pub struct Oscillator {
    phase: f32,
    next_sample: f32,
    lp_state: f32,
    hp_state: f32,
    high: bool,

    frequency: f32,
    pw: f32,
}

impl Oscillator {
    pub fn new() -> Self {
        let mut oscillator = Self::default();
        oscillator.reset();
        oscillator
    }

    pub fn reset(&mut self) {
        self.phase = 0.5;
        self.next_sample = 0.0;
        self.lp_state = 1.0;
        self.hp_state = 0.0;
        self.high = true;
        self.frequency = 0.001;
        self.pw = 0.5;
    }

    #[inline]
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Renders one block. `frequency` and `pw` are ramped from their previous
    /// values. `external_fm`, when given, multiplies the frequency per sample.
    pub fn render(
        &mut self,
        shape: OscillatorShape,
        frequency: f32,
        pw: f32,
        external_fm: Option<&[f32]>,
        out: &mut [f32],
    ) {
        let size = out.len();
        let frequency = if external_fm.is_none() {
            frequency.clamp(MIN_FREQUENCY, MAX_FREQUENCY)
        } else {
            frequency
        };
        let pw = if shape == OscillatorShape::Saw {
            pw
        } else {
            let f = frequency.abs().min(MAX_FREQUENCY);
            pw.clamp(f * 2.0, 1.0 - 2.0 * f)
        };

        let mut fm = ParameterInterpolator::new(&mut self.frequency, frequency, size);
        let mut pwm = ParameterInterpolator::new(&mut self.pw, pw, size);

        let mut next_sample = self.next_sample;
        for (i, sample) in out.iter_mut().enumerate() {
            let mut this_sample = next_sample;
            next_sample = 0.0;

            let mut frequency = fm.next();
            if let Some(external_fm) = external_fm {
                frequency *= external_fm.get(i).copied().unwrap_or(1.0);
                frequency = frequency.clamp(MIN_FREQUENCY, MAX_FREQUENCY);
            }
            let pw = if matches!(
                shape,
                OscillatorShape::Triangle | OscillatorShape::SquareTriangle
            ) {
                pwm.next();
                0.5
            } else {
                pwm.next()
            };
            self.phase += frequency;

            match shape {
                OscillatorShape::ImpulseTrain | OscillatorShape::Saw => {
                    if self.phase >= 1.0 {
                        self.phase -= 1.0;
                        let t = self.phase / frequency;
                        this_sample -= this_blep_sample(t);
                        next_sample -= next_blep_sample(t);
                    }
                    next_sample += self.phase;
                    if shape == OscillatorShape::Saw {
                        *sample = 2.0 * this_sample - 1.0;
                    } else {
                        self.lp_state += 0.25 * ((self.hp_state - this_sample) - self.lp_state);
                        *sample = 4.0 * self.lp_state;
                        self.hp_state = this_sample;
                    }
                }
                OscillatorShape::Triangle | OscillatorShape::Slope => {
                    let (slope_up, slope_down) = if shape == OscillatorShape::Slope {
                        (1.0 / pw, 1.0 / (1.0 - pw))
                    } else {
                        (2.0, 2.0)
                    };
                    let discontinuity = (slope_up + slope_down) * frequency;
                    if !self.high && self.phase >= pw {
                        let t = (self.phase - pw) / frequency;
                        this_sample -= this_integrated_blep_sample(t) * discontinuity;
                        next_sample -= next_integrated_blep_sample(t) * discontinuity;
                        self.high = true;
                    }
                    if self.phase >= 1.0 {
                        self.phase -= 1.0;
                        let t = self.phase / frequency;
                        this_sample += this_integrated_blep_sample(t) * discontinuity;
                        next_sample += next_integrated_blep_sample(t) * discontinuity;
                        self.high = false;
                    }
                    next_sample += if self.high {
                        1.0 - (self.phase - pw) * slope_down
                    } else {
                        self.phase * slope_up
                    };
                    *sample = 2.0 * this_sample - 1.0;
                }
                _ => {
                    if !self.high && self.phase >= pw {
                        let t = (self.phase - pw) / frequency;
                        this_sample += this_blep_sample(t);
                        next_sample += next_blep_sample(t);
                        self.high = true;
                    }
                    if self.phase >= 1.0 {
                        self.phase -= 1.0;
                        let t = self.phase / frequency;
                        this_sample -= this_blep_sample(t);
                        next_sample -= next_blep_sample(t);
                        self.high = false;
                    }
                    next_sample += if self.phase < pw { 0.0 } else { 1.0 };

                    *sample = match shape {
                        OscillatorShape::SquareTriangle => {
                            let integrator_coefficient = frequency * 0.0625;
                            let s = 128.0 * (this_sample - 0.5);
                            self.lp_state += integrator_coefficient * (s - self.lp_state);
                            self.lp_state
                        }
                        OscillatorShape::SquareDark => {
                            let integrator_coefficient = frequency * 2.0;
                            let s = 4.0 * (this_sample - 0.5);
                            self.lp_state += integrator_coefficient * (s - self.lp_state);
                            self.lp_state
                        }
                        OscillatorShape::SquareBright => {
                            let integrator_coefficient = frequency * 2.0;
                            let s = 2.0 * this_sample - 1.0;
                            self.lp_state += integrator_coefficient * (s - self.lp_state);
                            (s - self.lp_state) * 0.5
                        }
                        _ => 2.0 * this_sample - 1.0,
                    };
                }
            }
        }
        self.next_sample = next_sample;
    }
}

/// Table sine of a 32-bit phase with an added phase modulation in cycles.
#[inline]
pub fn sine_pm(phase: u32, pm: f32) -> f32 {
    let offset = ((pm + 4.0) * 536_870_912.0) as u32;
    let phase = phase.wrapping_add(offset.wrapping_shl(3));
    let integral = (phase >> 22) as usize;
    let fractional = (phase << 10) as f32 / 4_294_967_296.0;
    let a = SINE[integral];
    let b = SINE[integral + 1];
    a + (b - a) * fractional
}

/// Table sine of a 32-bit phase without interpolation overhead on the index.
#[inline]
pub fn sine_raw(phase: u32) -> f32 {
    let integral = (phase >> 22) as usize % SINE_SIZE;
    let fractional = (phase << 10) as f32 / 4_294_967_296.0;
    let a = SINE[integral];
    let b = SINE[integral + 1];
    a + (b - a) * fractional
}

/// Table-driven sine oscillator. Accepts negative frequencies.
#[derive(Debug, Clone, Copy, Default)]
pub struct SineOscillator {
    phase: f32,
    frequency: f32,
    amplitude: f32,
}

impl SineOscillator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Advances one sample. Through-zero frequencies wrap the phase in both
    /// directions so it stays in [0, 1).
    #[inline]
    pub fn next(&mut self, frequency: f32) -> f32 {
        let frequency = frequency.clamp(-0.5, 0.5);
        self.phase += frequency;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        } else if self.phase < 0.0 {
            self.phase += 1.0;
            // A tiny negative phase rounds up to exactly 1.
            if self.phase >= 1.0 {
                self.phase = 0.0;
            }
        }
        sine(self.phase)
    }

    /// Adds `amplitude * sin` into `out`, both ramped from the last call.
    pub fn render_add(&mut self, frequency: f32, amplitude: f32, out: &mut [f32]) {
        let size = out.len();
        let (frequency, amplitude) = if frequency >= 0.5 || !frequency.is_finite() {
            (0.5, 0.0)
        } else {
            (frequency, amplitude)
        };
        let mut fm = ParameterInterpolator::new(&mut self.frequency, frequency, size);
        let mut am = ParameterInterpolator::new(&mut self.amplitude, amplitude, size);
        for sample in out.iter_mut() {
            self.phase += fm.next();
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            } else if self.phase < 0.0 {
                self.phase += 1.0;
                if self.phase >= 1.0 {
                    self.phase = 0.0;
                }
            }
            *sample += am.next() * sine(self.phase);
        }
    }
}

/// Sine by a rotating vector; no table, no phase, cheap.
///
/// The rotation is renormalized once per block so rounding errors never
/// grow the amplitude.
#[derive(Debug, Clone, Copy)]
pub struct FastSineOscillator {
    x: f32,
    y: f32,
    epsilon: f32,
    amplitude: f32,
}

impl Default for FastSineOscillator {
    fn default() -> Self {
        Self::new()
    }
}

impl FastSineOscillator {
    pub fn new() -> Self {
        Self {
            x: 1.0,
            y: 0.0,
            epsilon: 0.0,
            amplitude: 0.0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Polynomial approximation of `2 sin(pi f)`.
    #[inline]
    fn fast_2_sin(f: f32) -> f32 {
        let f_pi = f * std::f32::consts::PI;
        f_pi * (2.0 - (2.0 * 0.96 / 6.0) * f_pi * f_pi)
    }

    fn prepare(&mut self, frequency: f32, amplitude: f32) -> (f32, f32) {
        let (frequency, amplitude) = if frequency >= MAX_FREQUENCY {
            (MAX_FREQUENCY, 0.0)
        } else {
            (frequency.max(0.0), amplitude)
        };
        let norm = self.x * self.x + self.y * self.y;
        if norm <= 0.5 || norm >= 2.0 {
            let scale = if norm > 0.0 { 1.0 / norm.sqrt() } else { 0.0 };
            self.x *= scale;
            self.y *= scale;
            if norm <= 0.0 {
                self.x = 1.0;
            }
        }
        (Self::fast_2_sin(frequency), amplitude)
    }

    pub fn render(&mut self, frequency: f32, out: &mut [f32]) {
        let size = out.len();
        let (epsilon, _) = self.prepare(frequency, 1.0);
        let mut epsilon_modulation = ParameterInterpolator::new(&mut self.epsilon, epsilon, size);
        let (mut x, mut y) = (self.x, self.y);
        for sample in out.iter_mut() {
            let e = epsilon_modulation.next();
            x += e * y;
            y -= e * x;
            *sample = x;
        }
        self.x = x;
        self.y = y;
    }

    /// Adds `amplitude * x` into `out`; amplitude is ramped.
    pub fn render_add(&mut self, frequency: f32, amplitude: f32, out: &mut [f32]) {
        let size = out.len();
        let (epsilon, amplitude) = self.prepare(frequency, amplitude);
        let mut epsilon_modulation = ParameterInterpolator::new(&mut self.epsilon, epsilon, size);
        let mut amplitude_modulation =
            ParameterInterpolator::new(&mut self.amplitude, amplitude, size);
        let (mut x, mut y) = (self.x, self.y);
        for sample in out.iter_mut() {
            let e = epsilon_modulation.next();
            x += e * y;
            y -= e * x;
            *sample += amplitude_modulation.next() * x;
        }
        self.x = x;
        self.y = y;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CosineOscillatorMode {
    Approximate,
    Exact,
}

/// Second-order recurrence producing `0.5 + 0.5 cos(2 pi f n)`-like values.
///
/// Used to lay out per-mode amplitudes along a string from a pickup
/// position, not for audio.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineOscillator {
    y1: f32,
    y0: f32,
    iir_coefficient: f32,
    initial_amplitude: f32,
}

impl CosineOscillator {
    pub fn new(frequency: f32, mode: CosineOscillatorMode) -> Self {
        let mut oscillator = Self::default();
        oscillator.init(frequency, mode);
        oscillator
    }

    pub fn init(&mut self, frequency: f32, mode: CosineOscillatorMode) {
        match mode {
            CosineOscillatorMode::Approximate => self.init_approximate(frequency),
            CosineOscillatorMode::Exact => {
                self.iir_coefficient = 2.0 * (std::f32::consts::TAU * frequency).cos();
                self.initial_amplitude = self.iir_coefficient * 0.25;
            }
        }
        self.start();
    }

    fn init_approximate(&mut self, frequency: f32) {
        let mut sign = 16.0;
        let mut frequency = frequency - 0.25;
        if frequency < 0.0 {
            frequency = -frequency;
        } else if frequency > 0.5 {
            frequency -= 0.5;
        } else {
            sign = -16.0;
        }
        self.iir_coefficient = sign * frequency * (1.0 - 2.0 * frequency);
        self.initial_amplitude = self.iir_coefficient * 0.25;
    }

    pub fn start(&mut self) {
        self.y1 = self.initial_amplitude;
        self.y0 = 0.5;
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.y1 + 0.5
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        let temp = self.y0;
        self.y0 = self.iir_coefficient * self.y0 - self.y1;
        self.y1 = temp;
        temp + 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(shape: OscillatorShape, frequency: f32, pw: f32, n: usize) -> Vec<f32> {
        let mut osc = Oscillator::new();
        let mut out = vec![0.0; n];
        for chunk in out.chunks_mut(12) {
            osc.render(shape, frequency, pw, None, chunk);
        }
        out
    }

    #[test]
    fn phase_stays_in_unit_interval() {
        let mut osc = Oscillator::new();
        let mut out = [0.0; 24];
        for &f in &[0.000_001, 0.01, 0.1, 0.2499, 0.3, 10.0] {
            for _ in 0..100 {
                osc.render(OscillatorShape::Square, f, 0.3, None, &mut out);
                assert!(
                    (0.0..1.0).contains(&osc.phase()),
                    "phase {} escaped at f={}",
                    osc.phase(),
                    f
                );
            }
        }
    }

    #[test]
    fn every_shape_is_bounded() {
        for shape in [
            OscillatorShape::ImpulseTrain,
            OscillatorShape::Saw,
            OscillatorShape::Triangle,
            OscillatorShape::Slope,
            OscillatorShape::Square,
            OscillatorShape::SquareBright,
            OscillatorShape::SquareDark,
            OscillatorShape::SquareTriangle,
        ] {
            let out = render(shape, 0.013, 0.3, 4_800);
            let peak = out.iter().fold(0.0f32, |acc, x| acc.max(x.abs()));
            // Band-limited impulses are narrow and tall.
            let limit = if shape == OscillatorShape::ImpulseTrain { 4.0 } else { 2.5 };
            assert!(peak.is_finite() && peak < limit, "{:?} peaked at {}", shape, peak);
        }
    }

    #[test]
    fn saw_has_no_dc_to_speak_of() {
        let out = render(OscillatorShape::Saw, 0.01, 0.5, 10_000);
        let mean = out.iter().sum::<f32>() / out.len() as f32;
        assert!(mean.abs() < 0.02, "saw mean {}", mean);
    }

    #[test]
    fn sine_oscillator_runs_through_zero() {
        let mut osc = SineOscillator::new();
        for i in 0..1_000 {
            let f = if i % 200 < 100 { 0.01 } else { -0.02 };
            let s = osc.next(f);
            assert!((0.0..1.0).contains(&osc.phase()));
            assert!(s.abs() <= 1.0001);
        }
    }

    #[test]
    fn tiny_negative_step_wraps_below_one() {
        let mut osc = SineOscillator::new();
        let s = osc.next(-1e-9);
        assert!((0.0..1.0).contains(&osc.phase()), "phase {}", osc.phase());
        assert!(s.is_finite());
    }

    #[test]
    fn fast_sine_keeps_its_amplitude() {
        let mut osc = FastSineOscillator::new();
        let mut out = [0.0; 24];
        let mut peak = 0.0f32;
        for _ in 0..2_000 {
            osc.render(0.01, &mut out);
            peak = out.iter().fold(peak, |acc, x| acc.max(x.abs()));
        }
        assert!(peak > 0.9 && peak < 1.2, "fast sine peak {}", peak);
    }

    #[test]
    fn cosine_oscillator_exact_follows_cosine() {
        let mut osc = CosineOscillator::new(0.1, CosineOscillatorMode::Exact);
        osc.next();
        for n in 1..10 {
            let expected = 0.5 * (std::f32::consts::TAU * 0.1 * n as f32).cos() + 0.5;
            let got = osc.next();
            assert!((got - expected).abs() < 0.3, "n={} got {} expected {}", n, got, expected);
        }
    }

    #[test]
    fn sine_pm_matches_table_sine() {
        let phase = 1u32 << 30; // a quarter cycle
        assert!((sine_pm(phase, 0.0) - 1.0).abs() < 1e-3);
        assert!((sine_raw(phase) - 1.0).abs() < 1e-3);
    }
}
