//! Modal resonator: a bank of band-pass filters tuned to the partials of a
//! struck object.
//!
//! Partial `n` sits at `n * f0 * stretch(n)`, where the stretch accumulates
//! a stiffness term that itself decays from partial to partial. Negative
//! stiffness squeezes partials together (a slack membrane), zero gives a
//! harmonic series (an ideal string) and large values spread them out
//! towards bells and plates. The fundamental is pre-compensated so the
//! third partial stays in tune whatever the stiffness.
//!
//! Each partial's level comes from where the object is struck: the
//! `position` control samples a cosine at the partial index, so a strike in
//! the middle mutes the even partials.

use crate::dsp::filter::{tan_approx, FilterMode, FrequencyApproximation};
use crate::dsp::oscillator::{CosineOscillator, CosineOscillatorMode};
use crate::dsp::tables::STIFFNESS;
use crate::dsp::units::{interpolate, saturate, semitones_to_ratio};

/// Largest number of partials a resonator renders.
pub const MAX_NUM_MODES: usize = 24;
/// Partials are rendered by banks of this many filters.
pub const MODE_BATCH_SIZE: usize = 4;
/// Partials at or above this normalized frequency are muted.
pub const MAX_MODE_FREQUENCY: f32 = 0.499;

/// `N` state-variable filters sharing one input, their outputs summed.
#[derive(Debug, Clone, Copy)]
pub struct ResonatorSvf<const N: usize> {
    state_1: [f32; N],
    state_2: [f32; N],
}

impl<const N: usize> Default for ResonatorSvf<N> {
    fn default() -> Self {
        Self {
            state_1: [0.0; N],
            state_2: [0.0; N],
        }
    }
}

impl<const N: usize> ResonatorSvf<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Filters `input` through every filter and writes (or with `add`,
    /// accumulates) the gain-weighted sum into `out`.
    #[allow(clippy::too_many_arguments)]
    pub fn process(
        &mut self,
        f: &[f32; N],
        q: &[f32; N],
        gain: &[f32; N],
        mode: FilterMode,
        add: bool,
        input: &[f32],
        out: &mut [f32],
    ) {
        let mut g = [0.0; N];
        let mut r = [0.0; N];
        let mut r_plus_g = [0.0; N];
        let mut h = [0.0; N];
        for i in 0..N {
            g[i] = tan_approx(f[i].clamp(0.0, MAX_MODE_FREQUENCY), FrequencyApproximation::Fast);
            r[i] = 1.0 / q[i].max(0.05);
            h[i] = 1.0 / (1.0 + r[i] * g[i] + g[i] * g[i]);
            r_plus_g[i] = r[i] + g[i];
        }

        let mut state_1 = self.state_1;
        let mut state_2 = self.state_2;
        for (&x, y) in input.iter().zip(out.iter_mut()) {
            let mut s = 0.0;
            for i in 0..N {
                let hp = (x - r_plus_g[i] * state_1[i] - state_2[i]) * h[i];
                let bp = g[i] * hp + state_1[i];
                state_1[i] = g[i] * hp + bp;
                let lp = g[i] * bp + state_2[i];
                state_2[i] = g[i] * bp + lp;
                let value = match mode {
                    FilterMode::LowPass => lp,
                    FilterMode::BandPass => bp,
                    FilterMode::BandPassNormalized => bp * r[i],
                    FilterMode::HighPass => hp,
                };
                s += gain[i] * value;
            }
            if add {
                *y += s;
            } else {
                *y = s;
            }
        }
        self.state_1 = state_1;
        self.state_2 = state_2;
    }
}

/// Scales `f0` so that partial `n` lands on `n * f0` despite stretching.
#[inline]
pub fn nth_harmonic_compensation(n: usize, stiffness: f32) -> f32 {
    1.0 + (n.saturating_sub(1)) as f32 * stiffness
}

#[derive(Debug, Clone)]
pub struct Resonator {
    resolution: usize,
    mode_amplitude: [f32; MAX_NUM_MODES],
    mode_filters: [ResonatorSvf<MODE_BATCH_SIZE>; MAX_NUM_MODES / MODE_BATCH_SIZE],
}

impl Default for Resonator {
    fn default() -> Self {
        Self::new(0.015, MAX_NUM_MODES)
    }
}

impl Resonator {
    /// `position` is where along the object it is struck, `resolution` the
    /// number of partials (at most [`MAX_NUM_MODES`]).
    pub fn new(position: f32, resolution: usize) -> Self {
        let mut resonator = Self {
            resolution: 0,
            mode_amplitude: [0.0; MAX_NUM_MODES],
            mode_filters: [ResonatorSvf::new(); MAX_NUM_MODES / MODE_BATCH_SIZE],
        };
        resonator.init(position, resolution);
        resonator
    }

    pub fn init(&mut self, position: f32, resolution: usize) {
        self.resolution = resolution.min(MAX_NUM_MODES);
        self.set_position(position);
        for filter in self.mode_filters.iter_mut() {
            filter.reset();
        }
    }

    /// Moves the strike point without clearing the ringing filters.
    pub fn set_position(&mut self, position: f32) {
        let mut amplitudes = CosineOscillator::new(saturate(position, 0.0, 1.0), CosineOscillatorMode::Approximate);
        for (i, amplitude) in self.mode_amplitude.iter_mut().enumerate() {
            *amplitude = if i < self.resolution {
                amplitudes.next() * 0.25
            } else {
                0.0
            };
        }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Rings the bank with `input` and adds the result into `out`.
    ///
    /// `structure` selects the stiffness, `brightness` how quickly the upper
    /// partials decay relative to the lower ones and `damping` the overall
    /// decay time (higher rings longer).
    pub fn process(
        &mut self,
        f0: f32,
        structure: f32,
        brightness: f32,
        damping: f32,
        input: &[f32],
        out: &mut [f32],
    ) {
        let structure = saturate(structure, 0.0, 1.0);
        let damping = saturate(damping, 0.0, 1.0);
        let mut brightness = saturate(brightness, 0.0, 1.0);

        let mut stiffness = interpolate(&STIFFNESS, structure, (STIFFNESS.len() - 1) as f32);
        let f0 = f0.max(0.0) * nth_harmonic_compensation(3, stiffness);

        let mut harmonic = f0;
        let mut stretch_factor = 1.0;
        let q_sqrt = semitones_to_ratio(damping * 79.7);
        let mut q = 500.0 * q_sqrt * q_sqrt;
        brightness *= 1.0 - structure * 0.3;
        brightness *= 1.0 - damping * 0.3;
        let q_loss = brightness * (2.0 - brightness) * 0.85 + 0.15;

        let mut mode_f = [0.0; MODE_BATCH_SIZE];
        let mut mode_q = [0.0; MODE_BATCH_SIZE];
        let mut mode_a = [0.0; MODE_BATCH_SIZE];
        let mut batch = 0;
        let mut filters = self.mode_filters.iter_mut();

        for i in 0..self.resolution {
            let mode_frequency = harmonic * stretch_factor;
            let (frequency, amplitude) = if mode_frequency >= MAX_MODE_FREQUENCY || !mode_frequency.is_finite() {
                (MAX_MODE_FREQUENCY, 0.0)
            } else {
                (mode_frequency, self.mode_amplitude[i] * (1.0 - mode_frequency * 2.0))
            };
            mode_f[batch] = frequency;
            mode_q[batch] = 1.0 + frequency * q;
            mode_a[batch] = amplitude;
            batch += 1;

            if batch == MODE_BATCH_SIZE {
                batch = 0;
                if let Some(filter) = filters.next() {
                    filter.process(&mode_f, &mode_q, &mode_a, FilterMode::BandPass, true, input, out);
                }
            }

            stretch_factor += stiffness;
            if stiffness < 0.0 {
                stiffness *= 0.93;
            } else {
                stiffness *= 0.98;
            }
            harmonic += f0;
            q *= q_loss;
        }

        if batch != 0 {
            mode_a[batch..].fill(0.0);
            if let Some(filter) = filters.next() {
                filter.process(&mode_f, &mode_q, &mode_a, FilterMode::BandPass, true, input, out);
            }
        }
    }
}
