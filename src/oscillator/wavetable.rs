//! Integrated wavetables, and an oscillator that plays them back.
//!
//! Tables store the running integral of each single-cycle wave. Playback
//! differentiates the (interpolated) integral, which acts as a box filter
//! whose width follows the playback frequency: the higher the note, the
//! more the table's upper harmonics are smoothed away. That is how a
//! 128-point table stays reasonably alias-free over the whole keyboard.
//!
//! The waves themselves are computed once at first use, in three banks of
//! 8 x 8:
//!
//! - bank 0: additive spectra, brightness along x and odd/even balance
//!   along y,
//! - bank 1: formant-like windowed sines, resonance along x and window
//!   sharpness along y,
//! - bank 2: wavefolded and phase-distorted sines.

use once_cell::sync::Lazy;
use std::f32::consts::TAU;

use crate::dsp::oscillator::MAX_FREQUENCY;
use crate::dsp::parameter_interpolator::ParameterInterpolator;
use crate::dsp::units::one_pole;

/// Points per wave cycle.
pub const TABLE_SIZE: usize = 128;
/// Guard points stored around each wave for Hermite interpolation.
pub const TABLE_GUARD: usize = 4;
pub const WAVES_PER_BANK: usize = 64;
pub const NUM_BANKS: usize = 3;
pub const NUM_WAVES: usize = WAVES_PER_BANK * NUM_BANKS;

/// All waves, each `TABLE_SIZE + TABLE_GUARD` points. Point `j` of a wave
/// holds the integral at sample `j - 1`, wrapped.
pub static WAVES: Lazy<Vec<f32>> = Lazy::new(|| {
    let mut table = Vec::with_capacity(NUM_WAVES * (TABLE_SIZE + TABLE_GUARD));
    for bank in 0..NUM_BANKS {
        for index in 0..WAVES_PER_BANK {
            let x = (index % 8) as f32 / 7.0;
            let y = (index / 8) as f32 / 7.0;
            let wave: Vec<f32> = (0..TABLE_SIZE)
                .map(|n| {
                    let phase = n as f32 / TABLE_SIZE as f32;
                    match bank {
                        0 => additive_wave(phase, x, y),
                        1 => formant_wave(phase, x, y),
                        _ => folded_wave(phase, x, y),
                    }
                })
                .collect();
            table.extend(integrate(&wave));
        }
    }
    log::debug!("generated {} integrated waves", NUM_WAVES);
    table
});

fn additive_wave(phase: f32, x: f32, y: f32) -> f32 {
    let tilt = 2.5 - 2.0 * x;
    (1..=24)
        .map(|h| {
            let h_f = h as f32;
            let even_gain = if h % 2 == 0 { 1.0 - y } else { 1.0 };
            even_gain * h_f.powf(-tilt) * (TAU * h_f * phase).sin()
        })
        .sum()
}

fn formant_wave(phase: f32, x: f32, y: f32) -> f32 {
    let formant = 1.0 + (x * 15.0).round();
    let window = (0.5 - 0.5 * (TAU * phase).cos()).powf(1.0 + y * 7.0);
    window * (TAU * formant * phase).sin()
}

fn folded_wave(phase: f32, x: f32, y: f32) -> f32 {
    let distorted = phase + y * 0.15 * (TAU * phase).sin();
    let gain = 1.0 + x * 5.0;
    (gain * (TAU * distorted).sin() * std::f32::consts::FRAC_PI_2).sin()
}

/// Removes DC, normalizes the peak, then integrates with the guard layout.
fn integrate(wave: &[f32]) -> Vec<f32> {
    let mean = wave.iter().sum::<f32>() / wave.len() as f32;
    let peak = wave
        .iter()
        .fold(0.0f32, |acc, &s| acc.max((s - mean).abs()))
        .max(1e-6);
    let mut integral = Vec::with_capacity(wave.len());
    let mut sum = 0.0;
    for &s in wave {
        integral.push(sum);
        sum += (s - mean) / peak / TABLE_SIZE as f32;
    }
    let centre = integral.iter().sum::<f32>() / integral.len() as f32;
    let n = integral.len();
    (0..TABLE_SIZE + TABLE_GUARD)
        .map(|j| integral[(j + n - 1) % n] - centre)
        .collect()
}

/// The guarded integrated table of wave `index` (wrapped).
#[inline]
pub fn wave(index: usize) -> &'static [f32] {
    let stride = TABLE_SIZE + TABLE_GUARD;
    let start = (index % NUM_WAVES) * stride;
    &WAVES[start..start + stride]
}

/// Four-point Hermite read at sample `integral + fractional` of a guarded
/// wave.
#[inline]
pub fn interpolate_wave_hermite(table: &[f32], integral: usize, fractional: f32) -> f32 {
    let integral = integral.min(TABLE_SIZE - 1);
    let xm1 = table[integral];
    let x0 = table[integral + 1];
    let x1 = table[integral + 2];
    let x2 = table[integral + 3];
    let c = (x1 - xm1) * 0.5;
    let v = x0 - x1;
    let w = c + v;
    let a = w + v + (x2 - x0) * 0.5;
    let b_neg = w + a;
    (((a * fractional) - b_neg) * fractional + c) * fractional + x0
}

/// Leaky differentiator turning an integrated wave back into a wave.
#[derive(Debug, Clone, Copy, Default)]
pub struct Differentiator {
    lp: f32,
    previous: f32,
}

impl Differentiator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn process(&mut self, coefficient: f32, s: f32) -> f32 {
        one_pole(&mut self.lp, s - self.previous, coefficient);
        self.previous = s;
        self.lp
    }
}

/// Scans a row of consecutive waves.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavetableOscillator {
    phase: f32,
    frequency: f32,
    amplitude: f32,
    waveform: f32,
    lp: f32,
    differentiator: Differentiator,
}

impl WavetableOscillator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Adds `amplitude` times the wave at position `waveform` (0..1 across
    /// `num_waves` waves starting at `first_wave`) into `out`.
    pub fn render(
        &mut self,
        frequency: f32,
        amplitude: f32,
        waveform: f32,
        first_wave: usize,
        num_waves: usize,
        out: &mut [f32],
    ) {
        let size = out.len();
        let frequency = frequency.clamp(0.000_000_1, MAX_FREQUENCY);
        let amplitude = amplitude * (1.0 - 2.0 * frequency);
        let num_waves = num_waves.max(2);
        let waveform = waveform.clamp(0.0, 1.0) * (num_waves as f32 - 1.0001);

        let mut frequency_modulation = ParameterInterpolator::new(&mut self.frequency, frequency, size);
        let mut amplitude_modulation = ParameterInterpolator::new(&mut self.amplitude, amplitude, size);
        let mut waveform_modulation = ParameterInterpolator::new(&mut self.waveform, waveform, size);

        for sample in out.iter_mut() {
            let f0 = frequency_modulation.next();
            let cutoff = (TABLE_SIZE as f32 * f0).min(1.0);
            let scale = 1.0 / f0;

            self.phase += f0;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }

            let waveform = waveform_modulation.next();
            let waveform_integral = waveform as usize;
            let waveform_fractional = waveform - waveform_integral as f32;

            let p = self.phase * TABLE_SIZE as f32;
            let p_integral = p as usize;
            let p_fractional = p - p_integral as f32;

            let x0 = interpolate_wave_hermite(wave(first_wave + waveform_integral), p_integral, p_fractional);
            let x1 = interpolate_wave_hermite(wave(first_wave + waveform_integral + 1), p_integral, p_fractional);

            let s = self
                .differentiator
                .process(cutoff, (x0 + (x1 - x0) * waveform_fractional) * scale);
            one_pole(&mut self.lp, s, cutoff);
            *sample += amplitude_modulation.next() * self.lp;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_wave_is_periodic_and_centred() {
        for index in 0..NUM_WAVES {
            let table = wave(index);
            assert_eq!(table.len(), TABLE_SIZE + TABLE_GUARD);
            // Guard points repeat the start of the cycle.
            assert!((table[TABLE_SIZE] - table[0]).abs() < 1e-3, "wave {}", index);
            assert!(table.iter().all(|x| x.is_finite()));
        }
    }

    #[test]
    fn playback_has_roughly_unit_amplitude() {
        let mut osc = WavetableOscillator::new();
        let mut out = vec![0.0; 4_800];
        for chunk in out.chunks_mut(12) {
            osc.render(0.005, 1.0, 0.0, 0, 8, chunk);
        }
        let peak = out[2_400..].iter().fold(0.0f32, |acc, x| acc.max(x.abs()));
        assert!(peak > 0.3 && peak < 1.5, "peak {}", peak);
    }
}
