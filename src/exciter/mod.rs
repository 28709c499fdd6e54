//! Exciter bank: the things that hit, pluck, rub or blow a resonator.
//!
//! ```text
//!   flags ──→ [model] ──→ [low-pass, cutoff from timbre] ──→ out
//!                │
//!                └──→ damping (side channel for the resonator)
//! ```
//!
//! | model                  | sound                                       | parameter                 |
//! | ---------------------- | ------------------------------------------- | ------------------------- |
//! | granular sample player | scrubbed noise loop, random restarts        | restart probability       |
//! | sample player          | two one-shots crossfaded                    | which one-shot            |
//! | mallet                 | a single impulse                            | how much release mutes    |
//! | plectrum               | a small pre-pulse, then the pick lets go    | how long the pick holds   |
//! | particles              | sparse random impulses while gated          | impulse rate              |
//! | flow                   | noise with random polarity flips            | flip rate and noise level |
//! | noise                  | white noise                                 | (none)                    |
//!
//! The two sample players shape their own spectrum and skip the post
//! filter. Every model reports a `damping` value each block, which the
//! resonator voice uses to shorten the ring (a palm mute).

pub mod samples;

use std::ops::BitOr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::filter::{FilterMode, FrequencyApproximation, Svf};
use crate::dsp::random::Random;
use crate::dsp::tables::pulse_amplitude;
use crate::dsp::units::{interpolate_wrap, semitones_to_ratio, split};

use samples::{NOISE_SAMPLE, NOISE_SAMPLE_SIZE, NUM_SAMPLES, SAMPLES, SAMPLE_SIZE};

/// Gate and trigger state handed to [`Exciter::process`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExciterFlags(u8);

impl ExciterFlags {
    pub const RISING_EDGE: Self = Self(1);
    pub const FALLING_EDGE: Self = Self(2);
    pub const GATE: Self = Self(4);
    pub const UNPATCHED: Self = Self(8);

    pub const fn empty() -> Self {
        Self(0)
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Flags for a gate that was `previous` last block and is `gate` now.
    pub fn from_gate(previous: bool, gate: bool) -> Self {
        let mut flags = Self::empty();
        if gate {
            flags = flags | Self::GATE;
            if !previous {
                flags = flags | Self::RISING_EDGE;
            }
        } else if previous {
            flags = flags | Self::FALLING_EDGE;
        }
        flags
    }
}

impl BitOr for ExciterFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExciterModel {
    GranularSamplePlayer,
    SamplePlayer,
    #[default]
    Mallet,
    Plectrum,
    Particles,
    Flow,
    Noise,
}

impl ExciterModel {
    pub const ALL: [ExciterModel; 7] = [
        ExciterModel::GranularSamplePlayer,
        ExciterModel::SamplePlayer,
        ExciterModel::Mallet,
        ExciterModel::Plectrum,
        ExciterModel::Particles,
        ExciterModel::Flow,
        ExciterModel::Noise,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExciterModel::GranularSamplePlayer => "granular",
            ExciterModel::SamplePlayer => "sample",
            ExciterModel::Mallet => "mallet",
            ExciterModel::Plectrum => "plectrum",
            ExciterModel::Particles => "particles",
            ExciterModel::Flow => "flow",
            ExciterModel::Noise => "noise",
        }
    }

    fn filtered(self) -> bool {
        !matches!(
            self,
            ExciterModel::GranularSamplePlayer | ExciterModel::SamplePlayer
        )
    }
}

#[derive(Debug, Clone)]
pub struct Exciter {
    model: ExciterModel,
    parameter: f32,
    timbre: f32,
    signature: f32,

    lp: Svf,
    damp_state: f32,
    damping: f32,

    delay: u32,
    plectrum_delay: u32,
    particle_state: f32,
    particle_range: f32,

    grain_phase: f32,
    sample_phase: [f32; 2],

    random: Random,
}

impl Default for Exciter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exciter {
    pub fn new() -> Self {
        Self {
            model: ExciterModel::Mallet,
            parameter: 0.0,
            timbre: 0.99,
            signature: 0.0,
            lp: Svf::new(),
            damp_state: 0.0,
            damping: 0.0,
            delay: 0,
            plectrum_delay: 0,
            particle_state: 0.5,
            particle_range: 1.0,
            grain_phase: 0.0,
            sample_phase: [SAMPLE_SIZE as f32; 2],
            random: Random::new_with_seed(0xe8c17e5),
        }
    }

    /// Clears every model's state; the model and controls are kept.
    pub fn reset(&mut self) {
        self.lp.reset();
        self.damp_state = 0.0;
        self.damping = 0.0;
        self.delay = 0;
        self.plectrum_delay = 0;
        self.particle_state = 0.5;
        self.particle_range = 1.0;
        self.grain_phase = 0.0;
        self.sample_phase = [SAMPLE_SIZE as f32; 2];
    }

    /// Switching models resets the exciter.
    pub fn set_model(&mut self, model: ExciterModel) {
        if model != self.model {
            self.model = model;
            self.reset();
        }
    }

    pub fn model(&self) -> ExciterModel {
        self.model
    }

    pub fn set_parameter(&mut self, parameter: f32) {
        self.parameter = parameter.clamp(0.0, 1.0);
    }

    pub fn set_timbre(&mut self, timbre: f32) {
        self.timbre = timbre.clamp(0.0, 1.0);
    }

    /// Per-instance variation, in [0, 1].
    pub fn set_signature(&mut self, signature: f32) {
        self.signature = signature.clamp(0.0, 1.0);
    }

    /// How much the resonator should be muted this block, in [0, 1].
    #[inline]
    pub fn damping(&self) -> f32 {
        self.damping
    }

    /// Renders one block of excitation into `out`, post-filtered.
    pub fn process(&mut self, flags: ExciterFlags, out: &mut [f32]) {
        self.render_model(flags, out);
        if self.model.filtered() {
            let cutoff = (0.0015 * 10.0f32.powf(self.timbre * 2.3)).min(0.4);
            let q = 0.5 + 2.0 * self.parameter * self.parameter;
            self.lp.set_f_q(cutoff, q, FrequencyApproximation::Fast);
            self.lp.process_buffer(out, FilterMode::LowPass);
        }
    }

    /// Renders the selected model into `out` without the post filter and
    /// updates [`damping`](Self::damping).
    pub fn render_model(&mut self, flags: ExciterFlags, out: &mut [f32]) {
        self.damping = 0.0;
        match self.model {
            ExciterModel::GranularSamplePlayer => self.process_granular_sample_player(flags, out),
            ExciterModel::SamplePlayer => self.process_sample_player(flags, out),
            ExciterModel::Mallet => self.process_mallet(flags, out),
            ExciterModel::Plectrum => self.process_plectrum(flags, out),
            ExciterModel::Particles => self.process_particles(flags, out),
            ExciterModel::Flow => self.process_flow(flags, out),
            ExciterModel::Noise => self.process_noise(flags, out),
        }
    }

    /// Raises the mute while the gate is low.
    fn release(&mut self, flags: ExciterFlags, size: usize) {
        if !flags.contains(ExciterFlags::GATE) {
            self.damp_state = (self.damp_state + 0.002 * size as f32).min(1.0);
        }
    }

    fn process_mallet(&mut self, flags: ExciterFlags, out: &mut [f32]) {
        out.fill(0.0);
        if flags.contains(ExciterFlags::RISING_EDGE) {
            self.damp_state = 0.0;
            if let Some(first) = out.first_mut() {
                *first = pulse_amplitude(self.timbre);
            }
        }
        self.release(flags, out.len());
        self.damping = self.damp_state * (1.0 - self.parameter);
    }

    fn process_plectrum(&mut self, flags: ExciterFlags, out: &mut [f32]) {
        let amplitude = pulse_amplitude(self.timbre);
        out.fill(0.0);
        if flags.contains(ExciterFlags::RISING_EDGE) {
            // The pick pushes the string before letting go.
            if let Some(first) = out.first_mut() {
                *first = -amplitude * (0.05 + self.signature * 0.2);
            }
            self.plectrum_delay = (4_096.0 * self.parameter * self.parameter) as u32 + 64;
            self.damp_state = 1.0;
        }
        if self.plectrum_delay > 0 {
            let remaining = self.plectrum_delay as usize;
            if remaining <= out.len() {
                out[remaining - 1] += amplitude;
                self.plectrum_delay = 0;
            } else {
                self.plectrum_delay -= out.len() as u32;
            }
        } else {
            self.damp_state *= 0.85;
        }
        self.damping = self.damp_state;
    }

    fn process_particles(&mut self, flags: ExciterFlags, out: &mut [f32]) {
        if flags.contains(ExciterFlags::RISING_EDGE) {
            let r = self.random.get_float();
            self.particle_state = 1.0 - 0.6 * r * r;
            self.delay = 0;
            self.particle_range = 1.0;
        }
        out.fill(0.0);
        if flags.contains(ExciterFlags::GATE) || flags.contains(ExciterFlags::UNPATCHED) {
            let amplitude = pulse_amplitude(self.timbre);
            let mean_interval = 64.0 + 8_192.0 * (1.0 - self.parameter).powi(3);
            for sample in out.iter_mut() {
                if self.delay == 0 {
                    *sample = self.particle_state * self.particle_range * amplitude;
                    // Exponentially distributed gap to the next particle.
                    let u = self.random.get_float().max(1e-6);
                    self.delay = (-u.ln() * mean_interval) as u32;
                    let step = self.random.get_float();
                    if step > 0.5 {
                        self.particle_state *= 1.0 + 0.3 * (step - 0.5);
                    } else {
                        self.particle_state *= 1.0 - 0.6 * (0.5 - step);
                    }
                    self.particle_state = self.particle_state.clamp(0.05, 1.0);
                    self.particle_range *= 0.98;
                } else {
                    self.delay -= 1;
                }
            }
        }
        self.release(flags, out.len());
        self.damping = self.damp_state * (1.0 - self.parameter);
    }

    fn process_flow(&mut self, flags: ExciterFlags, out: &mut [f32]) {
        let scale = self.parameter.powi(4);
        let threshold = 0.0001 + scale * 0.125;
        if flags.contains(ExciterFlags::RISING_EDGE) {
            self.particle_state = 0.5;
        }
        for sample in out.iter_mut() {
            let s = self.random.get_float();
            if s < threshold {
                self.particle_state = -self.particle_state;
            }
            *sample = self.particle_state + (s - 0.5 - self.particle_state) * scale;
        }
    }

    fn process_noise(&mut self, _flags: ExciterFlags, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.random.get_float() - 0.5;
        }
    }

    fn process_granular_sample_player(&mut self, flags: ExciterFlags, out: &mut [f32]) {
        if flags.contains(ExciterFlags::RISING_EDGE) {
            self.grain_phase = 0.0;
            self.damp_state = 0.0;
        }
        let restart_probability = self.parameter * self.parameter * 0.01;
        let rate = semitones_to_ratio((self.timbre - 0.5) * 48.0);
        let size = NOISE_SAMPLE_SIZE as f32;
        let level = 1.0 - self.damp_state;
        for sample in out.iter_mut() {
            if self.random.get_float() < restart_probability {
                self.grain_phase = self.random.get_float() * size;
            }
            self.grain_phase += rate;
            if self.grain_phase >= size {
                self.grain_phase -= size;
            }
            *sample = level * interpolate_wrap(&NOISE_SAMPLE, self.grain_phase / size, size);
        }
        if !(flags.contains(ExciterFlags::GATE) || flags.contains(ExciterFlags::UNPATCHED)) {
            self.damp_state = (self.damp_state + 0.01 * out.len() as f32).min(1.0);
        }
        self.damping = self.damp_state;
    }

    fn process_sample_player(&mut self, flags: ExciterFlags, out: &mut [f32]) {
        if flags.contains(ExciterFlags::RISING_EDGE) {
            self.sample_phase = [0.0; 2];
            self.damp_state = 0.0;
        }
        let (index, fractional) = split(self.parameter * (NUM_SAMPLES as f32 - 1.0001));
        let index = index.min(NUM_SAMPLES - 2);
        let rate = semitones_to_ratio((self.timbre - 0.5) * 24.0);
        let end = SAMPLE_SIZE as f32;
        let level = 1.0 - self.damp_state;

        for sample in out.iter_mut() {
            let mut s = [0.0; 2];
            for (k, phase) in self.sample_phase.iter_mut().enumerate() {
                if *phase < end {
                    let (integral, t) = split(*phase);
                    let table = &SAMPLES[index + k];
                    let a = table[integral];
                    let b = table[integral + 1];
                    s[k] = a + (b - a) * t;
                    *phase += rate;
                }
            }
            *sample = level * (s[0] + (s[1] - s[0]) * fractional);
        }
        self.release(flags, out.len());
        self.damping = self.damp_state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::tables::PULSE_AMPLITUDE;

    #[test]
    fn mallet_strike_is_a_single_pulse() {
        let mut exciter = Exciter::new();
        exciter.set_model(ExciterModel::Mallet);
        exciter.set_timbre(0.99);
        exciter.set_parameter(0.0);
        let mut out = [1.0; 16];
        exciter.render_model(ExciterFlags::RISING_EDGE, &mut out);
        assert_eq!(out[0], PULSE_AMPLITUDE[(0.99f32 * 256.0).floor() as usize]);
        assert!(out[1..].iter().all(|&x| x == 0.0));
        assert_eq!(exciter.damping(), exciter.damp_state);
    }

    #[test]
    fn mallet_damping_follows_release() {
        let mut exciter = Exciter::new();
        exciter.set_parameter(0.0);
        let mut out = [0.0; 16];
        exciter.process(ExciterFlags::RISING_EDGE | ExciterFlags::GATE, &mut out);
        assert_eq!(exciter.damping(), 0.0);
        for _ in 0..100 {
            exciter.process(ExciterFlags::empty(), &mut out);
        }
        assert_eq!(exciter.damping(), 1.0);

        exciter.set_parameter(1.0);
        exciter.process(ExciterFlags::empty(), &mut out);
        assert_eq!(exciter.damping(), 0.0);
    }

    #[test]
    fn plectrum_releases_after_its_delay() {
        let mut exciter = Exciter::new();
        exciter.set_model(ExciterModel::Plectrum);
        exciter.set_parameter(0.0);
        let mut out = [0.0; 16];
        exciter.render_model(ExciterFlags::RISING_EDGE | ExciterFlags::GATE, &mut out);
        assert!(out[0] < 0.0, "pre-pulse pushes the string");
        // 64 samples of hold: the pick lets go in the fourth block.
        let mut released_at = None;
        for block in 1..8 {
            exciter.render_model(ExciterFlags::GATE, &mut out);
            if out.iter().any(|&x| x > 0.0) {
                released_at = Some(block);
                break;
            }
        }
        assert_eq!(released_at, Some(3));
        for _ in 0..50 {
            exciter.render_model(ExciterFlags::GATE, &mut out);
        }
        assert!(exciter.damping() < 0.01);
    }

    #[test]
    fn particles_need_a_gate() {
        let mut exciter = Exciter::new();
        exciter.set_model(ExciterModel::Particles);
        exciter.set_parameter(1.0);
        let mut out = [0.0; 24];
        let mut gated = 0.0;
        exciter.process(ExciterFlags::RISING_EDGE | ExciterFlags::GATE, &mut out);
        for _ in 0..100 {
            exciter.render_model(ExciterFlags::GATE, &mut out);
            gated += out.iter().map(|x| x.abs()).sum::<f32>();
        }
        assert!(gated > 0.0);
        exciter.render_model(ExciterFlags::empty(), &mut out);
        assert!(out.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn every_model_is_bounded() {
        for model in ExciterModel::ALL {
            let mut exciter = Exciter::new();
            exciter.set_model(model);
            exciter.set_timbre(0.7);
            exciter.set_parameter(0.6);
            let mut out = [0.0; 24];
            for n in 0..400 {
                let flags = match n {
                    0 => ExciterFlags::RISING_EDGE | ExciterFlags::GATE,
                    1..=199 => ExciterFlags::GATE,
                    200 => ExciterFlags::FALLING_EDGE,
                    _ => ExciterFlags::empty(),
                };
                exciter.process(flags, &mut out);
                assert!(
                    out.iter().all(|x| x.is_finite() && x.abs() < 50.0),
                    "{} misbehaved",
                    model.name()
                );
                assert!((0.0..=1.0).contains(&exciter.damping()));
            }
        }
    }

    #[test]
    fn model_change_resets_state() {
        let mut exciter = Exciter::new();
        let mut out = [0.0; 16];
        for _ in 0..100 {
            exciter.process(ExciterFlags::empty(), &mut out);
        }
        exciter.set_model(ExciterModel::Plectrum);
        assert_eq!(exciter.damp_state, 0.0);
    }

    #[test]
    fn flags_from_gate() {
        let rising = ExciterFlags::from_gate(false, true);
        assert!(rising.contains(ExciterFlags::RISING_EDGE) && rising.contains(ExciterFlags::GATE));
        let falling = ExciterFlags::from_gate(true, false);
        assert!(falling.contains(ExciterFlags::FALLING_EDGE));
        assert!(!falling.contains(ExciterFlags::GATE));
        assert_eq!(ExciterFlags::from_gate(false, false), ExciterFlags::empty());
    }
}
