//! Pairs of classic waveforms.
//!
//! `out` mixes a hard-synced square with a variable-notch saw. `aux` is the
//! difference of two detuned variable-shape oscillators, fading into a
//! super-square sync sweep over the last quarter of the detune range.

use crate::config::SampleRate;
use crate::dsp::units::crossfade;
use crate::dsp::ParameterInterpolator;
use crate::oscillator::{SuperSquareOscillator, VariableSawOscillator, VariableShapeOscillator};

use super::{Engine, EngineParameters, ScratchBuffers};

const INTERVALS: [f32; 5] = [0.0, 7.01, 12.01, 19.01, 24.01];

#[inline]
fn squash(x: f32) -> f32 {
    x * x * (3.0 - 2.0 * x)
}

/// Detune in semitones for `harmonics`: a dead zone at the centre, then
/// fifths and octaves either side, with smooth steps between.
fn compute_detuning(detune: f32) -> f32 {
    let detune = (2.05 * detune - 1.025).clamp(-1.0, 1.0);
    let sign = if detune < 0.0 { -1.0 } else { 1.0 };
    let detune = detune * sign * 3.9999;
    let integral = (detune as usize).min(INTERVALS.len() - 2);
    let fractional = detune - integral as f32;
    let a = INTERVALS[integral];
    let b = INTERVALS[integral + 1];
    (a + (b - a) * squash(squash(fractional))) * sign
}

#[derive(Debug, Clone)]
pub struct VirtualAnalogEngine {
    sample_rate: SampleRate,
    primary: VariableShapeOscillator,
    auxiliary: VariableShapeOscillator,
    sync: VariableShapeOscillator,
    variable_saw: VariableSawOscillator,
    super_square: SuperSquareOscillator,

    square_gain: f32,
    saw_gain: f32,
    super_square_amount: f32,
}

impl Default for VirtualAnalogEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualAnalogEngine {
    pub fn new() -> Self {
        Self {
            sample_rate: SampleRate::default(),
            primary: VariableShapeOscillator::new(),
            auxiliary: VariableShapeOscillator::new(),
            sync: VariableShapeOscillator::new(),
            variable_saw: VariableSawOscillator::new(),
            super_square: SuperSquareOscillator::new(),
            square_gain: 0.0,
            saw_gain: 0.0,
            super_square_amount: 0.0,
        }
    }
}

impl Engine for VirtualAnalogEngine {
    fn init(&mut self, sample_rate: &SampleRate) {
        self.sample_rate = *sample_rate;
        self.primary.reset();
        self.auxiliary.reset();
        self.auxiliary.set_master_phase(0.25);
        self.sync.reset();
        self.variable_saw.reset();
        self.super_square.reset();
        self.square_gain = 0.0;
        self.saw_gain = 0.0;
        self.super_square_amount = 0.0;
    }

    fn render(
        &mut self,
        parameters: &EngineParameters,
        scratch: &mut ScratchBuffers,
        out: &mut [f32],
        aux: &mut [f32],
        _already_enveloped: &mut bool,
    ) {
        let size = out.len();
        let sr = self.sample_rate;
        let note = parameters.note;
        let timbre = parameters.timbre;
        let morph = parameters.morph;

        let sync_amount = timbre * timbre;
        let auxiliary_detune = compute_detuning(parameters.harmonics);
        let primary_f = sr.note_to_frequency(note);
        let auxiliary_f = sr.note_to_frequency(note + auxiliary_detune);
        let primary_sync_f = sr.note_to_frequency(note + sync_amount * 48.0);
        let auxiliary_sync_f = sr.note_to_frequency(note + auxiliary_detune + sync_amount * 48.0);

        let shape = (morph * 1.5).clamp(0.0, 1.0);
        let pw = (0.5 + (morph - 0.66) * 1.46).clamp(0.5, 0.995);

        // Detuned pair, difference to aux.
        let (temp_1, temp_2) = scratch.split(size);
        self.primary
            .render::<true>(primary_f, primary_sync_f, pw, shape, temp_1);
        self.auxiliary
            .render::<true>(auxiliary_f, auxiliary_sync_f, pw, shape, aux);
        for (a, p) in aux.iter_mut().zip(temp_1.iter()) {
            *a = (*a - *p) * 0.5;
        }

        self.super_square.render(primary_f, timbre, temp_2);
        let amount = ((parameters.harmonics - 0.75) * 4.0).clamp(0.0, 1.0);
        let mut super_square_amount = ParameterInterpolator::new(&mut self.super_square_amount, amount, size);
        for (a, s) in aux.iter_mut().zip(temp_2.iter()) {
            *a = crossfade(*a, 0.5 * s, super_square_amount.next());
        }

        // Sync square plus variable saw to out.
        let square_pw = (1.3 * timbre - 0.15).clamp(0.005, 0.5);
        let square_sync_ratio = if timbre < 0.5 {
            0.0
        } else {
            (timbre - 0.5) * (timbre - 0.5) * 4.0 * 48.0
        };
        let square_gain = (timbre * 8.0).min(1.0);

        let saw_pw = if morph < 0.5 {
            morph + 0.5
        } else {
            1.0 - (morph - 0.5) * 2.0
        };
        let saw_pw = (saw_pw * 1.1).clamp(0.005, 1.0);
        let saw_shape = (10.0 - 21.0 * morph).clamp(0.0, 1.0);
        let saw_gain = (8.0 * (1.0 - morph)).clamp(0.02, 1.0);

        let square_sync_f = sr.note_to_frequency(note + square_sync_ratio);
        self.sync
            .render::<true>(primary_f, square_sync_f, square_pw, 1.0, temp_1);
        self.variable_saw.render(auxiliary_f, saw_pw, saw_shape, out);

        let norm = 1.0 / square_gain.max(saw_gain);
        let mut square_gain_modulation =
            ParameterInterpolator::new(&mut self.square_gain, square_gain * 0.3 * norm, size);
        let mut saw_gain_modulation = ParameterInterpolator::new(&mut self.saw_gain, saw_gain * 0.5 * norm, size);
        for (o, square) in out.iter_mut().zip(temp_1.iter()) {
            *o = *o * saw_gain_modulation.next() + square_gain_modulation.next() * square;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn detuning_has_a_dead_zone_and_octaves_at_the_ends() {
        assert!(compute_detuning(0.5).abs() < 0.01);
        assert!((compute_detuning(1.0) - 24.01).abs() < 0.05);
        assert!((compute_detuning(0.0) + 24.01).abs() < 0.05);
    }

    #[test]
    fn renders_bounded_audio() {
        let mut engine = VirtualAnalogEngine::new();
        engine.init(&SampleRate::default());
        let (out, aux) = render_blocks(&mut engine, parameters(60.0), false, 100);
        assert!(out.iter().chain(aux.iter()).all(|x| x.is_finite() && x.abs() < 2.0));
        assert!(rms(&out) > 0.05);
        assert!(rms(&aux) > 0.01);
    }
}
