//! Granular formant oscillator.
//!
//! Two grainlet oscillators share a carrier and sit on formants an interval
//! apart (`harmonics`, -2..+2 octaves). Near the centre of that control the
//! raw grain window bleeds through, keeping the carrier pitch solid. `aux`
//! is a Z-shaped formant oscillator swept by the same controls.

use crate::config::SampleRate;
use crate::dsp::filter::{FrequencyApproximation, OnePole};
use crate::dsp::units::semitones_to_ratio;
use crate::oscillator::{GrainletOscillator, ZOscillator};

use super::{Engine, EngineParameters, ScratchBuffers};

#[derive(Debug, Clone)]
pub struct GrainEngine {
    sample_rate: SampleRate,
    grainlet: [GrainletOscillator; 2],
    z_oscillator: ZOscillator,
    dc_blocker: OnePole,
}

impl Default for GrainEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl GrainEngine {
    pub fn new() -> Self {
        Self {
            sample_rate: SampleRate::default(),
            grainlet: [GrainletOscillator::new(); 2],
            z_oscillator: ZOscillator::new(),
            dc_blocker: OnePole::new(),
        }
    }
}

impl Engine for GrainEngine {
    fn init(&mut self, sample_rate: &SampleRate) {
        self.sample_rate = *sample_rate;
        self.reset();
    }

    fn reset(&mut self) {
        for grainlet in self.grainlet.iter_mut() {
            grainlet.reset();
        }
        self.z_oscillator.reset();
        self.dc_blocker.reset();
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
        let root = parameters.note;
        let f0 = sr.note_to_frequency(root);

        let f1 = sr.note_to_frequency(24.0 + 84.0 * parameters.timbre);
        let ratio = semitones_to_ratio(-24.0 + 48.0 * parameters.harmonics);
        let distance_to_centre = (parameters.harmonics - 0.5).abs();
        let carrier_bleed = if distance_to_centre < 0.05 {
            1.0 - distance_to_centre * 20.0
        } else {
            0.0
        };
        let carrier_bleed = carrier_bleed * (2.0 - carrier_bleed);
        let carrier_shape = 0.33 + (parameters.morph - 0.33) * (1.0 - f0 * 24.0).max(0.0);

        let (temp_1, temp_2) = scratch.split(size);
        self.grainlet[0].render(f0, f1, carrier_shape, carrier_bleed, temp_1);
        self.grainlet[1].render(f0, f1 * ratio, carrier_shape, carrier_bleed, temp_2);

        self.dc_blocker.set_f(0.3 * f0, FrequencyApproximation::Fast);
        for ((o, a), b) in out.iter_mut().zip(temp_1.iter()).zip(temp_2.iter()) {
            *o = self.dc_blocker.highpass(a + b);
        }

        let cutoff = sr.note_to_frequency(root + 96.0 * parameters.timbre);
        self.z_oscillator
            .render(f0, cutoff, parameters.morph, parameters.harmonics, aux);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn output_has_no_dc() {
        let mut engine = GrainEngine::new();
        engine.init(&SampleRate::default());
        let (out, aux) = render_blocks(&mut engine, parameters(48.0), false, 800);
        let tail = &out[4_800..];
        let mean = tail.iter().sum::<f32>() / tail.len() as f32;
        assert!(mean.abs() < 0.05, "dc offset {}", mean);
        assert!(rms(tail) > 0.01);
        assert!(aux.iter().all(|x| x.is_finite()));
    }
}
