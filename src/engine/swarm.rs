//! Eight drifting saws (and sines, on `aux`).
//!
//! Every voice owns a grain envelope that keeps picking new random pitch
//! targets. `timbre` sets how often, `harmonics` how far voices spread from
//! the root and `morph` the grain size: short grains glide between targets,
//! long ones hold a pitch under a window. With a trigger patched, each hit
//! starts a burst that settles back to the root.

use crate::config::SampleRate;
use crate::dsp::envelope::GrainEnvelope;
use crate::dsp::oscillator::FastSineOscillator;
use crate::dsp::random::Random;
use crate::dsp::units::semitones_to_ratio;
use crate::oscillator::AdditiveSawOscillator;

use super::{Engine, EngineParameters, ScratchBuffers};

const NUM_SWARM_VOICES: usize = 8;

#[derive(Debug, Clone, Copy)]
struct SwarmVoice {
    /// Position in the swarm, -1..1; outer voices spread furthest.
    rank: f32,
    envelope: GrainEnvelope,
    saw: AdditiveSawOscillator,
    sine: FastSineOscillator,
}

impl SwarmVoice {
    fn new(rank: f32) -> Self {
        Self {
            rank,
            envelope: GrainEnvelope::new(),
            saw: AdditiveSawOscillator::new(),
            sine: FastSineOscillator::new(),
        }
    }

    fn reset(&mut self) {
        self.envelope.reset();
        self.saw.reset();
        self.sine.reset();
    }

    #[allow(clippy::too_many_arguments)]
    fn render(
        &mut self,
        f0: f32,
        density: f32,
        burst_mode: bool,
        start_burst: bool,
        spread: f32,
        size_ratio: f32,
        random: &mut Random,
        out: &mut [f32],
        aux: &mut [f32],
    ) {
        self.envelope.step(density, burst_mode, start_burst, random);
        let scale = 1.0 / NUM_SWARM_VOICES as f32;
        let amplitude = self.envelope.amplitude(size_ratio) * scale;
        let expo_amount = self.envelope.frequency(size_ratio);
        let f0 = f0 * semitones_to_ratio(48.0 * expo_amount * spread * self.rank);
        let linear_amount = self.rank * (self.rank + 0.01) * spread * 0.25;
        let f0 = f0 * (1.0 + linear_amount);

        self.saw.render(f0, amplitude, out);
        self.sine.render_add(f0, amplitude, aux);
    }
}

#[derive(Debug, Clone)]
pub struct SwarmEngine {
    sample_rate: SampleRate,
    voices: [SwarmVoice; NUM_SWARM_VOICES],
    random: Random,
}

impl Default for SwarmEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SwarmEngine {
    pub fn new() -> Self {
        let centre = (NUM_SWARM_VOICES - 1) as f32 * 0.5;
        Self {
            sample_rate: SampleRate::default(),
            voices: std::array::from_fn(|i| SwarmVoice::new((i as f32 - centre) / centre)),
            random: Random::new_with_seed(0x5a4a),
        }
    }
}

impl Engine for SwarmEngine {
    fn init(&mut self, sample_rate: &SampleRate) {
        self.sample_rate = *sample_rate;
        self.reset();
    }

    fn reset(&mut self) {
        for voice in self.voices.iter_mut() {
            voice.reset();
        }
    }

    fn render(
        &mut self,
        parameters: &EngineParameters,
        _scratch: &mut ScratchBuffers,
        out: &mut [f32],
        aux: &mut [f32],
        _already_enveloped: &mut bool,
    ) {
        let sr = self.sample_rate;
        let f0 = sr.note_to_frequency(parameters.note);
        let control_rate = out.len() as f32;
        let density = sr.note_to_frequency(parameters.timbre * 120.0) * 0.025 * control_rate;
        let spread = parameters.harmonics * parameters.harmonics * parameters.harmonics;
        let mut size_ratio = 0.25 * semitones_to_ratio((1.0 - parameters.morph) * 84.0);

        let burst_mode = !parameters.trigger.is_unpatched();
        let start_burst = parameters.trigger.is_rising_edge();

        out.fill(0.0);
        aux.fill(0.0);
        for voice in self.voices.iter_mut() {
            voice.render(
                f0,
                density,
                burst_mode,
                start_burst,
                spread,
                size_ratio,
                &mut self.random,
                out,
                aux,
            );
            size_ratio *= 0.97;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn ranks_span_the_swarm() {
        let engine = SwarmEngine::new();
        assert_eq!(engine.voices[0].rank, -1.0);
        assert_eq!(engine.voices[NUM_SWARM_VOICES - 1].rank, 1.0);
    }

    #[test]
    fn swarm_is_bounded_by_its_voice_count() {
        let mut engine = SwarmEngine::new();
        engine.init(&SampleRate::default());
        let mut p = parameters(48.0);
        p.harmonics = 1.0;
        p.timbre = 0.8;
        let (out, aux) = render_blocks(&mut engine, p, false, 400);
        assert!(out.iter().chain(aux.iter()).all(|x| x.abs() <= 1.1));
        assert!(rms(&out) > 0.05);
        assert!(rms(&aux) > 0.05);
    }
}
