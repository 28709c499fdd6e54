//! Dust through resonant band-passes, optionally smeared by a diffuser.
//!
//! Six particle generators share one density (`timbre`) and scatter their
//! filter frequencies over a `harmonics`-wide interval. Above the middle of
//! `morph` the filters grow resonant; below it they stay wide and the
//! output goes through an all-pass diffuser instead. `aux` is the raw dust,
//! low-passed at the note frequency.

use crate::config::SampleRate;
use crate::dsp::filter::{FilterMode, FrequencyApproximation, Svf};
use crate::dsp::units::semitones_to_ratio;
use crate::fx::Diffuser;
use crate::noise::Particle;

use super::{Engine, EngineParameters, ScratchBuffers};

const NUM_PARTICLES: usize = 6;

pub struct ParticleEngine {
    sample_rate: SampleRate,
    particles: [Particle; NUM_PARTICLES],
    diffuser: Diffuser,
    post_filter: Svf,
}

impl ParticleEngine {
    pub fn new(sample_rate: &SampleRate) -> Self {
        Self {
            sample_rate: *sample_rate,
            particles: std::array::from_fn(|i| Particle::new(0x9a47 + i as u64)),
            diffuser: Diffuser::new(sample_rate),
            post_filter: Svf::new(),
        }
    }
}

impl Engine for ParticleEngine {
    fn init(&mut self, sample_rate: &SampleRate) {
        self.sample_rate = *sample_rate;
        self.diffuser.init(sample_rate);
        self.reset();
    }

    fn reset(&mut self) {
        for particle in self.particles.iter_mut() {
            particle.reset();
        }
        self.diffuser.clear();
        self.post_filter.reset();
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
        let density_sqrt = sr.note_to_frequency(60.0 + parameters.timbre * parameters.timbre * 72.0);
        let density = density_sqrt * density_sqrt * (1.0 / NUM_PARTICLES as f32);
        let gain = 1.0 / density;
        let q_sqrt = semitones_to_ratio(if parameters.morph >= 0.5 {
            (parameters.morph - 0.5) * 144.0
        } else {
            0.0
        });
        let q = 0.5 + q_sqrt * q_sqrt;
        let spread = 48.0 * parameters.harmonics * parameters.harmonics;
        let raw_diffusion_sqrt = 2.0 * (parameters.morph - 0.5).abs();
        let raw_diffusion = raw_diffusion_sqrt * raw_diffusion_sqrt;
        let diffusion = if parameters.morph < 0.5 { raw_diffusion } else { 0.0 };
        let sync = parameters.trigger.is_rising_edge();

        out.fill(0.0);
        aux.fill(0.0);
        for particle in self.particles.iter_mut() {
            particle.render(sync, density, gain, f0, spread, q, out, aux);
        }

        self.post_filter
            .set_f_q(f0.min(0.49), 0.5, FrequencyApproximation::Dirty);
        self.post_filter.process_buffer(aux, FilterMode::LowPass);
        self.diffuser
            .process(0.8 * diffusion * diffusion, 0.5 * diffusion + 0.25, out);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn trigger_fires_every_particle() {
        let sr = SampleRate::default();
        let mut engine = ParticleEngine::new(&sr);
        engine.init(&sr);
        let mut p = parameters(60.0);
        p.timbre = 0.0;
        let (out, aux) = render_blocks(&mut engine, p, true, 100);
        assert!(rms(&out[..240]) > rms(&out[960..]));
        assert!(aux.iter().any(|&x| x != 0.0));
    }

    #[test]
    fn diffused_and_resonant_settings_are_finite() {
        let sr = SampleRate::default();
        for morph in [0.0, 1.0] {
            let mut engine = ParticleEngine::new(&sr);
            engine.init(&sr);
            let mut p = parameters(60.0);
            p.morph = morph;
            p.timbre = 0.7;
            let (out, aux) = render_blocks(&mut engine, p, false, 400);
            assert!(out.iter().chain(aux.iter()).all(|x| x.is_finite()));
        }
    }
}
