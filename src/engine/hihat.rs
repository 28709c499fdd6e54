//! Hi-hats.
//!
//! `out` is six square oscillators through a resonant high-pass and the
//! swing VCA; `aux` ring-modulates them in pairs, through a linear VCA and
//! a two-stage envelope for a rounder, more open sound.

use crate::config::SampleRate;
use crate::drums::{HiHat, MetallicNoise, VcaType};

use super::{Engine, EngineParameters, ScratchBuffers};

#[derive(Debug, Clone)]
pub struct HiHatEngine {
    sample_rate: SampleRate,
    closed: HiHat,
    open: HiHat,
}

impl HiHatEngine {
    pub fn new(sample_rate: &SampleRate) -> Self {
        Self {
            sample_rate: *sample_rate,
            closed: HiHat::new(sample_rate),
            open: HiHat::new(sample_rate),
        }
    }
}

impl Engine for HiHatEngine {
    fn init(&mut self, sample_rate: &SampleRate) {
        self.sample_rate = *sample_rate;
        self.closed.init(sample_rate);
        self.open.init(sample_rate);
    }

    fn reset(&mut self) {
        self.closed.reset();
        self.open.reset();
    }

    fn render(
        &mut self,
        parameters: &EngineParameters,
        scratch: &mut ScratchBuffers,
        out: &mut [f32],
        aux: &mut [f32],
        _already_enveloped: &mut bool,
    ) {
        let f0 = self.sample_rate.note_to_frequency(parameters.note);
        let sustain = parameters.trigger.is_unpatched();
        let trigger = parameters.trigger.is_rising_edge();
        let temp = scratch.first(out.len());

        self.closed.render(
            sustain,
            trigger,
            parameters.accent,
            f0,
            parameters.timbre,
            parameters.morph,
            parameters.harmonics,
            MetallicNoise::Square,
            VcaType::Swing,
            true,
            false,
            temp,
            out,
        );
        self.open.render(
            sustain,
            trigger,
            parameters.accent,
            f0,
            parameters.timbre,
            parameters.morph,
            parameters.harmonics,
            MetallicNoise::RingMod,
            VcaType::Linear,
            false,
            true,
            temp,
            aux,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn both_hats_ring_and_decay() {
        let sr = SampleRate::default();
        let mut engine = HiHatEngine::new(&sr);
        engine.init(&sr);
        let mut p = parameters(60.0);
        p.morph = 0.2;
        let (out, aux) = render_blocks(&mut engine, p, true, 2_000);
        assert!(out.iter().chain(aux.iter()).all(|x| x.is_finite()));
        for signal in [&out, &aux] {
            let head = rms(&signal[..2_400]);
            assert!(head > 1e-4);
            assert!(rms(&signal[21_600..]) < head * 0.5);
        }
    }

    #[test]
    fn closed_and_open_hats_differ() {
        let sr = SampleRate::default();
        let mut engine = HiHatEngine::new(&sr);
        engine.init(&sr);
        let (out, aux) = render_blocks(&mut engine, parameters(60.0), true, 200);
        assert!(out.iter().zip(aux.iter()).any(|(a, b)| (a - b).abs() > 1e-3));
    }
}
