//! Snare drums: the analog model on `out`, the synthetic one on `aux`.

use crate::config::SampleRate;
use crate::drums::{AnalogSnareDrum, SyntheticSnareDrum};

use super::{Engine, EngineParameters, ScratchBuffers};

#[derive(Debug, Clone)]
pub struct SnareDrumEngine {
    analog: AnalogSnareDrum,
    synthetic: SyntheticSnareDrum,
    sample_rate: SampleRate,
}

impl SnareDrumEngine {
    pub fn new(sample_rate: &SampleRate) -> Self {
        Self {
            analog: AnalogSnareDrum::new(sample_rate),
            synthetic: SyntheticSnareDrum::new(sample_rate),
            sample_rate: *sample_rate,
        }
    }
}

impl Engine for SnareDrumEngine {
    fn init(&mut self, sample_rate: &SampleRate) {
        self.sample_rate = *sample_rate;
        self.analog.init(sample_rate);
        self.synthetic.init(sample_rate);
    }

    fn reset(&mut self) {
        self.analog.reset();
        self.synthetic.reset();
    }

    fn render(
        &mut self,
        parameters: &EngineParameters,
        _scratch: &mut ScratchBuffers,
        out: &mut [f32],
        aux: &mut [f32],
        _already_enveloped: &mut bool,
    ) {
        let f0 = self.sample_rate.note_to_frequency(parameters.note);
        let sustain = parameters.trigger.is_unpatched();
        let trigger = parameters.trigger.is_rising_edge();

        self.analog.render(
            sustain,
            trigger,
            parameters.accent,
            f0,
            parameters.timbre,
            parameters.morph,
            parameters.harmonics,
            out,
        );
        self.synthetic.render(
            sustain,
            trigger,
            parameters.accent,
            f0,
            parameters.timbre,
            parameters.morph,
            parameters.harmonics,
            aux,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn hit_decays() {
        let sr = SampleRate::default();
        let mut engine = SnareDrumEngine::new(&sr);
        engine.init(&sr);
        let mut p = parameters(60.0);
        p.morph = 0.2;
        let (out, aux) = render_blocks(&mut engine, p, true, 2_000);
        assert!(out.iter().chain(aux.iter()).all(|x| x.is_finite()));
        for signal in [&out, &aux] {
            let head = rms(&signal[..2_400]);
            assert!(head > 1e-3);
            assert!(rms(&signal[21_600..]) < head * 0.5);
        }
    }
}
