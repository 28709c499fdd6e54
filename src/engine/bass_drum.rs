//! Kick drums: the analog model on `out`, the synthetic one on `aux`.
//!
//! `harmonics` sweeps the analog model through attack FM then self FM,
//! and past the middle also drives it into an overdrive (less so for
//! high-pitched kicks, which would just turn to noise).

use crate::config::SampleRate;
use crate::dsp::distortion::Overdrive;
use crate::drums::{AnalogBassDrum, SyntheticBassDrum};

use super::{Engine, EngineParameters, ScratchBuffers};

#[derive(Debug, Clone)]
pub struct BassDrumEngine {
    sample_rate: SampleRate,
    analog: AnalogBassDrum,
    synthetic: SyntheticBassDrum,
    overdrive: Overdrive,
}

impl BassDrumEngine {
    pub fn new(sample_rate: &SampleRate) -> Self {
        Self {
            sample_rate: *sample_rate,
            analog: AnalogBassDrum::new(sample_rate),
            synthetic: SyntheticBassDrum::new(sample_rate),
            overdrive: Overdrive::new(),
        }
    }
}

impl Engine for BassDrumEngine {
    fn init(&mut self, sample_rate: &SampleRate) {
        self.sample_rate = *sample_rate;
        self.analog.init(sample_rate);
        self.synthetic.init(sample_rate);
        self.overdrive.reset();
    }

    fn reset(&mut self) {
        self.analog.reset();
        self.synthetic.reset();
        self.overdrive.reset();
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
        let harmonics = parameters.harmonics;
        let attack_fm_amount = (harmonics * 4.0).min(1.0);
        let self_fm_amount = (harmonics * 4.0 - 1.0).clamp(0.0, 1.0);
        let drive = (harmonics * 2.0 - 1.0).max(0.0) * (1.0 - 16.0 * f0).max(0.0);
        let sustain = parameters.trigger.is_unpatched();
        let trigger = parameters.trigger.is_rising_edge();

        self.analog.render(
            sustain,
            trigger,
            parameters.accent,
            f0,
            parameters.timbre,
            parameters.morph,
            attack_fm_amount,
            self_fm_amount,
            out,
        );
        self.overdrive.process(0.5 + 0.5 * drive, out);

        let dirtiness = if sustain {
            harmonics
        } else {
            0.4 - 0.25 * parameters.morph * parameters.morph
        };
        self.synthetic.render(
            sustain,
            trigger,
            parameters.accent,
            f0,
            parameters.timbre,
            parameters.morph,
            dirtiness,
            (harmonics * 2.0).min(1.0),
            (harmonics * 2.0 - 1.0).max(0.0),
            aux,
        );
    }
}
