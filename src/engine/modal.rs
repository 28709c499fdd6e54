//! A struck modal resonator.
//!
//! `harmonics` is smoothed before it reaches the resonator: it moves every
//! partial at once, and stepping it audibly zippers the ringing modes.

use crate::config::SampleRate;
use crate::dsp::units::one_pole;
use crate::physical::ModalVoice;

use super::{Engine, EngineParameters, ScratchBuffers};

#[derive(Debug, Clone)]
pub struct ModalEngine {
    sample_rate: SampleRate,
    voice: ModalVoice,
    harmonics_lp: f32,
}

impl Default for ModalEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ModalEngine {
    pub fn new() -> Self {
        Self {
            sample_rate: SampleRate::default(),
            voice: ModalVoice::new(),
            harmonics_lp: 0.0,
        }
    }
}

impl Engine for ModalEngine {
    fn init(&mut self, sample_rate: &SampleRate) {
        self.sample_rate = *sample_rate;
        self.reset();
    }

    fn reset(&mut self) {
        self.voice.reset();
        self.harmonics_lp = 0.0;
    }

    fn render(
        &mut self,
        parameters: &EngineParameters,
        scratch: &mut ScratchBuffers,
        out: &mut [f32],
        aux: &mut [f32],
        _already_enveloped: &mut bool,
    ) {
        out.fill(0.0);
        aux.fill(0.0);
        one_pole(&mut self.harmonics_lp, parameters.harmonics, 0.01);

        let (temp, temp_2) = scratch.split(out.len());
        self.voice.render(
            parameters.trigger.is_unpatched(),
            parameters.trigger.is_rising_edge(),
            parameters.accent,
            self.sample_rate.note_to_frequency(parameters.note),
            self.harmonics_lp,
            parameters.timbre,
            parameters.morph,
            temp,
            temp_2,
            out,
            aux,
        );
    }
}
