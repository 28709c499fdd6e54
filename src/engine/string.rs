//! Three plucked strings, one taking each new trigger.
//!
//! Strings that are no longer the active one keep ringing at the pitch they
//! were plucked at. The pitch they keep is read from a short history rather
//! than the current note, since a sequencer usually moves the pitch CV a
//! little before it sends the trigger.

use crate::config::SampleRate;
use crate::dsp::delay::DelayLine;
use crate::physical::StringVoice;

use super::{Engine, EngineParameters, ScratchBuffers};

const NUM_STRINGS: usize = 3;
/// Blocks between a pitch change and the trigger it belongs to.
const PITCH_LEAD: usize = 14;

pub struct StringEngine {
    sample_rate: SampleRate,
    voices: [StringVoice; NUM_STRINGS],
    f0: [f32; NUM_STRINGS],
    f0_history: DelayLine<16>,
    active_string: usize,
}

impl StringEngine {
    pub fn new(sample_rate: &SampleRate) -> Self {
        Self {
            sample_rate: *sample_rate,
            voices: std::array::from_fn(|i| StringVoice::new(sample_rate, 0x571a + i as u64)),
            f0: [0.01; NUM_STRINGS],
            f0_history: DelayLine::new(),
            active_string: NUM_STRINGS - 1,
        }
    }

    pub fn active_string(&self) -> usize {
        self.active_string
    }
}

impl Engine for StringEngine {
    fn init(&mut self, sample_rate: &SampleRate) {
        self.sample_rate = *sample_rate;
        for voice in self.voices.iter_mut() {
            voice.init(sample_rate);
        }
        self.reset();
    }

    fn reset(&mut self) {
        for voice in self.voices.iter_mut() {
            voice.reset();
        }
        self.f0 = [0.01; NUM_STRINGS];
        self.f0_history.reset();
        self.active_string = NUM_STRINGS - 1;
    }

    fn render(
        &mut self,
        parameters: &EngineParameters,
        scratch: &mut ScratchBuffers,
        out: &mut [f32],
        aux: &mut [f32],
        _already_enveloped: &mut bool,
    ) {
        if parameters.trigger.is_rising_edge() {
            self.f0[self.active_string] = self.f0_history.read(PITCH_LEAD);
            self.active_string = (self.active_string + 1) % NUM_STRINGS;
        }

        let f0 = self.sample_rate.note_to_frequency(parameters.note);
        self.f0[self.active_string] = f0;
        self.f0_history.write(f0);

        out.fill(0.0);
        aux.fill(0.0);
        let sustain = parameters.trigger.is_unpatched();
        let trigger = parameters.trigger.is_rising_edge();
        let (temp, temp_2) = scratch.split(out.len());
        for (i, voice) in self.voices.iter_mut().enumerate() {
            let active = i == self.active_string;
            voice.render(
                sustain && active,
                trigger && active,
                parameters.accent,
                self.f0[i],
                parameters.harmonics,
                parameters.timbre * parameters.timbre,
                parameters.morph,
                temp,
                temp_2,
                out,
                aux,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::TriggerState;
    use super::*;

    fn engine() -> StringEngine {
        let sr = SampleRate::default();
        let mut engine = StringEngine::new(&sr);
        engine.init(&sr);
        engine
    }

    #[test]
    fn triggers_rotate_strings() {
        let mut engine = engine();
        let mut scratch = ScratchBuffers::new();
        let mut out = [0.0; 12];
        let mut aux = [0.0; 12];
        let mut done = false;
        let mut p = parameters(48.0);
        p.trigger = TriggerState::RisingEdge;
        let first = {
            engine.render(&p, &mut scratch, &mut out, &mut aux, &mut done);
            engine.active_string()
        };
        engine.render(&p, &mut scratch, &mut out, &mut aux, &mut done);
        assert_eq!(engine.active_string(), (first + 1) % NUM_STRINGS);
    }

    #[test]
    fn plucked_string_decays() {
        let mut engine = engine();
        let mut p = parameters(48.0);
        p.morph = 0.3;
        let (out, _) = render_blocks(&mut engine, p, true, 2_000);
        assert!(out.iter().all(|x| x.is_finite()));
        assert!(rms(&out[..4_800]) > 1e-3);
        assert!(rms(&out[19_200..]) < rms(&out[..4_800]));
    }

    #[test]
    fn unpatched_trigger_sustains() {
        let mut engine = engine();
        let (out, _) = render_blocks(&mut engine, parameters(48.0), false, 2_000);
        assert!(rms(&out[19_200..]) > 1e-3);
    }
}
