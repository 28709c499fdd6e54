//! The macro-oscillator voice: engine selection, modulation and gating.
//!
//! Per block the voice:
//!
//! 1. delays the trigger input by a few blocks and detects its rising edge,
//! 2. picks the engine from the knob plus the engine CV (sampled on each
//!    trigger when one is patched), with hysteresis,
//! 3. on a change of engine resets the newcomer and fades the outgoing one
//!    out over a few milliseconds,
//! 4. runs the internal decay envelope and applies the patched/unpatched
//!    modulation policy to note, timbre and morph,
//! 5. renders the engine and post-processes both outputs through a limiter
//!    or gain and the low-pass gate.

use log::info;

use crate::config::{ConfigError, SampleRate, VoiceConfig};
use crate::dsp::delay::DelayLine;
use crate::dsp::envelope::{DecayEnvelope, LpgEnvelope};
use crate::dsp::hysteresis::HysteresisQuantizer;
use crate::dsp::mix::crossfade_in_place;
use crate::dsp::modulate::{apply_modulations, ModulationInput};
use crate::dsp::tables;
use crate::dsp::units::semitones_to_ratio;
use crate::engine::{
    create_engines, engine_info, speech, Engine, EngineParameters, ScratchBuffers, TriggerState,
    NUM_ENGINES, SPEECH_ENGINE,
};
use crate::patch::{Modulations, Patch};
use crate::synth::post_processor::{ChannelPostProcessor, GateSettings};
use crate::MAX_BLOCK_SIZE;

/// Blocks between the trigger input and the voice reacting to it, so that
/// a pitch CV lagging the gate is already in place.
const TRIGGER_DELAY: usize = 5;
const TRIGGER_HIGH_THRESHOLD: f32 = 0.3;
const TRIGGER_LOW_THRESHOLD: f32 = 0.1;
const ENGINE_HYSTERESIS: f32 = 0.25;
const CROSSFADE_SECONDS: f32 = 0.004;

/// What happened during one [`Voice::render`] call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VoiceOutput {
    /// Engine that rendered the last block.
    pub engine: usize,
    /// A rising edge was detected in at least one block.
    pub trigger_fired: bool,
    /// Internal decay envelope at the end of the call.
    pub envelope: f32,
}

/// The outgoing engine and its own post-processing while it fades out.
#[derive(Debug, Clone, Copy)]
struct Crossfade {
    engine: usize,
    position: usize,
    out_post_processor: ChannelPostProcessor,
    aux_post_processor: ChannelPostProcessor,
}

pub struct Voice {
    config: VoiceConfig,
    sample_rate: SampleRate,
    engines: Vec<Box<dyn Engine>>,
    scratch: ScratchBuffers,

    engine_quantizer: HysteresisQuantizer,
    active_engine: Option<usize>,
    engine_cv: f32,
    crossfade: Option<Crossfade>,
    crossfade_length: usize,
    fade_out: [f32; MAX_BLOCK_SIZE],
    fade_aux: [f32; MAX_BLOCK_SIZE],

    out_post_processor: ChannelPostProcessor,
    aux_post_processor: ChannelPostProcessor,
    decay_envelope: DecayEnvelope,
    lpg_envelope: LpgEnvelope,

    trigger_delay: DelayLine<8>,
    trigger_state: bool,
    previous_note: f32,
}

impl Voice {
    pub fn new(config: VoiceConfig) -> Result<Self, ConfigError> {
        let sample_rate = config.validate()?;
        tables::warm_up();
        let voice = Self {
            config,
            sample_rate,
            engines: create_engines(&sample_rate),
            scratch: ScratchBuffers::new(),
            engine_quantizer: HysteresisQuantizer::new(NUM_ENGINES, ENGINE_HYSTERESIS, false),
            active_engine: None,
            engine_cv: 0.0,
            crossfade: None,
            crossfade_length: crossfade_length(&sample_rate),
            fade_out: [0.0; MAX_BLOCK_SIZE],
            fade_aux: [0.0; MAX_BLOCK_SIZE],
            out_post_processor: ChannelPostProcessor::new(),
            aux_post_processor: ChannelPostProcessor::new(),
            decay_envelope: DecayEnvelope::new(),
            lpg_envelope: LpgEnvelope::new(),
            trigger_delay: DelayLine::new(),
            trigger_state: false,
            previous_note: 0.0,
        };
        info!(
            "voice ready: {} Hz, {}-sample blocks, {} engines",
            sample_rate.sample_rate_hz,
            config.block_size,
            voice.engines.len()
        );
        Ok(voice)
    }

    /// Re-derives every rate-dependent constant. State is cleared.
    pub fn set_sample_rate(&mut self, sample_rate_hz: f32) -> Result<(), ConfigError> {
        let config = VoiceConfig::new(sample_rate_hz, self.config.block_size);
        let sample_rate = config.validate()?;
        self.config = config;
        self.sample_rate = sample_rate;
        for engine in self.engines.iter_mut() {
            engine.init(&sample_rate);
        }
        self.crossfade_length = crossfade_length(&sample_rate);
        self.crossfade = None;
        self.active_engine = None;
        self.out_post_processor.reset();
        self.aux_post_processor.reset();
        self.lpg_envelope.reset();
        self.decay_envelope.reset();
        self.trigger_delay.reset();
        self.trigger_state = false;
        info!("voice sample rate changed to {} Hz", sample_rate_hz);
        Ok(())
    }

    pub fn config(&self) -> &VoiceConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> &SampleRate {
        &self.sample_rate
    }

    /// Engine selected by the last rendered block.
    pub fn engine_index(&self) -> usize {
        self.active_engine.unwrap_or(0)
    }

    pub fn engine_name(&self) -> &'static str {
        engine_info(self.engine_index()).name
    }

    /// Renders `out` and `aux`, which may be any length; only the common
    /// prefix of the two is written.
    pub fn render(
        &mut self,
        patch: &Patch,
        modulations: &Modulations,
        out: &mut [f32],
        aux: &mut [f32],
    ) -> VoiceOutput {
        let patch = &patch.sanitized();
        let modulations = &modulations.sanitized();
        let size = out.len().min(aux.len());
        let block_size = self.config.block_size;
        let mut trigger_fired = false;
        for (out, aux) in out[..size]
            .chunks_mut(block_size)
            .zip(aux[..size].chunks_mut(block_size))
        {
            trigger_fired |= self.render_block(patch, modulations, out, aux);
        }
        VoiceOutput {
            engine: self.engine_index(),
            trigger_fired,
            envelope: self.decay_envelope.value(),
        }
    }

    /// Returns whether the trigger rose during this block.
    fn render_block(
        &mut self,
        patch: &Patch,
        modulations: &Modulations,
        out: &mut [f32],
        aux: &mut [f32],
    ) -> bool {
        let size = out.len();
        let sr = self.sample_rate;

        self.trigger_delay.write(modulations.trigger);
        let trigger_value = self.trigger_delay.read(TRIGGER_DELAY);
        let previous_trigger_state = self.trigger_state;
        if !previous_trigger_state {
            if trigger_value > TRIGGER_HIGH_THRESHOLD {
                self.trigger_state = true;
                if !modulations.level_patched {
                    self.lpg_envelope.trigger();
                }
                self.decay_envelope.trigger();
                self.engine_cv = modulations.engine;
            }
        } else if trigger_value < TRIGGER_LOW_THRESHOLD {
            self.trigger_state = false;
        }
        if !modulations.trigger_patched {
            self.engine_cv = modulations.engine;
        }
        let rising_edge = self.trigger_state && !previous_trigger_state;

        let base = patch.engine.min(NUM_ENGINES - 1) as i32;
        let engine_index = self.engine_quantizer.process_with_base(base, self.engine_cv);
        self.select_engine(engine_index);

        let note = (modulations.note + self.previous_note) * 0.5;
        self.previous_note = modulations.note;

        let trigger = if !modulations.trigger_patched {
            TriggerState::Unpatched
        } else if rising_edge {
            TriggerState::RisingEdge
        } else if self.trigger_state {
            TriggerState::High
        } else {
            TriggerState::Low
        };

        let block_duration = size as f32 * sr.inv_sample_rate;
        let short_decay = 200.0 * block_duration * semitones_to_ratio(-96.0 * patch.decay);
        self.decay_envelope.process(short_decay * 2.0);

        let compressed_level = (1.3 * modulations.level / (0.3 + modulations.level.abs())).max(0.0);
        let accent = if modulations.level_patched {
            compressed_level
        } else {
            0.8
        };

        let use_internal_envelope = modulations.trigger_patched;
        let harmonics = (patch.harmonics + modulations.harmonics).clamp(0.0, 1.0);
        let internal_envelope_amplitude = if engine_index == SPEECH_ENGINE {
            1.0 - speech::syllable_amount(harmonics)
        } else {
            1.0
        };
        let envelope = self.decay_envelope.value();

        let parameters = EngineParameters {
            trigger,
            note: apply_modulations(
                patch.note + note,
                ModulationInput {
                    amount: patch.frequency_modulation_amount,
                    patched: modulations.frequency_patched,
                    external: modulations.frequency,
                    envelope: internal_envelope_amplitude * envelope * envelope * 48.0,
                    use_envelope: use_internal_envelope,
                    default: 1.0,
                },
                -119.0,
                120.0,
            ),
            timbre: apply_modulations(
                patch.timbre,
                ModulationInput {
                    amount: patch.timbre_modulation_amount,
                    patched: modulations.timbre_patched,
                    external: modulations.timbre,
                    envelope,
                    use_envelope: use_internal_envelope,
                    default: 0.0,
                },
                0.0,
                1.0,
            ),
            morph: apply_modulations(
                patch.morph,
                ModulationInput {
                    amount: patch.morph_modulation_amount,
                    patched: modulations.morph_patched,
                    external: modulations.morph,
                    envelope: internal_envelope_amplitude * envelope,
                    use_envelope: use_internal_envelope,
                    default: 0.0,
                },
                0.0,
                1.0,
            ),
            harmonics,
            accent,
        };

        let gated = modulations.level_patched || modulations.trigger_patched;
        if gated {
            let hf = patch.lpg_colour;
            let decay_tail = 20.0 * block_duration * semitones_to_ratio(-72.0 * patch.decay + 12.0 * hf)
                - short_decay;
            if modulations.level_patched {
                self.lpg_envelope
                    .process_lp(compressed_level, short_decay, decay_tail, hf);
            } else {
                let attack = sr.note_to_frequency(parameters.note) * size as f32 * 2.0;
                self.lpg_envelope
                    .process_ping(attack, short_decay, decay_tail, hf);
            }
        }
        let gate = GateSettings {
            gain: self.lpg_envelope.gain(),
            frequency: self.lpg_envelope.frequency(),
            hf_bleed: self.lpg_envelope.hf_bleed(),
        };

        let settings = engine_info(engine_index).post_processing;
        let mut already_enveloped = settings.already_enveloped;
        self.engines[engine_index].render(&parameters, &mut self.scratch, out, aux, &mut already_enveloped);
        let gate_for = |enveloped: bool| if enveloped || !gated { None } else { Some(gate) };
        self.out_post_processor
            .process(settings.out_gain, gate_for(already_enveloped), out);
        self.aux_post_processor
            .process(settings.aux_gain, gate_for(already_enveloped), aux);

        if let Some(mut crossfade) = self.crossfade.take() {
            let settings = engine_info(crossfade.engine).post_processing;
            let mut already_enveloped = settings.already_enveloped;
            let fade_out = &mut self.fade_out[..size];
            let fade_aux = &mut self.fade_aux[..size];
            self.engines[crossfade.engine].render(
                &parameters,
                &mut self.scratch,
                fade_out,
                fade_aux,
                &mut already_enveloped,
            );
            crossfade
                .out_post_processor
                .process(settings.out_gain, gate_for(already_enveloped), fade_out);
            crossfade
                .aux_post_processor
                .process(settings.aux_gain, gate_for(already_enveloped), fade_aux);

            let length = self.crossfade_length as f32;
            let start = 1.0 - crossfade.position as f32 / length;
            crossfade.position += size;
            let end = 1.0 - (crossfade.position as f32 / length).min(1.0);
            crossfade_in_place(out, fade_out, start, end);
            crossfade_in_place(aux, fade_aux, start, end);

            if crossfade.position < self.crossfade_length {
                self.crossfade = Some(crossfade);
            }
        }

        rising_edge
    }

    fn select_engine(&mut self, engine_index: usize) {
        if self.active_engine == Some(engine_index) {
            return;
        }
        self.engines[engine_index].reset();
        let out_post_processor = std::mem::take(&mut self.out_post_processor);
        let aux_post_processor = std::mem::take(&mut self.aux_post_processor);
        self.crossfade = self.active_engine.map(|engine| Crossfade {
            engine,
            position: 0,
            out_post_processor,
            aux_post_processor,
        });
        self.active_engine = Some(engine_index);
    }
}

fn crossfade_length(sample_rate: &SampleRate) -> usize {
    (sample_rate.samples(CROSSFADE_SECONDS) as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice() -> Voice {
        Voice::new(VoiceConfig::default()).expect("default config")
    }

    fn render(voice: &mut Voice, patch: &Patch, modulations: &Modulations, samples: usize) -> (Vec<f32>, VoiceOutput) {
        let mut out = vec![0.0; samples];
        let mut aux = vec![0.0; samples];
        let output = voice.render(patch, modulations, &mut out, &mut aux);
        (out, output)
    }

    #[test]
    fn rejects_invalid_config() {
        assert!(Voice::new(VoiceConfig::new(48_000.0, 0)).is_err());
        assert!(Voice::new(VoiceConfig::new(f32::NAN, 12)).is_err());
    }

    #[test]
    fn first_engine_is_stable() {
        let mut voice = voice();
        let patch = Patch::default();
        let modulations = Modulations::default();
        for _ in 0..50 {
            let (_, output) = render(&mut voice, &patch, &modulations, 12);
            assert_eq!(output.engine, 0);
        }
    }

    #[test]
    fn engine_cv_near_a_step_does_not_chatter() {
        let patch = Patch::default();
        for k in 0..NUM_ENGINES - 1 {
            let mut voice = voice();
            let mut modulations = Modulations::default();
            modulations.engine = k as f32 / NUM_ENGINES as f32;
            let (_, settled) = render(&mut voice, &patch, &modulations, 24);
            assert_eq!(settled.engine, k);

            // Boundary between engine k and k + 1, wobbled by 0.2 of a step.
            let boundary = (k as f32 + 0.5) / NUM_ENGINES as f32;
            let wobble = 0.2 / NUM_ENGINES as f32;
            let mut changes = 0;
            let mut previous = settled.engine;
            for i in 0..100 {
                modulations.engine = if i % 2 == 0 { boundary + wobble } else { boundary - wobble };
                let (_, output) = render(&mut voice, &patch, &modulations, 12);
                if output.engine != previous {
                    changes += 1;
                }
                previous = output.engine;
            }
            assert_eq!(changes, 0, "{} engine changes around boundary {}", changes, k);

            modulations.engine = (k + 1) as f32 / NUM_ENGINES as f32;
            let (_, stepped) = render(&mut voice, &patch, &modulations, 12);
            assert_eq!(stepped.engine, k + 1);
        }
    }

    #[test]
    fn rising_edge_fires_once_per_gate() {
        let mut voice = voice();
        let patch = Patch::default();
        let mut fired = 0;
        for _ in 0..20 {
            fired += render(&mut voice, &patch, &Modulations::gated(true), 12).1.trigger_fired as usize;
        }
        assert_eq!(fired, 1);

        let mut hovering = Modulations::gated(true);
        hovering.trigger = 0.2;
        for _ in 0..20 {
            fired += render(&mut voice, &patch, &hovering, 12).1.trigger_fired as usize;
        }
        assert_eq!(fired, 1, "between thresholds the gate stays high");

        for _ in 0..20 {
            render(&mut voice, &patch, &Modulations::gated(false), 12);
        }
        for _ in 0..20 {
            fired += render(&mut voice, &patch, &Modulations::gated(true), 12).1.trigger_fired as usize;
        }
        assert_eq!(fired, 2);
    }

    #[test]
    fn unpatched_voice_drones() {
        let mut voice = voice();
        let (out, _) = render(&mut voice, &Patch::default(), &Modulations::default(), 4_800);
        let tail = &out[2_400..];
        assert!(tail.iter().map(|x| x * x).sum::<f32>() > 1.0);
    }

    #[test]
    fn patched_trigger_without_gate_is_silent() {
        let mut voice = voice();
        let (out, _) = render(&mut voice, &Patch::default(), &Modulations::gated(false), 4_800);
        assert!(out[2_400..].iter().all(|x| x.abs() < 1e-3));
    }

    #[test]
    fn gated_voice_decays() {
        let mut voice = voice();
        let mut patch = Patch::default();
        patch.decay = 0.2;
        let (strike, _) = render(&mut voice, &patch, &Modulations::gated(true), 4_800);
        let (tail, _) = render(&mut voice, &patch, &Modulations::gated(true), 48_000);
        let energy = |x: &[f32]| x.iter().map(|s| s * s).sum::<f32>() / x.len() as f32;
        assert!(energy(&strike) > energy(&tail[43_200..]) * 10.0);
    }

    #[test]
    fn every_engine_renders_bounded_audio() {
        let mut voice = voice();
        let mut patch = Patch::default();
        let modulations = Modulations::default();
        for engine in 0..NUM_ENGINES {
            patch.engine = engine;
            let mut out = vec![0.0; 9_600];
            let mut aux = vec![0.0; 9_600];
            let output = voice.render(&patch, &modulations, &mut out, &mut aux);
            assert_eq!(output.engine, engine);
            assert!(
                out.iter().chain(aux.iter()).all(|x| x.is_finite() && x.abs() < 4.0),
                "engine {} ({})",
                engine,
                voice.engine_name()
            );
        }
    }

    #[test]
    fn switching_engines_fades_the_old_one_out() {
        let mut voice = voice();
        let mut patch = Patch::default();
        render(&mut voice, &patch, &Modulations::default(), 2_400);
        patch.engine = 4;
        voice.render(&patch, &Modulations::default(), &mut [0.0; 12], &mut [0.0; 12]);
        assert!(voice.crossfade.is_some());
        render(&mut voice, &patch, &Modulations::default(), 480);
        assert!(voice.crossfade.is_none());
    }

    #[test]
    fn any_buffer_length_is_rendered() {
        let mut voice = voice();
        let mut out = [0.0; 100];
        let mut aux = [0.0; 100];
        voice.render(&Patch::default(), &Modulations::default(), &mut out, &mut aux);
        assert!(out[96..].iter().any(|&x| x != 0.0));
    }

    #[test]
    fn sample_rate_can_change() {
        let mut voice = voice();
        assert!(voice.set_sample_rate(1.0).is_err());
        assert_eq!(voice.sample_rate().sample_rate_hz, 48_000.0);
        voice.set_sample_rate(44_100.0).expect("44.1 kHz");
        assert_eq!(voice.sample_rate().sample_rate_hz, 44_100.0);
        let (out, _) = render(&mut voice, &Patch::default(), &Modulations::default(), 1_200);
        assert!(out.iter().all(|x| x.is_finite()));
    }
}
