//! Exciter and resonator voice.
//!
//! ```text
//!   gate ──► exciter ─────────────┐
//!                                 + ──► modal bank ─┐
//!   breath ──► tube (blow level) ─┘   or chord      ├──► chorus ──► reverb
//!                                     strings ──────┘
//! ```
//!
//! Up to four parts share the controls. Each trigger moves to the next
//! part, so previous strikes keep ringing at their own pitch. Without a
//! trigger patched, the active part is struck whenever the note moves by
//! more than half a semitone.
//!
//! The exciter's damping output mutes the resonator the way a palm on the
//! strings would: while it is raised the decay control is pulled down.

use log::info;

use crate::chords::ChordSelector;
use crate::config::{ConfigError, SampleRate, VoiceConfig};
use crate::dsp::distortion::Limiter;
use crate::dsp::tables;
use crate::exciter::{Exciter, ExciterFlags, ExciterModel};
use crate::fx::{Chorus, Reverb};
use crate::patch::{Modulations, Patch, ResonatorModel, ResonatorPatch};
use crate::physical::{ChordStrings, Resonator, StringVoice, Tube, MAX_NUM_MODES};
use crate::MAX_BLOCK_SIZE;

pub const MAX_POLYPHONY: usize = 4;

const GATE_HIGH_THRESHOLD: f32 = 0.3;
const GATE_LOW_THRESHOLD: f32 = 0.1;
const STRUM_THRESHOLD: f32 = 0.5;

struct Part {
    exciter: Exciter,
    breath: Exciter,
    tube: Tube,
    resonator: Resonator,
    strings: ChordStrings,
    note: f32,
}

impl Part {
    fn new(sample_rate: &SampleRate, index: usize) -> Self {
        let mut exciter = Exciter::new();
        exciter.set_signature(index as f32 / MAX_POLYPHONY as f32);
        let mut breath = Exciter::new();
        breath.set_model(ExciterModel::Flow);
        Self {
            exciter,
            breath,
            tube: Tube::new(),
            resonator: Resonator::new(0.3, MAX_NUM_MODES),
            strings: ChordStrings::new(sample_rate),
            note: 0.0,
        }
    }

    fn reset(&mut self) {
        self.exciter.reset();
        self.breath.reset();
        self.tube.reset();
        self.resonator.init(0.3, MAX_NUM_MODES);
        self.strings.reset();
    }

    /// Excites the part and adds its resonance into `out` and `aux`.
    #[allow(clippy::too_many_arguments)]
    fn render(
        &mut self,
        settings: &ResonatorPatch,
        flags: ExciterFlags,
        f0: f32,
        chord: usize,
        excitation: &mut [f32],
        blow: &mut [f32],
        out: &mut [f32],
        aux: &mut [f32],
    ) {
        self.exciter.set_model(settings.exciter_model);
        self.exciter.set_timbre(settings.exciter_timbre);
        self.exciter.set_parameter(settings.exciter_parameter);
        self.exciter.process(flags, excitation);

        if settings.blow_level > 0.0 {
            self.breath.set_timbre(settings.exciter_timbre);
            self.breath.set_parameter(0.5);
            self.breath.process(ExciterFlags::GATE, blow);
            for sample in blow.iter_mut() {
                *sample *= settings.blow_level;
            }
            self.tube
                .process(f0, 1.0, self.exciter.damping(), settings.exciter_timbre, blow, 1.0);
            for (e, b) in excitation.iter_mut().zip(blow.iter()) {
                *e += *b;
            }
        }

        let damping = settings.damping.clamp(0.0, 1.0) * (1.0 - 0.5 * self.exciter.damping());
        match settings.resonator_model {
            ResonatorModel::Modal => {
                self.resonator.set_position(settings.position);
                self.resonator
                    .process(f0, settings.geometry, settings.brightness, damping, excitation, out);
            }
            ResonatorModel::Strings => {
                self.strings.process(
                    f0,
                    chord,
                    StringVoice::non_linearity(settings.structure),
                    settings.brightness,
                    damping,
                    excitation,
                    out,
                    aux,
                );
            }
        }
    }
}

pub struct ResonatorVoice {
    config: VoiceConfig,
    sample_rate: SampleRate,
    parts: Vec<Part>,
    active_part: usize,
    chord_selector: ChordSelector,
    chorus: Chorus,
    reverb: Reverb,
    limiter: [Limiter; 2],

    gate: bool,
    strummed_note: Option<f32>,
    excitation: [f32; MAX_BLOCK_SIZE],
    blow: [f32; MAX_BLOCK_SIZE],
}

impl ResonatorVoice {
    pub fn new(config: VoiceConfig) -> Result<Self, ConfigError> {
        let sample_rate = config.validate()?;
        tables::warm_up();
        let mut chorus = Chorus::new(&sample_rate);
        chorus.set_rate(0.4);
        chorus.set_depth(0.6);
        info!(
            "resonator voice ready: {} Hz, {}-sample blocks",
            sample_rate.sample_rate_hz, config.block_size
        );
        Ok(Self {
            config,
            sample_rate,
            parts: (0..MAX_POLYPHONY).map(|i| Part::new(&sample_rate, i)).collect(),
            active_part: 0,
            chord_selector: ChordSelector::new(),
            chorus,
            reverb: Reverb::new(&sample_rate),
            limiter: [Limiter::new(); 2],
            gate: false,
            strummed_note: None,
            excitation: [0.0; MAX_BLOCK_SIZE],
            blow: [0.0; MAX_BLOCK_SIZE],
        })
    }

    pub fn set_sample_rate(&mut self, sample_rate_hz: f32) -> Result<(), ConfigError> {
        let config = VoiceConfig::new(sample_rate_hz, self.config.block_size);
        let sample_rate = config.validate()?;
        self.config = config;
        self.sample_rate = sample_rate;
        for part in self.parts.iter_mut() {
            part.strings.init(&sample_rate);
            part.reset();
        }
        self.chorus.init(&sample_rate);
        self.reverb.init(&sample_rate);
        self.gate = false;
        self.strummed_note = None;
        info!("resonator voice sample rate changed to {} Hz", sample_rate_hz);
        Ok(())
    }

    pub fn sample_rate(&self) -> &SampleRate {
        &self.sample_rate
    }

    /// Part that took the most recent strike.
    pub fn active_part(&self) -> usize {
        self.active_part
    }

    /// Chord rung by the strings model.
    pub fn chord(&self) -> usize {
        self.chord_selector.index()
    }

    /// Renders the common prefix of `out` and `aux`; returns whether a part
    /// was struck.
    pub fn render(
        &mut self,
        patch: &Patch,
        modulations: &Modulations,
        out: &mut [f32],
        aux: &mut [f32],
    ) -> bool {
        let patch = &patch.sanitized();
        let modulations = &modulations.sanitized();
        let size = out.len().min(aux.len());
        let block_size = self.config.block_size;
        let mut struck = false;
        for (out, aux) in out[..size]
            .chunks_mut(block_size)
            .zip(aux[..size].chunks_mut(block_size))
        {
            struck |= self.render_block(patch, modulations, out, aux);
        }
        struck
    }

    fn render_block(
        &mut self,
        patch: &Patch,
        modulations: &Modulations,
        out: &mut [f32],
        aux: &mut [f32],
    ) -> bool {
        let size = out.len();
        let settings = &patch.resonator;
        let polyphony = settings.polyphony.clamp(1, MAX_POLYPHONY);
        let note = patch.note + modulations.note;

        let flags = if modulations.trigger_patched {
            let previous = self.gate;
            if !self.gate && modulations.trigger > GATE_HIGH_THRESHOLD {
                self.gate = true;
            } else if self.gate && modulations.trigger < GATE_LOW_THRESHOLD {
                self.gate = false;
            }
            ExciterFlags::from_gate(previous, self.gate)
        } else {
            let strum = self
                .strummed_note
                .map_or(true, |previous| (note - previous).abs() > STRUM_THRESHOLD);
            let mut flags = ExciterFlags::GATE | ExciterFlags::UNPATCHED;
            if strum {
                self.strummed_note = Some(note);
                flags = flags | ExciterFlags::RISING_EDGE;
            }
            flags
        };
        let struck = flags.contains(ExciterFlags::RISING_EDGE);

        if self.active_part >= polyphony {
            self.active_part = 0;
        }
        if struck {
            self.active_part = (self.active_part + 1) % polyphony;
        }
        let active_part = self.active_part;
        if struck || !modulations.trigger_patched {
            self.parts[active_part].note = note;
        }

        let chord = self.chord_selector.process(settings.chord);

        out.fill(0.0);
        aux.fill(0.0);
        let excitation = &mut self.excitation[..size];
        let blow = &mut self.blow[..size];
        for (i, part) in self.parts.iter_mut().enumerate().take(polyphony) {
            let part_flags = if i == active_part {
                flags
            } else {
                ExciterFlags::empty()
            };
            let f0 = self.sample_rate.note_to_frequency(part.note);
            part.render(settings, part_flags, f0, chord, excitation, blow, out, aux);
        }
        if settings.resonator_model == ResonatorModel::Modal {
            aux.copy_from_slice(out);
        }

        let space = settings.space.clamp(0.0, 1.0);
        self.chorus.set_amount((space * 2.0).min(1.0) * 0.5);
        self.chorus.process(out, aux);
        let reverb_amount = ((space - 0.5) * 2.0).max(0.0);
        self.reverb.set_amount(reverb_amount * 0.5);
        self.reverb.set_time(0.5 + 0.48 * reverb_amount);
        self.reverb.process(out, aux);

        self.limiter[0].process(1.0, out);
        self.limiter[1].process(1.0, aux);
        struck
    }
}
