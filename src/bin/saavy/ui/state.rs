//! Shared state types for UI communication
//!
//! Designed for real-time safety: everything crossing the ring buffers is
//! `Copy`, so neither side allocates while talking to the other.

use saavy_macro::{engine::NUM_ENGINES, exciter::ExciterModel, patch::ResonatorModel, Patch};

/// Which voice the audio thread plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceMode {
    /// The sixteen-engine macro voice.
    Macro,
    /// Exciter into modal resonator or strings, then chorus and reverb.
    Resonator,
}

impl VoiceMode {
    pub fn toggled(self) -> Self {
        match self {
            VoiceMode::Macro => VoiceMode::Resonator,
            VoiceMode::Resonator => VoiceMode::Macro,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            VoiceMode::Macro => "macro",
            VoiceMode::Resonator => "resonator",
        }
    }

    pub fn controls(self) -> &'static [Control] {
        match self {
            VoiceMode::Macro => &Control::MACRO,
            VoiceMode::Resonator => &Control::RESONATOR,
        }
    }
}

/// Commands sent from UI thread to audio thread
#[derive(Clone, Copy, Debug)]
pub enum ControlMessage {
    /// Replace the knob settings
    Patch(Patch),
    /// Switch between the two voices
    Mode(VoiceMode),
    /// Start or stop the gate clock
    Clock(bool),
    /// Fire a single gate by hand
    Strike,
}

/// Static state sent once at initialization
#[derive(Clone, Copy, Debug)]
pub struct UiStateInit {
    /// Audio sample rate in Hz
    pub sample_rate: f32,
    /// Output channels of the device
    pub channels: usize,
    /// Tempo of the gate clock
    pub bpm: f64,
}

/// Dynamic state update sent from audio thread (allocation-free, Copy)
#[derive(Clone, Copy, Debug, Default)]
pub struct UiStateUpdate {
    /// Engine that rendered the last block
    pub engine: usize,
    /// Internal decay envelope of the macro voice
    pub envelope: f32,
    /// Gate currently sent to the voice
    pub gate: bool,
    /// Resonator part struck last
    pub active_part: usize,
    /// Chord of the sympathetic strings
    pub chord: usize,
}

/// A front-panel knob the UI can turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Note,
    Engine,
    Harmonics,
    Timbre,
    Morph,
    Decay,
    LpgColour,
    Resonator,
    Exciter,
    ExciterTimbre,
    ExciterParameter,
    Blow,
    Structure,
    Brightness,
    Damping,
    Position,
    Geometry,
    Chord,
    Space,
    Polyphony,
}

impl Control {
    pub const MACRO: [Control; 7] = [
        Control::Note,
        Control::Engine,
        Control::Harmonics,
        Control::Timbre,
        Control::Morph,
        Control::Decay,
        Control::LpgColour,
    ];

    pub const RESONATOR: [Control; 14] = [
        Control::Note,
        Control::Resonator,
        Control::Exciter,
        Control::ExciterTimbre,
        Control::ExciterParameter,
        Control::Blow,
        Control::Structure,
        Control::Brightness,
        Control::Damping,
        Control::Position,
        Control::Geometry,
        Control::Chord,
        Control::Space,
        Control::Polyphony,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Control::Note => "note",
            Control::Engine => "engine",
            Control::Harmonics => "harmonics",
            Control::Timbre => "timbre",
            Control::Morph => "morph",
            Control::Decay => "decay",
            Control::LpgColour => "lpg colour",
            Control::Resonator => "resonator",
            Control::Exciter => "exciter",
            Control::ExciterTimbre => "exc. timbre",
            Control::ExciterParameter => "exc. param",
            Control::Blow => "blow",
            Control::Structure => "structure",
            Control::Brightness => "brightness",
            Control::Damping => "damping",
            Control::Position => "position",
            Control::Geometry => "geometry",
            Control::Chord => "chord",
            Control::Space => "space",
            Control::Polyphony => "polyphony",
        }
    }

    /// Position of the knob, 0..1, for the bar display.
    pub fn level(self, patch: &Patch) -> f32 {
        let r = &patch.resonator;
        match self {
            Control::Note => (patch.note - 12.0) / 96.0,
            Control::Engine => patch.engine as f32 / (NUM_ENGINES - 1) as f32,
            Control::Harmonics => patch.harmonics,
            Control::Timbre => patch.timbre,
            Control::Morph => patch.morph,
            Control::Decay => patch.decay,
            Control::LpgColour => patch.lpg_colour,
            Control::Resonator => match r.resonator_model {
                ResonatorModel::Modal => 0.0,
                ResonatorModel::Strings => 1.0,
            },
            Control::Exciter => {
                exciter_index(r.exciter_model) as f32 / (ExciterModel::ALL.len() - 1) as f32
            }
            Control::ExciterTimbre => r.exciter_timbre,
            Control::ExciterParameter => r.exciter_parameter,
            Control::Blow => r.blow_level,
            Control::Structure => r.structure,
            Control::Brightness => r.brightness,
            Control::Damping => r.damping,
            Control::Position => r.position,
            Control::Geometry => r.geometry,
            Control::Chord => r.chord,
            Control::Space => r.space,
            Control::Polyphony => r.polyphony.saturating_sub(1) as f32 / 3.0,
        }
        .clamp(0.0, 1.0)
    }

    /// Text shown next to the bar.
    pub fn label(self, patch: &Patch) -> String {
        let r = &patch.resonator;
        match self {
            Control::Note => format!("{:.0}", patch.note),
            Control::Engine => saavy_macro::engine::engine_info(patch.engine).name.to_string(),
            Control::Resonator => r.resonator_model.name().to_string(),
            Control::Exciter => r.exciter_model.name().to_string(),
            Control::Polyphony => r.polyphony.to_string(),
            _ => format!("{:.2}", self.level(patch)),
        }
    }

    /// Turns the knob by `steps` detents.
    pub fn nudge(self, patch: &mut Patch, steps: i32) {
        let delta = steps as f32 * 0.05;
        let r = &mut patch.resonator;
        let turn = |value: &mut f32| *value = (*value + delta).clamp(0.0, 1.0);
        match self {
            Control::Note => patch.note = (patch.note + steps as f32).clamp(12.0, 108.0),
            Control::Engine => {
                patch.engine = step_index(patch.engine, steps, NUM_ENGINES);
            }
            Control::Harmonics => turn(&mut patch.harmonics),
            Control::Timbre => turn(&mut patch.timbre),
            Control::Morph => turn(&mut patch.morph),
            Control::Decay => turn(&mut patch.decay),
            Control::LpgColour => turn(&mut patch.lpg_colour),
            Control::Resonator => {
                let index = step_index(
                    (r.resonator_model == ResonatorModel::Strings) as usize,
                    steps,
                    ResonatorModel::ALL.len(),
                );
                r.resonator_model = ResonatorModel::ALL[index];
            }
            Control::Exciter => {
                let index = step_index(exciter_index(r.exciter_model), steps, ExciterModel::ALL.len());
                r.exciter_model = ExciterModel::ALL[index];
            }
            Control::ExciterTimbre => turn(&mut r.exciter_timbre),
            Control::ExciterParameter => turn(&mut r.exciter_parameter),
            Control::Blow => turn(&mut r.blow_level),
            Control::Structure => turn(&mut r.structure),
            Control::Brightness => turn(&mut r.brightness),
            Control::Damping => turn(&mut r.damping),
            Control::Position => turn(&mut r.position),
            Control::Geometry => turn(&mut r.geometry),
            Control::Chord => turn(&mut r.chord),
            Control::Space => turn(&mut r.space),
            Control::Polyphony => {
                r.polyphony = (r.polyphony as i32 + steps).clamp(1, 4) as usize;
            }
        }
    }
}

fn exciter_index(model: ExciterModel) -> usize {
    ExciterModel::ALL
        .iter()
        .position(|&m| m == model)
        .unwrap_or(0)
}

/// Wrapping step through `count` choices.
fn step_index(index: usize, steps: i32, count: usize) -> usize {
    (index as i32 + steps).rem_euclid(count as i32) as usize
}
