//! Knob settings and per-block control state.
//!
//! A [`Patch`] is what the front panel holds: it changes only between
//! blocks, when the host moves a knob. [`Modulations`] is what the jacks
//! carry: fresh every block, with a `*_patched` flag per input telling the
//! voice whether to trust the value or fall back to its internal sources.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::units::saturate;
use crate::exciter::ExciterModel;

/// Notes and pitch CVs are kept within this many semitones of zero.
const NOTE_RANGE: f32 = 128.0;

/// Persistent synthesis settings.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Patch {
    /// MIDI note of the root pitch.
    pub note: f32,
    pub harmonics: f32,
    pub timbre: f32,
    pub morph: f32,
    /// Attenuverters, -1..1.
    pub frequency_modulation_amount: f32,
    pub timbre_modulation_amount: f32,
    pub morph_modulation_amount: f32,
    /// Engine index, 0..16.
    pub engine: usize,
    /// Internal envelope and LPG decay, 0..1.
    pub decay: f32,
    /// LPG response: 0 is a pure VCA, 1 a darkening low-pass gate.
    pub lpg_colour: f32,
    pub resonator: ResonatorPatch,
}

impl Default for Patch {
    fn default() -> Self {
        Self {
            note: 48.0,
            harmonics: 0.5,
            timbre: 0.5,
            morph: 0.5,
            frequency_modulation_amount: 0.0,
            timbre_modulation_amount: 0.0,
            morph_modulation_amount: 0.0,
            engine: 0,
            decay: 0.5,
            lpg_colour: 0.5,
            resonator: ResonatorPatch::default(),
        }
    }
}

impl Patch {
    /// Copy with every value finite and within its knob's travel.
    pub fn sanitized(&self) -> Self {
        Self {
            note: saturate(self.note, -NOTE_RANGE, NOTE_RANGE),
            harmonics: saturate(self.harmonics, 0.0, 1.0),
            timbre: saturate(self.timbre, 0.0, 1.0),
            morph: saturate(self.morph, 0.0, 1.0),
            frequency_modulation_amount: saturate(self.frequency_modulation_amount, -1.0, 1.0),
            timbre_modulation_amount: saturate(self.timbre_modulation_amount, -1.0, 1.0),
            morph_modulation_amount: saturate(self.morph_modulation_amount, -1.0, 1.0),
            engine: self.engine,
            decay: saturate(self.decay, 0.0, 1.0),
            lpg_colour: saturate(self.lpg_colour, 0.0, 1.0),
            resonator: self.resonator.sanitized(),
        }
    }
}

/// What the resonator voice rings.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResonatorModel {
    /// Bank of band-pass modes.
    #[default]
    Modal,
    /// Sympathetic strings tuned to a chord.
    Strings,
}

impl ResonatorModel {
    pub const ALL: [ResonatorModel; 2] = [ResonatorModel::Modal, ResonatorModel::Strings];

    pub fn name(self) -> &'static str {
        match self {
            ResonatorModel::Modal => "modal",
            ResonatorModel::Strings => "strings",
        }
    }
}

/// Settings of the resonator voice.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResonatorPatch {
    pub resonator_model: ResonatorModel,
    pub exciter_model: ExciterModel,
    /// Exciter brightness.
    pub exciter_timbre: f32,
    /// Model-specific exciter control (hardness, pick delay, density).
    pub exciter_parameter: f32,
    /// Breath level fed to the tube, 0 disables it.
    pub blow_level: f32,
    /// String non-linearity.
    pub structure: f32,
    pub brightness: f32,
    /// Decay time; higher rings longer.
    pub damping: f32,
    /// Strike position along the object.
    pub position: f32,
    /// Modal stiffness, from membrane through string to bell.
    pub geometry: f32,
    /// Chord of the sympathetic strings, 0..1 across every chord.
    pub chord: f32,
    /// Chorus below 0.5, chorus plus reverb above.
    pub space: f32,
    /// Parts rotated on each trigger, 1..=4.
    pub polyphony: usize,
}

impl Default for ResonatorPatch {
    fn default() -> Self {
        Self {
            resonator_model: ResonatorModel::Modal,
            exciter_model: ExciterModel::Mallet,
            exciter_timbre: 0.5,
            exciter_parameter: 0.3,
            blow_level: 0.0,
            structure: 0.25,
            brightness: 0.5,
            damping: 0.5,
            position: 0.3,
            geometry: 0.3,
            chord: 0.0,
            space: 0.3,
            polyphony: 1,
        }
    }
}

impl ResonatorPatch {
    /// Copy with every value finite and within 0..1.
    pub fn sanitized(&self) -> Self {
        let unit = |x: f32| saturate(x, 0.0, 1.0);
        Self {
            resonator_model: self.resonator_model,
            exciter_model: self.exciter_model,
            exciter_timbre: unit(self.exciter_timbre),
            exciter_parameter: unit(self.exciter_parameter),
            blow_level: unit(self.blow_level),
            structure: unit(self.structure),
            brightness: unit(self.brightness),
            damping: unit(self.damping),
            position: unit(self.position),
            geometry: unit(self.geometry),
            chord: unit(self.chord),
            space: unit(self.space),
            polyphony: self.polyphony,
        }
    }
}

/// Per-block control inputs.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modulations {
    /// Engine CV; one unit spans every engine.
    pub engine: f32,
    /// Note offset in semitones, added to the patch note.
    pub note: f32,
    /// Frequency CV in semitones, scaled by the FM attenuverter.
    pub frequency: f32,
    pub harmonics: f32,
    pub timbre: f32,
    pub morph: f32,
    /// Gate or trigger; high above 0.3, low below 0.1.
    pub trigger: f32,
    /// Level CV (accent and LPG input).
    pub level: f32,

    pub frequency_patched: bool,
    pub timbre_patched: bool,
    pub morph_patched: bool,
    pub trigger_patched: bool,
    pub level_patched: bool,
}

impl Default for Modulations {
    fn default() -> Self {
        Self {
            engine: 0.0,
            note: 0.0,
            frequency: 0.0,
            harmonics: 0.0,
            timbre: 0.0,
            morph: 0.0,
            trigger: 0.0,
            level: 0.0,
            frequency_patched: false,
            timbre_patched: false,
            morph_patched: false,
            trigger_patched: false,
            level_patched: false,
        }
    }
}

impl Modulations {
    /// Copy with every CV finite and saturated to its input's range.
    pub fn sanitized(&self) -> Self {
        let bipolar = |x: f32| saturate(x, -1.0, 1.0);
        Self {
            engine: bipolar(self.engine),
            note: saturate(self.note, -NOTE_RANGE, NOTE_RANGE),
            frequency: saturate(self.frequency, -NOTE_RANGE, NOTE_RANGE),
            harmonics: bipolar(self.harmonics),
            timbre: bipolar(self.timbre),
            morph: bipolar(self.morph),
            trigger: bipolar(self.trigger),
            level: bipolar(self.level),
            ..*self
        }
    }

    /// Modulations with a trigger input patched and held at `gate`.
    pub fn gated(gate: bool) -> Self {
        Self {
            trigger: if gate { 1.0 } else { 0.0 },
            trigger_patched: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_centred() {
        let patch = Patch::default();
        assert_eq!(patch.engine, 0);
        assert_eq!(patch.timbre, 0.5);
        assert_eq!(patch.resonator.polyphony, 1);
        assert!(!Modulations::default().trigger_patched);
    }

    #[test]
    fn sanitizing_removes_every_non_finite_value() {
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let patch = Patch {
                note: bad,
                harmonics: bad,
                timbre: bad,
                morph: bad,
                frequency_modulation_amount: bad,
                timbre_modulation_amount: bad,
                morph_modulation_amount: bad,
                decay: bad,
                lpg_colour: bad,
                resonator: ResonatorPatch {
                    exciter_timbre: bad,
                    exciter_parameter: bad,
                    blow_level: bad,
                    structure: bad,
                    brightness: bad,
                    damping: bad,
                    position: bad,
                    geometry: bad,
                    chord: bad,
                    space: bad,
                    ..ResonatorPatch::default()
                },
                ..Patch::default()
            }
            .sanitized();
            let r = patch.resonator;
            let values = [
                patch.note,
                patch.harmonics,
                patch.timbre,
                patch.morph,
                patch.frequency_modulation_amount,
                patch.timbre_modulation_amount,
                patch.morph_modulation_amount,
                patch.decay,
                patch.lpg_colour,
                r.exciter_timbre,
                r.exciter_parameter,
                r.blow_level,
                r.structure,
                r.brightness,
                r.damping,
                r.position,
                r.geometry,
                r.chord,
                r.space,
            ];
            assert!(values.iter().all(|x| x.is_finite()), "{:?}", values);
            assert!((0.0..=1.0).contains(&patch.harmonics));

            let m = Modulations {
                engine: bad,
                note: bad,
                frequency: bad,
                harmonics: bad,
                timbre: bad,
                morph: bad,
                trigger: bad,
                level: bad,
                ..Modulations::gated(true)
            }
            .sanitized();
            let cvs = [m.engine, m.note, m.frequency, m.harmonics, m.timbre, m.morph, m.trigger, m.level];
            assert!(cvs.iter().all(|x| x.is_finite()), "{:?}", cvs);
            assert!(m.trigger_patched);
        }
    }

    #[test]
    fn sanitizing_keeps_values_in_range() {
        let patch = Patch::default();
        assert_eq!(patch.sanitized(), patch);
        let m = Modulations::gated(true);
        assert_eq!(m.sanitized(), m);
    }

    #[test]
    fn gated_patches_the_trigger() {
        let m = Modulations::gated(true);
        assert!(m.trigger_patched);
        assert_eq!(m.trigger, 1.0);
        assert!(!m.level_patched);
    }
}
