//! Physical models: things that ring when excited.
//!
//! - [`resonator`]: modal bank of band-pass filters,
//! - [`string`]: Karplus-Strong waveguide with dispersion,
//! - [`tube`]: reed and bore waveguide,
//! - [`chord_strings`]: sympathetic strings tuned to a chord,
//! - [`modal_voice`] and [`string_voice`]: the above with their own
//!   excitation, as driven by the modal and string engines.

pub mod chord_strings;
pub mod modal_voice;
pub mod resonator;
pub mod string;
pub mod string_voice;
pub mod tube;

pub use chord_strings::ChordStrings;
pub use modal_voice::ModalVoice;
pub use resonator::{Resonator, ResonatorSvf, MAX_NUM_MODES};
pub use string::WaveguideString;
pub use string_voice::StringVoice;
pub use tube::Tube;
