//! The sixteen selectable synthesis engines.
//!
//! Every engine turns the same five controls (note, harmonics, timbre,
//! morph, accent) plus a trigger into two signals: `out`, the main output,
//! and `aux`, a variation on it. What the controls mean differs from engine
//! to engine; the table below is the short version.
//!
//! | # | engine       | harmonics           | timbre            | morph              |
//! |---|--------------|---------------------|-------------------|--------------------|
//! | 0 | VA           | detuning            | sync / pulse width| shape              |
//! | 1 | waveshaping  | waveshaper          | fold amount       | waveform asymmetry |
//! | 2 | FM           | ratio               | modulation index  | feedback           |
//! | 3 | grain        | formant ratio       | formant frequency | formant width      |
//! | 4 | additive     | bumps               | centroid          | slope              |
//! | 5 | wavetable    | bank                | row               | column             |
//! | 6 | chord        | chord               | brightness        | registration       |
//! | 7 | speech       | syllable mode       | vowel             | formant shift      |
//! | 8 | swarm        | spread              | density           | grain size         |
//! | 9 | noise        | filter type         | clock frequency   | resonance          |
//! |10 | particle     | frequency spread    | density           | filter / diffusion |
//! |11 | string       | non-linearity       | brightness        | decay              |
//! |12 | modal        | stiffness           | brightness        | decay              |
//! |13 | bass drum    | attack FM, self FM  | tone              | decay              |
//! |14 | snare drum   | snappy              | tone              | decay              |
//! |15 | hi-hat       | noisiness           | tone              | decay              |
//!
//! Engines never allocate while rendering. Anything block-sized they need
//! beyond their own state comes from the [`ScratchBuffers`] the voice lends
//! them for the duration of one `render` call.

pub mod additive;
pub mod bass_drum;
pub mod chord;
pub mod fm;
pub mod grain;
pub mod hihat;
pub mod modal;
pub mod noise;
pub mod particle;
pub mod snare_drum;
pub mod speech;
pub mod string;
pub mod swarm;
pub mod virtual_analog;
pub mod waveshaping;
pub mod wavetable;

use crate::config::SampleRate;
use crate::MAX_BLOCK_SIZE;

pub use additive::AdditiveEngine;
pub use bass_drum::BassDrumEngine;
pub use chord::ChordEngine;
pub use fm::FmEngine;
pub use grain::GrainEngine;
pub use hihat::HiHatEngine;
pub use modal::ModalEngine;
pub use noise::NoiseEngine;
pub use particle::ParticleEngine;
pub use snare_drum::SnareDrumEngine;
pub use speech::SpeechEngine;
pub use string::StringEngine;
pub use swarm::SwarmEngine;
pub use virtual_analog::VirtualAnalogEngine;
pub use waveshaping::WaveshapingEngine;
pub use wavetable::WavetableEngine;

/// State of the trigger input as an engine sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerState {
    #[default]
    Low,
    /// The gate went high during this block.
    RisingEdge,
    /// Nothing is patched into the trigger input: engines that need
    /// excitation sustain on their own.
    Unpatched,
    High,
}

impl TriggerState {
    #[inline]
    pub fn is_rising_edge(self) -> bool {
        self == TriggerState::RisingEdge
    }

    #[inline]
    pub fn is_unpatched(self) -> bool {
        self == TriggerState::Unpatched
    }

    /// Gate held, including the block in which it went high.
    #[inline]
    pub fn is_high(self) -> bool {
        matches!(self, TriggerState::RisingEdge | TriggerState::High)
    }
}

/// Controls of one block, already modulated and clamped by the voice.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EngineParameters {
    pub trigger: TriggerState,
    /// Pitch as a MIDI note, -119..120.
    pub note: f32,
    /// 0..1
    pub timbre: f32,
    /// 0..1
    pub morph: f32,
    /// 0..1
    pub harmonics: f32,
    /// Hit strength, 0..1
    pub accent: f32,
}

/// Block-sized buffers lent to the active engine for one render.
#[derive(Debug, Clone)]
pub struct ScratchBuffers {
    temp_1: [f32; MAX_BLOCK_SIZE],
    temp_2: [f32; MAX_BLOCK_SIZE],
}

impl Default for ScratchBuffers {
    fn default() -> Self {
        Self::new()
    }
}

impl ScratchBuffers {
    pub fn new() -> Self {
        Self {
            temp_1: [0.0; MAX_BLOCK_SIZE],
            temp_2: [0.0; MAX_BLOCK_SIZE],
        }
    }

    /// Both buffers, cut to `size` (at most [`MAX_BLOCK_SIZE`]) and cleared.
    pub fn split(&mut self, size: usize) -> (&mut [f32], &mut [f32]) {
        let size = size.min(MAX_BLOCK_SIZE);
        let temp_1 = &mut self.temp_1[..size];
        let temp_2 = &mut self.temp_2[..size];
        temp_1.fill(0.0);
        temp_2.fill(0.0);
        (temp_1, temp_2)
    }

    /// The first buffer alone, cut to `size` and cleared.
    pub fn first(&mut self, size: usize) -> &mut [f32] {
        self.split(size).0
    }
}

/// A synthesis algorithm the voice can switch to.
///
/// `out` and `aux` always have the same length, at most
/// [`MAX_BLOCK_SIZE`]. Engines overwrite both.
pub trait Engine: Send {
    /// Derives every rate-dependent constant and clears the state.
    fn init(&mut self, sample_rate: &SampleRate);

    /// Called when the voice switches to this engine.
    ///
    /// Default implementation does nothing.
    fn reset(&mut self) {}

    /// Renders one block. An engine that shapes its own amplitude (drums,
    /// plucked strings) sets `already_enveloped` so the voice skips its
    /// low-pass gate.
    fn render(
        &mut self,
        parameters: &EngineParameters,
        scratch: &mut ScratchBuffers,
        out: &mut [f32],
        aux: &mut [f32],
        already_enveloped: &mut bool,
    );
}

/// How the voice treats an engine's outputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostProcessing {
    /// Output gain. Negative values route through the limiter with a
    /// pre-gain of `-gain`.
    pub out_gain: f32,
    pub aux_gain: f32,
    /// Default for the engine's `already_enveloped` flag.
    pub already_enveloped: bool,
}

/// Static description of one engine slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineInfo {
    pub name: &'static str,
    pub post_processing: PostProcessing,
}

const fn info(name: &'static str, already_enveloped: bool, out_gain: f32, aux_gain: f32) -> EngineInfo {
    EngineInfo {
        name,
        post_processing: PostProcessing {
            out_gain,
            aux_gain,
            already_enveloped,
        },
    }
}

pub const NUM_ENGINES: usize = 16;
/// Index of the speech engine, whose syllables replace the internal envelope.
pub const SPEECH_ENGINE: usize = 7;

pub const ENGINES: [EngineInfo; NUM_ENGINES] = [
    info("VA", false, 0.8, 0.8),
    info("waveshaping", false, 0.7, 0.6),
    info("FM", false, 0.6, 0.6),
    info("grain", false, 0.7, 0.6),
    info("additive", false, 0.8, 0.8),
    info("wavetable", false, 0.6, 0.6),
    info("chord", false, 0.8, 0.8),
    info("speech", false, -0.7, 0.8),
    info("swarm", false, -3.0, 1.0),
    info("noise", false, -1.0, -1.0),
    info("particle", false, -2.0, 1.0),
    info("string", true, -1.0, 0.8),
    info("modal", true, -1.0, 0.8),
    info("bass drum", true, 0.8, 0.8),
    info("snare drum", true, 0.8, 0.8),
    info("hi-hat", true, 0.8, 0.8),
];

/// Description of engine `index`, clamped to the last engine.
pub fn engine_info(index: usize) -> &'static EngineInfo {
    &ENGINES[index.min(NUM_ENGINES - 1)]
}

/// Builds and initializes every engine, in index order.
pub fn create_engines(sample_rate: &SampleRate) -> Vec<Box<dyn Engine>> {
    let mut engines: Vec<Box<dyn Engine>> = vec![
        Box::new(VirtualAnalogEngine::new()),
        Box::new(WaveshapingEngine::new()),
        Box::new(FmEngine::new()),
        Box::new(GrainEngine::new()),
        Box::new(AdditiveEngine::new()),
        Box::new(WavetableEngine::new()),
        Box::new(ChordEngine::new(sample_rate)),
        Box::new(SpeechEngine::new(sample_rate)),
        Box::new(SwarmEngine::new()),
        Box::new(NoiseEngine::new()),
        Box::new(ParticleEngine::new(sample_rate)),
        Box::new(StringEngine::new(sample_rate)),
        Box::new(ModalEngine::new()),
        Box::new(BassDrumEngine::new(sample_rate)),
        Box::new(SnareDrumEngine::new(sample_rate)),
        Box::new(HiHatEngine::new(sample_rate)),
    ];
    for engine in engines.iter_mut() {
        engine.init(sample_rate);
    }
    engines
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Renders `blocks` blocks of 12 samples, triggering on the first one
    /// when `trigger` is set, and returns (out, aux).
    pub fn render_blocks(
        engine: &mut dyn Engine,
        parameters: EngineParameters,
        trigger: bool,
        blocks: usize,
    ) -> (Vec<f32>, Vec<f32>) {
        let mut scratch = ScratchBuffers::new();
        let mut out = vec![0.0; blocks * 12];
        let mut aux = vec![0.0; blocks * 12];
        for (n, (o, a)) in out.chunks_mut(12).zip(aux.chunks_mut(12)).enumerate() {
            let mut p = parameters;
            if trigger {
                p.trigger = if n == 0 {
                    TriggerState::RisingEdge
                } else {
                    TriggerState::Low
                };
            }
            let mut already_enveloped = false;
            engine.render(&p, &mut scratch, o, a, &mut already_enveloped);
        }
        (out, aux)
    }

    pub fn parameters(note: f32) -> EngineParameters {
        EngineParameters {
            trigger: TriggerState::Unpatched,
            note,
            timbre: 0.5,
            morph: 0.5,
            harmonics: 0.5,
            accent: 0.8,
        }
    }

    pub fn rms(x: &[f32]) -> f32 {
        (x.iter().map(|s| s * s).sum::<f32>() / x.len().max(1) as f32).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn speech_index_matches_the_table() {
        assert_eq!(ENGINES[SPEECH_ENGINE].name, "speech");
    }

    #[test]
    fn every_engine_renders_finite_audio() {
        let sr = SampleRate::default();
        let mut engines = create_engines(&sr);
        assert_eq!(engines.len(), NUM_ENGINES);
        for (index, engine) in engines.iter_mut().enumerate() {
            engine.reset();
            let (out, aux) = render_blocks(engine.as_mut(), parameters(48.0), true, 200);
            assert!(
                out.iter().chain(aux.iter()).all(|x| x.is_finite()),
                "{} produced a non-finite sample",
                ENGINES[index].name
            );
            assert!(
                rms(&out) > 1e-5 || rms(&aux) > 1e-5,
                "{} stayed silent",
                ENGINES[index].name
            );
        }
    }

    #[test]
    fn trigger_state_predicates() {
        assert!(TriggerState::RisingEdge.is_high());
        assert!(TriggerState::High.is_high());
        assert!(!TriggerState::Unpatched.is_high());
        assert!(TriggerState::Unpatched.is_unpatched());
    }

    #[test]
    fn scratch_is_capped_to_the_block_limit() {
        let mut scratch = ScratchBuffers::new();
        let (a, b) = scratch.split(100);
        assert_eq!(a.len(), MAX_BLOCK_SIZE);
        assert_eq!(b.len(), MAX_BLOCK_SIZE);
    }

    #[test]
    fn info_lookup_clamps() {
        assert_eq!(engine_info(99).name, "hi-hat");
        assert!(ENGINES[11].post_processing.already_enveloped);
    }
}
