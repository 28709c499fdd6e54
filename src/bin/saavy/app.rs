//! Saavy - application builder and audio thread

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use log::{error, info, warn};
use rtrb::{Consumer, Producer, RingBuffer};

use super::clock::Clock;
use super::ui::{ControlMessage, UiApp, UiStateInit, UiStateUpdate, VoiceMode};

use saavy_macro::{Modulations, Patch, ResonatorVoice, Voice, VoiceConfig, MAX_BLOCK_SIZE};

/// Samples buffered between the audio thread and the oscilloscope
const AUDIO_RING_SIZE: usize = 16_384;
const CONTROL_RING_SIZE: usize = 64;
const STATE_RING_SIZE: usize = 64;
/// Blocks between two state updates sent to the UI
const STATE_INTERVAL: usize = 64;
/// Length of a hand-fired gate, in blocks
const STRIKE_BLOCKS: usize = 200;

/// Main application builder
pub struct Saavy {
    bpm: f64,
    steps: Vec<f32>,
    patch: Patch,
}

impl Saavy {
    pub fn new() -> Self {
        Self {
            bpm: 120.0,
            steps: vec![0.0],
            patch: Patch::default(),
        }
    }

    /// Set the tempo of the gate clock in beats per minute
    pub fn bpm(mut self, bpm: f64) -> Self {
        self.bpm = bpm;
        self
    }

    /// Note offsets in semitones, one per beat
    pub fn steps(mut self, steps: &[f32]) -> Self {
        self.steps = steps.to_vec();
        self
    }

    /// Initial knob settings
    pub fn patch(mut self, patch: Patch) -> Self {
        self.patch = patch;
        self
    }

    /// Run the application (takes over the terminal, plays audio)
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;
        info!("output: {} Hz, {} channels", sample_rate, channels);

        let voice_config = VoiceConfig::new(sample_rate, MAX_BLOCK_SIZE);
        let mut engine = AudioEngine {
            voice: Voice::new(voice_config).wrap_err("unsupported output sample rate")?,
            resonator: ResonatorVoice::new(voice_config)
                .wrap_err("unsupported output sample rate")?,
            clock: Clock::new(self.bpm, sample_rate as f64, &self.steps),
            patch: self.patch,
            mode: VoiceMode::Macro,
            strike: 0,
            blocks: 0,
            last_state: UiStateUpdate::default(),
        };

        let (control_tx, mut control_rx) = RingBuffer::<ControlMessage>::new(CONTROL_RING_SIZE);
        let (mut audio_tx, audio_rx) = RingBuffer::<f32>::new(AUDIO_RING_SIZE);
        let (mut state_tx, state_rx) = RingBuffer::<UiStateUpdate>::new(STATE_RING_SIZE);

        let mut left = [0.0f32; MAX_BLOCK_SIZE];
        let mut right = [0.0f32; MAX_BLOCK_SIZE];

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                engine.receive(&mut control_rx);

                while frames_written < total_frames {
                    let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let l = &mut left[..frames_to_render];
                    let r = &mut right[..frames_to_render];
                    engine.render_block(l, r, &mut state_tx);

                    // Interleave; mono devices get the sum.
                    let out_off = frames_written * channels;
                    for (i, (&a, &b)) in l.iter().zip(r.iter()).enumerate() {
                        let frame = &mut data[out_off + i * channels..out_off + (i + 1) * channels];
                        match frame {
                            [mono] => *mono = 0.5 * (a + b),
                            [first, second, rest @ ..] => {
                                *first = a;
                                *second = b;
                                rest.fill(0.0);
                            }
                            [] => {}
                        }
                        let _ = audio_tx.push(0.5 * (a + b));
                    }

                    frames_written += frames_to_render;
                }
            },
            |err| error!("audio stream error: {}", err),
            None,
        )?;

        stream.play()?;

        let init = UiStateInit {
            sample_rate,
            channels,
            bpm: self.bpm,
        };
        let mut app = UiApp::new(control_tx, audio_rx, state_rx, init, self.patch);

        let mut terminal = ratatui::init();
        let result = app.run(&mut terminal);
        ratatui::restore();

        if let Err(err) = stream.pause() {
            warn!("could not pause the output stream: {}", err);
        }
        result
    }
}

impl Default for Saavy {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the audio callback owns
struct AudioEngine {
    voice: Voice,
    resonator: ResonatorVoice,
    clock: Clock,
    patch: Patch,
    mode: VoiceMode,
    /// Blocks left on a hand-fired gate
    strike: usize,
    blocks: usize,
    last_state: UiStateUpdate,
}

impl AudioEngine {
    fn receive(&mut self, control_rx: &mut Consumer<ControlMessage>) {
        while let Ok(message) = control_rx.pop() {
            match message {
                ControlMessage::Patch(patch) => self.patch = patch,
                ControlMessage::Mode(mode) => self.mode = mode,
                ControlMessage::Clock(running) => self.clock.set_running(running),
                ControlMessage::Strike => self.strike = STRIKE_BLOCKS,
            }
        }
    }

    fn render_block(
        &mut self,
        left: &mut [f32],
        right: &mut [f32],
        state_tx: &mut Producer<UiStateUpdate>,
    ) {
        let (clock_gate, offset) = self.clock.advance(left.len());
        let strike_gate = self.strike > STRIKE_BLOCKS / 2;
        self.strike = self.strike.saturating_sub(1);

        // With neither the clock nor a strike, the trigger is left unpatched
        // and the voice drones.
        let patched = self.clock.is_running() || self.strike > 0;
        let modulations = Modulations {
            note: offset,
            trigger: if clock_gate || strike_gate { 1.0 } else { 0.0 },
            trigger_patched: patched,
            ..Modulations::default()
        };

        match self.mode {
            VoiceMode::Macro => {
                let output = self.voice.render(&self.patch, &modulations, left, right);
                self.last_state.engine = output.engine;
                self.last_state.envelope = output.envelope;
            }
            VoiceMode::Resonator => {
                self.resonator.render(&self.patch, &modulations, left, right);
                self.last_state.active_part = self.resonator.active_part();
                self.last_state.chord = self.resonator.chord();
            }
        }
        self.last_state.gate = modulations.trigger > 0.5;

        self.blocks += 1;
        if self.blocks % STATE_INTERVAL == 0 {
            let _ = state_tx.push(self.last_state);
        }
    }
}
