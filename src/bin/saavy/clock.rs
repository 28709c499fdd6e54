//! Clock - sample-accurate gate and step generator
//!
//! Runs in the audio thread. Each beat raises the gate for a quarter of the
//! beat and advances one step of a short note-offset pattern, which is
//! what the voice's trigger and note inputs receive.

/// Largest number of steps in the pattern.
pub const MAX_STEPS: usize = 16;

/// Fraction of the beat the gate stays high.
const GATE_LENGTH: f64 = 0.25;

pub struct Clock {
    /// Samples per beat (computed from bpm and sample rate)
    samples_per_beat: f64,
    /// Position within the current beat, in samples
    position: f64,
    /// Note offsets in semitones, played one per beat
    steps: [f32; MAX_STEPS],
    num_steps: usize,
    step: usize,
    running: bool,
}

impl Clock {
    pub fn new(bpm: f64, sample_rate: f64, steps: &[f32]) -> Self {
        let mut clock = Self {
            samples_per_beat: 1.0,
            position: 0.0,
            steps: [0.0; MAX_STEPS],
            num_steps: 1,
            step: 0,
            running: true,
        };
        clock.set_tempo(bpm, sample_rate);
        clock.set_steps(steps);
        clock
    }

    pub fn set_tempo(&mut self, bpm: f64, sample_rate: f64) {
        self.samples_per_beat = (60.0 / bpm.max(1.0)) * sample_rate;
    }

    /// Replaces the pattern; an empty pattern holds the root note.
    pub fn set_steps(&mut self, steps: &[f32]) {
        let count = steps.len().min(MAX_STEPS);
        self.steps[..count].copy_from_slice(&steps[..count]);
        self.num_steps = count.max(1);
        if count == 0 {
            self.steps[0] = 0.0;
        }
        self.step = 0;
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
        if !running {
            self.position = 0.0;
            self.step = 0;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Moves `frames` samples forward; returns the gate at the start of the
    /// block and the note offset of the current step.
    pub fn advance(&mut self, frames: usize) -> (bool, f32) {
        if !self.running {
            return (false, 0.0);
        }
        let gate = self.position < self.samples_per_beat * GATE_LENGTH;
        let offset = self.steps[self.step];

        self.position += frames as f64;
        while self.position >= self.samples_per_beat {
            self.position -= self.samples_per_beat;
            self.step = (self.step + 1) % self.num_steps;
        }
        (gate, offset)
    }
}
