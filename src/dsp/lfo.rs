//! Control-rate oscillators for the modulated delay effects.

/*
Low Frequency Oscillators
=========================

The chorus, diffuser and reverb sweep their delay taps with slow periodic
signals. Those sweeps are LFOs: the same phase accumulator as an audio
oscillator, run at a fraction of a hertz to a few hertz.

  period          Time for one complete oscillation.
                  At 0.5 Hz: 2 seconds = 96000 samples at 48 kHz.

  bipolar         Output swings -1.0 to +1.0. Delay taps want this: the
                  tap moves both sides of its centre.

Frequencies here are normalized (cycles per sample), like everywhere else in
the crate. A 0.5 Hz sweep at 48 kHz is `0.5 / 48000`.
*/

use crate::dsp::tables::sine;

/// Phase-accumulator LFO with a sine readout.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lfo {
    phase: f32,
    frequency: f32,
}

impl Lfo {
    pub fn new(frequency: f32) -> Self {
        Self {
            phase: 0.0,
            frequency,
        }
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Sets the normalized frequency; negative values are treated as zero.
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency.clamp(0.0, 0.5);
    }

    #[inline]
    pub fn phase(&self) -> f32 {
        self.phase
    }

    #[inline]
    fn advance(&mut self) -> f32 {
        self.phase += self.frequency;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        self.phase
    }

    /// Bipolar sine, one sample.
    #[inline]
    pub fn next_sine(&mut self) -> f32 {
        sine(self.advance())
    }
}
