/*
Envelopes
=========

Three small envelope generators live here. None of them has an ADSR shape:
the voices only ever need "hit it and let it ring" behaviors.

Vocabulary
----------

  value       The envelope's output (0.0 to 1.0).

  decay       Fraction of `value` lost per call. Calling `process` once per
              block with a decay scaled by the block size keeps the time
              constant independent of how the host slices audio.

  vactrol     The light-dependent resistor in a low-pass gate. It charges
              fast and discharges slowly, and its discharge slows down as it
              gets darker: the "long tail" of a plucked LPG.


DecayEnvelope
-------------

    1.0 ┐╲
        │ ╲
        │  ╲__
    0.0 └─────────────→ time
        trigger

    value *= 1 - decay          (every block)

Used by the voice as the internal modulation source when nothing is
patched into the TIMBRE/MORPH/FM inputs.


LpgEnvelope
-----------

Models a vactrol. Two modes:

  ping    A trigger ramps the vactrol up at the `attack` rate, then lets it
          fall. Used when only the trigger input is patched.

  lp      The level CV drives the vactrol directly (rising edges are fast,
          falling edges follow the decay). Used when the level input is
          patched.

    vactrol_state
      1.0 ┐   ╱╲
          │  ╱  ╲
          │ ╱    ╲___
      0.0 └╱──────────╲____→ time
           ↑ attack   short decay then slow tail

From the vactrol state we derive three things for the low-pass gate:
gain (VCA), frequency (VCF cutoff) and hf_bleed (how much unfiltered signal
leaks through, set by the colour knob).


GrainEnvelope
-------------

Drives one voice of a swarm. A phase runs at `rate * fm`; every wrap picks a
new random pitch target (`from` → `from + interval`) and a new random speed.
In burst mode a trigger restarts the phase mid-grain with a high speed that
slows down on each wrap, so grains "settle" after the hit.

    size_ratio < 1     the pitch glides across the grain, amplitude is flat
    size_ratio >= 1    the pitch holds, amplitude is a raised-cosine window
                       narrowing as size_ratio grows

*/

use crate::dsp::random::Random;
use crate::dsp::tables::sine;
use crate::dsp::units::one_pole;

#[derive(Debug, Clone, Copy, Default)]
pub struct DecayEnvelope {
    value: f32,
}

impl DecayEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
    }

    pub fn trigger(&mut self) {
        self.value = 1.0;
    }

    #[inline]
    pub fn process(&mut self, decay: f32) {
        self.value *= 1.0 - decay.clamp(0.0, 1.0);
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LpgEnvelope {
    vactrol_state: f32,
    gain: f32,
    frequency: f32,
    hf_bleed: f32,
    ramp_up: bool,
}

impl Default for LpgEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

impl LpgEnvelope {
    pub fn new() -> Self {
        Self {
            vactrol_state: 0.0,
            gain: 1.0,
            frequency: 0.5,
            hf_bleed: 0.0,
            ramp_up: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn trigger(&mut self) {
        self.ramp_up = true;
    }

    /// Trigger-driven mode: ramp up, then decay.
    #[inline]
    pub fn process_ping(&mut self, attack: f32, short_decay: f32, decay_tail: f32, hf: f32) {
        if self.ramp_up {
            self.vactrol_state += attack.max(0.0);
            if self.vactrol_state >= 1.0 {
                self.vactrol_state = 1.0;
                self.ramp_up = false;
            }
        }
        let level = if self.ramp_up { self.vactrol_state } else { 0.0 };
        self.process_lp(level, short_decay, decay_tail, hf);
    }

    /// Level-driven mode: `level` is the vactrol input.
    #[inline]
    pub fn process_lp(&mut self, level: f32, short_decay: f32, decay_tail: f32, hf: f32) {
        let error = level - self.vactrol_state;
        let state_2 = self.vactrol_state * self.vactrol_state;
        let state_4 = state_2 * state_2;
        let tail = 1.0 - self.vactrol_state;
        let tail_2 = tail * tail;
        let coefficient = if error > 0.0 {
            0.6
        } else {
            short_decay + (1.0 - state_4) * decay_tail
        };
        self.vactrol_state = (self.vactrol_state + coefficient.clamp(0.0, 1.0) * error).clamp(0.0, 1.0);

        let hf = hf.clamp(0.0, 1.0);
        self.gain = self.vactrol_state;
        self.frequency = 0.003 + 0.3 * state_4 + hf * 0.04;
        self.hf_bleed = (tail_2 * (1.0 - tail_2) * 2.0) * hf * hf;
    }

    #[inline]
    pub fn gain(&self) -> f32 {
        self.gain
    }

    #[inline]
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    #[inline]
    pub fn hf_bleed(&self) -> f32 {
        self.hf_bleed
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GrainEnvelope {
    from: f32,
    interval: f32,
    phase: f32,
    fm: f32,
    amplitude: f32,
    previous_size_ratio: f32,
    filter_coefficient: f32,
}

impl Default for GrainEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

impl GrainEnvelope {
    pub fn new() -> Self {
        Self {
            from: 0.0,
            interval: 1.0,
            phase: 1.0,
            fm: 0.0,
            amplitude: 0.5,
            previous_size_ratio: 0.0,
            filter_coefficient: 0.0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advances by one control-rate step.
    pub fn step(&mut self, rate: f32, burst_mode: bool, start_burst: bool, random: &mut Random) {
        let mut randomize = false;
        if start_burst {
            self.phase = 0.5;
            self.fm = 16.0;
            randomize = true;
        } else {
            self.phase += rate * self.fm;
            if self.phase >= 1.0 {
                self.phase -= self.phase.floor();
                randomize = true;
            }
        }

        if randomize {
            self.from += self.interval;
            self.interval = random.get_float() - self.from;
            if burst_mode {
                self.fm *= 0.8 + 0.2 * random.get_float();
            } else {
                self.fm = 0.5 + 1.5 * random.get_float();
            }
        }
    }

    /// Bipolar pitch offset of the current grain.
    #[inline]
    pub fn frequency(&self, size_ratio: f32) -> f32 {
        if size_ratio < 1.0 {
            2.0 * (self.from + self.interval * self.phase) - 1.0
        } else {
            self.from
        }
    }

    #[inline]
    pub fn amplitude(&mut self, size_ratio: f32) -> f32 {
        let mut target_amplitude = 1.0;
        if size_ratio >= 1.0 {
            let phase = ((self.phase - 0.5) * size_ratio).clamp(-1.0, 1.0);
            let e = sine(0.5 * phase + 1.25);
            target_amplitude = 0.5 * (e + 1.0);
        }

        // Smooth over the switch between gliding and windowed grains.
        if (size_ratio >= 1.0) ^ (self.previous_size_ratio >= 1.0) {
            self.filter_coefficient = 0.5;
        }
        self.filter_coefficient *= 0.95;
        self.previous_size_ratio = size_ratio;

        one_pole(&mut self.amplitude, target_amplitude, 0.5 - self.filter_coefficient);
        self.amplitude
    }
}
