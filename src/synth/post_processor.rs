//! Gain staging and low-pass gating of an engine's outputs.

/*
Low-pass gate
=============

A vactrol-style gate closes the amplitude and the brightness of a signal
together. The envelope (see `LpgEnvelope`) produces three values per block:

  gain       how far the gate is open
  frequency  cutoff of the low-pass that follows the VCA
  hf_bleed   how much of the unfiltered signal leaks around the low-pass

    x ──► × gain ──┬──► low-pass ──┬──► + ──► y
                   │               │    ▲
                   │               └─ - ┤
                   └────────────────────┘  × hf_bleed

    y = lp + (x·gain - lp) · hf_bleed

All three are ramped across the block so that a gate opening on a block
boundary does not click.

Channel post-processing
-----------------------

Engines that peak unpredictably (noise, swarm, string) are tagged with a
negative gain: they go through the limiter with a pre-gain of `-gain` and
leave it at unity. Every other engine is simply scaled.
*/

use crate::dsp::distortion::Limiter;
use crate::dsp::filter::{FilterMode, FrequencyApproximation, Svf};
use crate::dsp::parameter_interpolator::ParameterInterpolator;

#[derive(Debug, Clone, Copy)]
pub struct LowPassGate {
    previous_gain: f32,
    previous_frequency: f32,
    previous_hf_bleed: f32,
    filter: Svf,
}

impl Default for LowPassGate {
    fn default() -> Self {
        Self::new()
    }
}

impl LowPassGate {
    pub fn new() -> Self {
        Self {
            previous_gain: 0.0,
            previous_frequency: 0.5,
            previous_hf_bleed: 0.0,
            filter: Svf::new(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Gates `in_out` in place.
    pub fn process(&mut self, gain: f32, frequency: f32, hf_bleed: f32, in_out: &mut [f32]) {
        let size = in_out.len();
        let mut gain_modulation = ParameterInterpolator::new(&mut self.previous_gain, gain, size);
        let mut frequency_modulation =
            ParameterInterpolator::new(&mut self.previous_frequency, frequency, size);
        let mut hf_bleed_modulation =
            ParameterInterpolator::new(&mut self.previous_hf_bleed, hf_bleed, size);

        for sample in in_out.iter_mut() {
            let g = gain_modulation.next();
            let f = frequency_modulation.next();
            let h = hf_bleed_modulation.next();
            self.filter.set_f_q(f, 0.4, FrequencyApproximation::Dirty);
            let s = *sample * g;
            let lp = self.filter.process(s, FilterMode::LowPass);
            *sample = lp + (s - lp) * h;
        }
    }
}

/// Values of the voice's LPG envelope for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateSettings {
    pub gain: f32,
    pub frequency: f32,
    pub hf_bleed: f32,
}

/// Limiter or fixed gain, then an optional low-pass gate, on one channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelPostProcessor {
    limiter: Limiter,
    lpg: LowPassGate,
}

impl ChannelPostProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.limiter.reset();
        self.lpg.reset();
    }

    /// Processes `in_out` in place. `gate` is `None` when the LPG is
    /// bypassed.
    pub fn process(&mut self, gain: f32, gate: Option<GateSettings>, in_out: &mut [f32]) {
        let post_gain = if gain < 0.0 {
            self.limiter.process(-gain, in_out);
            1.0
        } else {
            gain
        };

        match gate {
            Some(gate) => {
                self.lpg
                    .process(post_gain * gate.gain, gate.frequency, gate.hf_bleed, in_out);
            }
            None => {
                for sample in in_out.iter_mut() {
                    *sample *= post_gain;
                }
            }
        }
    }
}
