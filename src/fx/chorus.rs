//! Stereo chorus for the resonator voice.

use crate::config::SampleRate;
use crate::dsp::delay::DelayLine;
use crate::dsp::lfo::Lfo;
use crate::dsp::tables::cosine;

/*
Chorus Effect
=============

Chorus thickens a sound by mixing the dry signal with a slightly delayed,
pitch-modulated copy. The modulation creates subtle detuning that makes
one resonator sound like several ringing together.

How It Works
------------

1. Both channels are summed into a single delay line
2. Two taps read it ~20 ms late, swept by one LFO in quadrature
   (the left tap at 0 degrees, the right at 90)
3. Each channel blends its dry input with its own tap

Because the taps move against each other the wet signal is decorrelated
between channels, which is where the stereo width comes from.

Parameters
----------

Rate (0.1 - 5.0 Hz):
  LFO speed. Slower = subtle shimmer, faster = vibrato-like wobble.

Depth (0 - 1):
  Fraction of the maximum 5 ms sweep. Subtle: 0.2-0.4, obvious: 0.8+.

Amount (0 - 1):
  Dry/wet blend. 0.5 makes the strongest beating.
*/

const LINE_SIZE: usize = 8192;
const BASE_DELAY_MS: f32 = 20.0;
const MAX_DEPTH_MS: f32 = 5.0;

pub struct Chorus {
    line: DelayLine<LINE_SIZE>,
    lfo: Lfo,
    sample_rate: SampleRate,
    rate_hz: f32,
    base_delay_ms: f32,
    amount: f32,
    depth: f32,
}

impl Chorus {
    pub fn new(sample_rate: &SampleRate) -> Self {
        let mut chorus = Self {
            line: DelayLine::new(),
            lfo: Lfo::new(0.0),
            sample_rate: *sample_rate,
            rate_hz: 0.75,
            base_delay_ms: BASE_DELAY_MS,
            amount: 0.0,
            depth: 0.0,
        };
        chorus.init(sample_rate);
        chorus
    }

    pub fn init(&mut self, sample_rate: &SampleRate) {
        self.sample_rate = *sample_rate;
        self.set_rate(self.rate_hz);
        self.reset();
    }

    pub fn reset(&mut self) {
        self.line.reset();
        self.lfo.reset();
    }

    /// LFO speed in Hz.
    pub fn set_rate(&mut self, rate_hz: f32) {
        self.rate_hz = rate_hz.clamp(0.1, 10.0);
        self.lfo.set_frequency(self.rate_hz * self.sample_rate.inv_sample_rate);
    }

    /// Centre of the sweep (default 20 ms).
    pub fn with_base_delay(mut self, ms: f32) -> Self {
        self.base_delay_ms = ms.clamp(5.0, 25.0);
        self
    }

    pub fn set_amount(&mut self, amount: f32) {
        self.amount = amount.clamp(0.0, 1.0);
    }

    pub fn set_depth(&mut self, depth: f32) {
        self.depth = depth.clamp(0.0, 1.0);
    }

    /// Processes the stereo pair in place.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let samples_per_ms = self.sample_rate.samples(0.001);
        let base = self.base_delay_ms * samples_per_ms;
        let sweep = self.depth * MAX_DEPTH_MS * samples_per_ms;

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let lfo_left = self.lfo.next_sine();
            let lfo_right = cosine(self.lfo.phase());

            self.line.write(0.5 * (*l + *r));
            let wet_l = self.line.read_hermite((base + lfo_left * sweep).max(1.0));
            let wet_r = self.line.read_hermite((base + lfo_right * sweep).max(1.0));

            *l += (wet_l - *l) * self.amount;
            *r += (wet_r - *r) * self.amount;
        }
    }
}
