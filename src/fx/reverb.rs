//! Reverb - a diffuser feeding a two-branch all-pass loop.
//!
//! ```text
//!                         ┌──────── del2 (modulated) ◄──────────────┐
//!                         ▼                                         │
//! in ──► AP1─AP2─AP3─AP4 ─┬─► (+) ─► LP ─► DAP1a ─► DAP1b ─► del1 ──┤──► left
//!                         │                                         │
//!                         └─► (+) ─► LP ─► DAP2a ─► DAP2b ─► del2 ──┘──► right
//!                              ▲                                │
//!                              └────────────── del1 ◄───────────┘
//! ```
//!
//! The input is smeared by four series all-passes, then injected into a
//! figure-eight loop: each branch reads the other branch's delay, damps it
//! with a one-pole low-pass and diffuses it further before writing its own
//! delay. The long read of the second branch is swept by a slow LFO, which
//! keeps the tail from ringing at fixed modes.
//!
//! # Parameters
//!
//! - **amount**: dry/wet blend
//! - **time**: loop gain, 0..1 (longer tails towards 1)
//! - **diffusion**: all-pass coefficient
//! - **lp**: damping low-pass coefficient (lower = darker tail)
//! - **input_gain**: level into the diffuser

use crate::config::SampleRate;
use crate::dsp::delay::DelayLine;
use crate::dsp::lfo::Lfo;

use super::scaled_delay;

const SMALL: usize = 4096;
const LARGE: usize = 32768;

const AP_LENGTHS: [f32; 4] = [150.0, 214.0, 319.0, 527.0];
const DAP1A: f32 = 2182.0;
const DAP1B: f32 = 2690.0;
const DEL1: f32 = 4501.0;
const DAP2A: f32 = 2525.0;
const DAP2B: f32 = 2197.0;
/// Centre and sweep of the modulated read of `del2`, which holds 6312
/// samples at 48 kHz.
const DEL2_TAP: f32 = 6211.0;
const DEL2_SWEEP: f32 = 100.0;
const LFO_HZ: f32 = 0.45;

pub struct Reverb {
    ap: [DelayLine<SMALL>; 4],
    dap1a: DelayLine<LARGE>,
    dap1b: DelayLine<LARGE>,
    del1: DelayLine<LARGE>,
    dap2a: DelayLine<LARGE>,
    dap2b: DelayLine<LARGE>,
    del2: DelayLine<LARGE>,

    ap_lengths: [usize; 4],
    dap1a_length: usize,
    dap1b_length: usize,
    del1_length: usize,
    dap2a_length: usize,
    dap2b_length: usize,
    del2_tap: f32,
    del2_sweep: f32,
    lfo: Lfo,

    lp_decay_1: f32,
    lp_decay_2: f32,

    amount: f32,
    input_gain: f32,
    reverb_time: f32,
    diffusion: f32,
    lp: f32,
}

impl Reverb {
    pub fn new(sample_rate: &SampleRate) -> Self {
        let mut reverb = Self {
            ap: [DelayLine::new(), DelayLine::new(), DelayLine::new(), DelayLine::new()],
            dap1a: DelayLine::new(),
            dap1b: DelayLine::new(),
            del1: DelayLine::new(),
            dap2a: DelayLine::new(),
            dap2b: DelayLine::new(),
            del2: DelayLine::new(),
            ap_lengths: [0; 4],
            dap1a_length: 0,
            dap1b_length: 0,
            del1_length: 0,
            dap2a_length: 0,
            dap2b_length: 0,
            del2_tap: 0.0,
            del2_sweep: 0.0,
            lfo: Lfo::new(0.0),
            lp_decay_1: 0.0,
            lp_decay_2: 0.0,
            amount: 0.0,
            input_gain: 0.2,
            reverb_time: 0.5,
            diffusion: 0.625,
            lp: 0.7,
        };
        reverb.init(sample_rate);
        reverb
    }

    /// Rescales every delay for `sample_rate` and clears the tail.
    pub fn init(&mut self, sample_rate: &SampleRate) {
        for (length, &tuned) in self.ap_lengths.iter_mut().zip(AP_LENGTHS.iter()) {
            *length = scaled_delay(tuned, sample_rate, SMALL);
        }
        self.dap1a_length = scaled_delay(DAP1A, sample_rate, LARGE);
        self.dap1b_length = scaled_delay(DAP1B, sample_rate, LARGE);
        self.del1_length = scaled_delay(DEL1, sample_rate, LARGE);
        self.dap2a_length = scaled_delay(DAP2A, sample_rate, LARGE);
        self.dap2b_length = scaled_delay(DAP2B, sample_rate, LARGE);
        self.del2_tap = scaled_delay(DEL2_TAP, sample_rate, LARGE) as f32;
        self.del2_sweep = DEL2_SWEEP / sample_rate.rate_ratio();
        self.lfo.set_frequency(LFO_HZ * sample_rate.inv_sample_rate);
        self.clear();
    }

    /// Silences the tail.
    pub fn clear(&mut self) {
        for line in self.ap.iter_mut() {
            line.reset();
        }
        self.dap1a.reset();
        self.dap1b.reset();
        self.del1.reset();
        self.dap2a.reset();
        self.dap2b.reset();
        self.del2.reset();
        self.lfo.reset();
        self.lp_decay_1 = 0.0;
        self.lp_decay_2 = 0.0;
    }

    pub fn set_amount(&mut self, amount: f32) {
        self.amount = amount.clamp(0.0, 1.0);
    }

    pub fn set_input_gain(&mut self, input_gain: f32) {
        self.input_gain = input_gain.clamp(0.0, 1.0);
    }

    /// Loop gain; kept just below 1 so the tail always dies out.
    pub fn set_time(&mut self, time: f32) {
        self.reverb_time = time.clamp(0.0, 0.98);
    }

    pub fn set_diffusion(&mut self, diffusion: f32) {
        self.diffusion = diffusion.clamp(0.0, 0.9);
    }

    pub fn set_lp(&mut self, lp: f32) {
        self.lp = lp.clamp(0.0, 1.0);
    }

    /// Processes the stereo pair in place.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let kap = self.diffusion;
        let klp = self.lp;
        let krt = self.reverb_time;
        let amount = self.amount;
        let gain = self.input_gain;

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let mut apout = (*l + *r) * gain;
            for (line, &length) in self.ap.iter_mut().zip(self.ap_lengths.iter()) {
                apout = line.allpass(apout, length, kap);
            }

            let sweep = self.lfo.next_sine() * self.del2_sweep;
            let mut acc = apout + self.del2.read_linear(self.del2_tap + sweep) * krt;
            self.lp_decay_1 += klp * (acc - self.lp_decay_1);
            acc = self.lp_decay_1;
            acc = self.dap1a.allpass(acc, self.dap1a_length, -kap);
            acc = self.dap1b.allpass(acc, self.dap1b_length, kap);
            self.del1.write(acc);
            let wet = acc * 2.0;
            *l += (wet - *l) * amount;

            let mut acc = apout + self.del1.read(self.del1_length) * krt;
            self.lp_decay_2 += klp * (acc - self.lp_decay_2);
            acc = self.lp_decay_2;
            acc = self.dap2a.allpass(acc, self.dap2a_length, kap);
            acc = self.dap2b.allpass(acc, self.dap2b_length, -kap);
            self.del2.write(acc);
            let wet = acc * 2.0;
            *r += (wet - *r) * amount;
        }
    }
}
