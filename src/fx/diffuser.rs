//! Small all-pass diffuser with a short feedback loop.
//!
//! Turns the particle engine's clicks into a splashy, granular wash. Four
//! series all-passes (the last one slowly swept) smear the input, and a
//! damped loop through two more all-passes adds a short tail whose length
//! follows `rt`.

use crate::config::SampleRate;
use crate::dsp::delay::DelayLine;
use crate::dsp::lfo::Lfo;

use super::scaled_delay;

const SMALL: usize = 2048;
const LARGE: usize = 16384;
const KAP: f32 = 0.625;

const AP_LENGTHS: [f32; 3] = [126.0, 180.0, 269.0];
const AP4_TAP: f32 = 400.0;
const AP4_SWEEP: f32 = 43.0;
const DAPA: f32 = 1653.0;
const DAPB: f32 = 2010.0;
const DEL_TAP: f32 = 3070.0;
const DEL_SWEEP: f32 = 340.0;

pub struct Diffuser {
    ap: [DelayLine<SMALL>; 3],
    ap4: DelayLine<SMALL>,
    dapa: DelayLine<LARGE>,
    dapb: DelayLine<LARGE>,
    del: DelayLine<LARGE>,

    ap_lengths: [usize; 3],
    ap4_tap: f32,
    ap4_sweep: f32,
    dapa_length: usize,
    dapb_length: usize,
    del_tap: f32,
    del_sweep: f32,
    lfo_1: Lfo,
    lfo_2: Lfo,
    lp_decay: f32,
}

impl Diffuser {
    pub fn new(sample_rate: &SampleRate) -> Self {
        let mut diffuser = Self {
            ap: [DelayLine::new(), DelayLine::new(), DelayLine::new()],
            ap4: DelayLine::new(),
            dapa: DelayLine::new(),
            dapb: DelayLine::new(),
            del: DelayLine::new(),
            ap_lengths: [0; 3],
            ap4_tap: 0.0,
            ap4_sweep: 0.0,
            dapa_length: 0,
            dapb_length: 0,
            del_tap: 0.0,
            del_sweep: 0.0,
            lfo_1: Lfo::new(0.0),
            lfo_2: Lfo::new(0.0),
            lp_decay: 0.0,
        };
        diffuser.init(sample_rate);
        diffuser
    }

    pub fn init(&mut self, sample_rate: &SampleRate) {
        let ratio = sample_rate.rate_ratio();
        for (length, &tuned) in self.ap_lengths.iter_mut().zip(AP_LENGTHS.iter()) {
            *length = scaled_delay(tuned, sample_rate, SMALL);
        }
        self.ap4_tap = scaled_delay(AP4_TAP, sample_rate, SMALL) as f32;
        self.ap4_sweep = AP4_SWEEP / ratio;
        self.dapa_length = scaled_delay(DAPA, sample_rate, LARGE);
        self.dapb_length = scaled_delay(DAPB, sample_rate, LARGE);
        self.del_tap = scaled_delay(DEL_TAP, sample_rate, LARGE) as f32;
        self.del_sweep = DEL_SWEEP / ratio;
        self.lfo_1.set_frequency(0.3 * sample_rate.inv_sample_rate);
        self.lfo_2.set_frequency(0.5 * sample_rate.inv_sample_rate);
        self.clear();
    }

    pub fn clear(&mut self) {
        for line in self.ap.iter_mut() {
            line.reset();
        }
        self.ap4.reset();
        self.dapa.reset();
        self.dapb.reset();
        self.del.reset();
        self.lfo_1.reset();
        self.lfo_2.reset();
        self.lp_decay = 0.0;
    }

    /// Blends `amount` of the diffused signal into `in_out`. `rt` is the
    /// loop gain, 0..1.
    pub fn process(&mut self, amount: f32, rt: f32, in_out: &mut [f32]) {
        let amount = amount.clamp(0.0, 1.0);
        let rt = rt.clamp(0.0, 0.98);

        for sample in in_out.iter_mut() {
            let mut acc = *sample;
            for (line, &length) in self.ap.iter_mut().zip(self.ap_lengths.iter()) {
                acc = line.allpass(acc, length, KAP);
            }
            let ap4_delay = self.ap4_tap + self.lfo_1.next_sine() * self.ap4_sweep;
            acc = self.ap4.allpass_linear(acc, ap4_delay, KAP);

            let del_delay = self.del_tap + self.lfo_2.next_sine() * self.del_sweep;
            acc += self.del.read_linear(del_delay) * rt;
            self.lp_decay += 0.7 * (acc - self.lp_decay);
            acc = self.lp_decay;
            acc = self.dapa.allpass(acc, self.dapa_length, -KAP);
            acc = self.dapb.allpass(acc, self.dapb_length, KAP);
            self.del.write(acc);

            let wet = acc * 2.0;
            *sample += amount * (wet - *sample);
        }
    }
}
