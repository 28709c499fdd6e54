//! Divide-down organ/string oscillator.
//!
//! Like the top-octave-divider chips of string machines: one fast phase
//! counts through eight segments, and four saws at 8', 4', 2' and 1'
//! footages are derived from it. A seven-entry registration (alternating
//! saw and square footages) is turned into gains for the four saws, since a
//! square at one footage is the difference of two saws an octave apart.
//! Each saw step is BLEP-corrected where its segment wraps.

use crate::dsp::parameter_interpolator::ParameterInterpolator;
use crate::dsp::polyblep::{next_blep_sample, this_blep_sample};

pub const NUM_REGISTRATION_STOPS: usize = 7;

#[derive(Debug, Clone, Copy, Default)]
pub struct StringSynthOscillator {
    phase: f32,
    next_sample: f32,
    segment: i32,

    frequency: f32,
    saw_8_gain: f32,
    saw_4_gain: f32,
    saw_2_gain: f32,
    saw_1_gain: f32,
}

impl StringSynthOscillator {
    pub fn new() -> Self {
        let mut oscillator = Self::default();
        oscillator.reset();
        oscillator
    }

    pub fn reset(&mut self) {
        *self = Self {
            frequency: 0.001,
            ..Self::default()
        };
    }

    /// Adds the registered mix into `out`. Registrations shift up by an
    /// octave each time the fastest divider would exceed Nyquist; nothing is
    /// rendered once every stop is out of range.
    pub fn render(
        &mut self,
        frequency: f32,
        unshifted_registration: &[f32; NUM_REGISTRATION_STOPS],
        gain: f32,
        out: &mut [f32],
    ) {
        let size = out.len();
        let mut frequency = frequency.max(0.0) * 8.0;

        let mut shift = 0;
        while frequency > 0.5 {
            shift += 2;
            frequency *= 0.5;
        }
        if shift >= 8 {
            return;
        }

        let mut registration = [0.0; NUM_REGISTRATION_STOPS];
        registration[shift..].copy_from_slice(&unshifted_registration[..NUM_REGISTRATION_STOPS - shift]);

        let mut fm = ParameterInterpolator::new(&mut self.frequency, frequency, size);
        let mut saw_8_gain_modulation = ParameterInterpolator::new(
            &mut self.saw_8_gain,
            (registration[0] + 2.0 * registration[1]) * gain,
            size,
        );
        let mut saw_4_gain_modulation = ParameterInterpolator::new(
            &mut self.saw_4_gain,
            (registration[2] - registration[1] + 2.0 * registration[3]) * gain,
            size,
        );
        let mut saw_2_gain_modulation = ParameterInterpolator::new(
            &mut self.saw_2_gain,
            (registration[4] - registration[3] + 2.0 * registration[5]) * gain,
            size,
        );
        let mut saw_1_gain_modulation = ParameterInterpolator::new(
            &mut self.saw_1_gain,
            (registration[6] - registration[5]) * gain,
            size,
        );

        let mut phase = self.phase;
        let mut next_sample = self.next_sample;
        let mut segment = self.segment;

        for sample in out.iter_mut() {
            let mut this_sample = next_sample;
            next_sample = 0.0;

            let frequency = fm.next();
            let saw_8_gain = saw_8_gain_modulation.next();
            let saw_4_gain = saw_4_gain_modulation.next();
            let saw_2_gain = saw_2_gain_modulation.next();
            let saw_1_gain = saw_1_gain_modulation.next();

            phase += frequency;
            let mut next_segment = phase as i32;
            if next_segment != segment {
                let mut discontinuity = 0.0;
                if next_segment >= 8 {
                    phase -= 8.0;
                    next_segment -= 8;
                    discontinuity -= saw_8_gain;
                }
                if next_segment & 3 == 0 {
                    discontinuity -= saw_4_gain;
                }
                if next_segment & 1 == 0 {
                    discontinuity -= saw_2_gain;
                }
                discontinuity -= saw_1_gain;
                if discontinuity != 0.0 && frequency > 0.0 {
                    let fraction = phase - next_segment as f32;
                    let t = (fraction / frequency).clamp(0.0, 1.0);
                    this_sample += this_blep_sample(t) * discontinuity;
                    next_sample += next_blep_sample(t) * discontinuity;
                }
            }
            segment = next_segment;

            next_sample += (phase - 4.0) * saw_8_gain * 0.125;
            next_sample += (phase - (segment & 4) as f32 - 2.0) * saw_4_gain * 0.25;
            next_sample += (phase - (segment & 6) as f32 - 1.0) * saw_2_gain * 0.5;
            next_sample += (phase - (segment & 7) as f32 - 0.5) * saw_1_gain;
            *sample += 2.0 * this_sample;
        }

        self.next_sample = next_sample;
        self.phase = phase;
        self.segment = segment;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_registration_is_bounded() {
        let mut osc = StringSynthOscillator::new();
        let registration = [1.0; NUM_REGISTRATION_STOPS];
        let mut out = [0.0; 12];
        for _ in 0..400 {
            out.fill(0.0);
            osc.render(0.002, &registration, 0.1, &mut out);
            assert!(out.iter().all(|x| x.is_finite() && x.abs() < 2.0));
        }
    }

    #[test]
    fn too_high_renders_nothing() {
        let mut osc = StringSynthOscillator::new();
        let mut out = [0.0; 12];
        osc.render(2.0, &[1.0; NUM_REGISTRATION_STOPS], 1.0, &mut out);
        assert!(out.iter().all(|&x| x == 0.0));
    }
}
