//! Two hard-synced square waves.
//!
//! Below `shape` 0.5 the slave runs slower than the master and gets cut
//! short by each master reset, which sounds like PWM. Above 0.5 the slave
//! runs faster, giving the classic swept sync sound. Pulse width and
//! waveshape are fixed, which keeps the edge bookkeeping small.

use crate::dsp::oscillator::MAX_FREQUENCY;
use crate::dsp::parameter_interpolator::ParameterInterpolator;
use crate::dsp::polyblep::{next_blep_sample, this_blep_sample};

#[derive(Debug, Clone, Copy, Default)]
pub struct SuperSquareOscillator {
    master_phase: f32,
    slave_phase: f32,
    next_sample: f32,
    high: bool,

    master_frequency: f32,
    slave_frequency: f32,
}

impl SuperSquareOscillator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn render(&mut self, frequency: f32, shape: f32, out: &mut [f32]) {
        let size = out.len();
        let shape = shape.clamp(0.0, 1.0);
        let master_frequency = frequency.clamp(0.000_001, MAX_FREQUENCY);
        let ratio = if shape < 0.5 {
            0.51 + 0.98 * shape
        } else {
            1.0 + 16.0 * (shape - 0.5) * (shape - 0.5)
        };
        let slave_frequency = (master_frequency * ratio).min(MAX_FREQUENCY);

        let mut master_fm = ParameterInterpolator::new(&mut self.master_frequency, master_frequency, size);
        let mut slave_fm = ParameterInterpolator::new(&mut self.slave_frequency, slave_frequency, size);

        let mut next_sample = self.next_sample;
        for sample in out.iter_mut() {
            let mut this_sample = next_sample;
            next_sample = 0.0;

            let master_frequency = master_fm.next();
            let slave_frequency = slave_fm.next();

            let mut reset_time = None;
            self.master_phase += master_frequency;
            if self.master_phase >= 1.0 {
                self.master_phase -= 1.0;
                let t = (self.master_phase / master_frequency).clamp(0.0, 1.0);
                let slave_phase_at_reset = self.slave_phase + (1.0 - t) * slave_frequency;
                // A rise and fall both inside this sample cancel out.
                if self.high && slave_phase_at_reset < 1.0 {
                    this_sample -= this_blep_sample(t);
                    next_sample -= next_blep_sample(t);
                }
                reset_time = Some(t);
            }

            self.slave_phase += slave_frequency;
            match reset_time {
                Some(t) => {
                    self.slave_phase = t * slave_frequency;
                    self.high = false;
                }
                None => {
                    if !self.high && self.slave_phase >= 0.5 {
                        let t = ((self.slave_phase - 0.5) / slave_frequency).clamp(0.0, 1.0);
                        this_sample += this_blep_sample(t);
                        next_sample += next_blep_sample(t);
                        self.high = true;
                    }
                    if self.slave_phase >= 1.0 {
                        self.slave_phase -= 1.0;
                        let t = (self.slave_phase / slave_frequency).clamp(0.0, 1.0);
                        this_sample -= this_blep_sample(t);
                        next_sample -= next_blep_sample(t);
                        self.high = false;
                    }
                }
            }

            next_sample += if self.slave_phase < 0.5 { 0.0 } else { 1.0 };
            *sample = 2.0 * this_sample - 1.0;
        }
        self.next_sample = next_sample;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_bounded_across_shapes() {
        for shape in [0.0, 0.3, 0.5, 0.8, 1.0] {
            let mut osc = SuperSquareOscillator::new();
            let mut out = [0.0; 12];
            for _ in 0..400 {
                osc.render(0.004, shape, &mut out);
                assert!(out.iter().all(|x| x.abs() < 1.6), "shape {}", shape);
            }
        }
    }

    #[test]
    fn unity_ratio_is_a_plain_square() {
        let mut osc = SuperSquareOscillator::new();
        let mut out = vec![0.0; 4_800];
        for chunk in out.chunks_mut(12) {
            osc.render(0.01, 0.5, chunk);
        }
        let mean = out[1_200..].iter().sum::<f32>() / 3_600.0;
        assert!(mean.abs() < 0.05, "square should be centred, mean {}", mean);
    }
}
