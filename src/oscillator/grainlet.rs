//! Windowed sine bursts ("grainlets") restarted at the carrier frequency.
//!
//! Each carrier period plays one grain: a formant sine multiplied by a
//! window whose shape morphs from a short click, through a symmetric bell,
//! to a long plateau. `bleed` mixes some of the raw window in so the carrier
//! pitch stays audible at extreme formant settings.

use crate::dsp::parameter_interpolator::ParameterInterpolator;
use crate::dsp::polyblep::{next_blep_sample, this_blep_sample};
use crate::dsp::tables::sine;

const MAX_FREQUENCY: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default)]
pub struct GrainletOscillator {
    carrier_phase: f32,
    formant_phase: f32,
    next_sample: f32,

    carrier_frequency: f32,
    formant_frequency: f32,
    carrier_shape: f32,
    carrier_bleed: f32,
}

impl GrainletOscillator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn render(
        &mut self,
        carrier_frequency: f32,
        formant_frequency: f32,
        carrier_shape: f32,
        carrier_bleed: f32,
        out: &mut [f32],
    ) {
        let size = out.len();
        let carrier_frequency = carrier_frequency.clamp(0.000_001, MAX_FREQUENCY * 0.5);
        let formant_frequency = formant_frequency.clamp(0.0, MAX_FREQUENCY);

        let mut f0_modulation = ParameterInterpolator::new(&mut self.carrier_frequency, carrier_frequency, size);
        let mut f1_modulation = ParameterInterpolator::new(&mut self.formant_frequency, formant_frequency, size);
        let mut shape_modulation =
            ParameterInterpolator::new(&mut self.carrier_shape, carrier_shape.clamp(0.0, 1.0), size);
        let mut bleed_modulation =
            ParameterInterpolator::new(&mut self.carrier_bleed, carrier_bleed.max(0.0), size);

        let mut next_sample = self.next_sample;
        for sample in out.iter_mut() {
            let mut this_sample = next_sample;
            next_sample = 0.0;

            let f0 = f0_modulation.next();
            let f1 = f1_modulation.next();

            self.carrier_phase += f0;
            if self.carrier_phase >= 1.0 {
                self.carrier_phase -= 1.0;
                let reset_time = self.carrier_phase / f0;
                let before = grainlet(
                    1.0,
                    self.formant_phase + (1.0 - reset_time) * f1,
                    shape_modulation.subsample(1.0 - reset_time),
                    bleed_modulation.subsample(1.0 - reset_time),
                );
                let after = grainlet(
                    0.0,
                    0.0,
                    shape_modulation.subsample(1.0),
                    bleed_modulation.subsample(1.0),
                );
                let discontinuity = after - before;
                this_sample += discontinuity * this_blep_sample(reset_time);
                next_sample += discontinuity * next_blep_sample(reset_time);
                self.formant_phase = reset_time * f1;
            } else {
                self.formant_phase += f1;
                if self.formant_phase >= 1.0 {
                    self.formant_phase -= 1.0;
                }
            }

            next_sample += grainlet(
                self.carrier_phase,
                self.formant_phase,
                shape_modulation.next(),
                bleed_modulation.next(),
            );
            *sample = this_sample;
        }
        self.next_sample = next_sample;
    }
}

/// Grain window, 0..0.5, over one carrier period.
#[inline]
fn carrier(phase: f32, shape: f32) -> f32 {
    let shape = shape * 3.0;
    let shape_integral = (shape as usize).min(2);
    let shape_fractional = shape - shape_integral as f32;
    let t = 1.0 - shape_fractional;

    let phase = match shape_integral {
        0 => (phase * (1.0 + t * t * t * 15.0)).min(1.0) + 0.75,
        1 => {
            let breakpoint = 0.001 + 0.499 * t * t * t;
            let phase = if phase < breakpoint {
                phase * 0.5 / breakpoint
            } else {
                0.5 + (phase - breakpoint) * 0.5 / (1.0 - breakpoint)
            };
            phase + 0.75
        }
        _ => {
            let t = 1.0 - t;
            (0.25 + phase * (0.5 + t * t * t * 14.5)).min(0.75)
        }
    };
    (sine(phase) + 1.0) * 0.25
}

#[inline]
fn grainlet(carrier_phase: f32, formant_phase: f32, shape: f32, bleed: f32) -> f32 {
    let carrier = carrier(carrier_phase, shape);
    let formant = sine(formant_phase);
    carrier * (formant + bleed) / (1.0 + bleed)
}
