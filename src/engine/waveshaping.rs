//! Slope oscillator through a waveshaper and a wavefolder.

use crate::config::SampleRate;
use crate::dsp::oscillator::{Oscillator, OscillatorShape};
use crate::dsp::tables::{FOLD, FOLD_2, FOLD_SIZE, NUM_WAVESHAPERS, SINE, SINE_SIZE, WAVESHAPERS, WAVESHAPER_SIZE};
use crate::dsp::units::{interpolate, interpolate_hermite, interpolate_wrap};
use crate::dsp::ParameterInterpolator;

use super::{Engine, EngineParameters, ScratchBuffers};

/// How much of a control's range is safe at `f0` before the harmonics it
/// adds fold back past Nyquist. `harmonics` estimates how far the spectrum
/// already extends.
fn tame(f0: f32, harmonics: f32, order: f32) -> f32 {
    let f0 = f0 * harmonics;
    let max_f = 0.5 / order;
    let max_amount = (1.0 - (f0 - max_f) / 0.5).clamp(0.0, 1.0);
    max_amount * max_amount * max_amount
}

#[derive(Debug, Clone)]
pub struct WaveshapingEngine {
    sample_rate: SampleRate,
    slope: Oscillator,
    triangle: Oscillator,

    previous_shape: f32,
    previous_wavefolder_gain: f32,
    previous_overtone_gain: f32,
}

impl Default for WaveshapingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveshapingEngine {
    pub fn new() -> Self {
        Self {
            sample_rate: SampleRate::default(),
            slope: Oscillator::new(),
            triangle: Oscillator::new(),
            previous_shape: 0.0,
            previous_wavefolder_gain: 0.0,
            previous_overtone_gain: 0.0,
        }
    }
}

impl Engine for WaveshapingEngine {
    fn init(&mut self, sample_rate: &SampleRate) {
        self.sample_rate = *sample_rate;
        self.slope.reset();
        self.triangle.reset();
        self.previous_shape = 0.0;
        self.previous_wavefolder_gain = 0.0;
        self.previous_overtone_gain = 0.0;
    }

    fn render(
        &mut self,
        parameters: &EngineParameters,
        _scratch: &mut ScratchBuffers,
        out: &mut [f32],
        aux: &mut [f32],
        _already_enveloped: &mut bool,
    ) {
        let size = out.len();
        let f0 = self.sample_rate.note_to_frequency(parameters.note);
        let pw = parameters.morph * 0.45 + 0.5;

        self.slope.render(OscillatorShape::Slope, f0, pw, None, out);
        self.triangle.render(OscillatorShape::Slope, f0, 0.5, None, aux);

        // The more asymmetric the slope, the richer the input spectrum and
        // the less shaping it takes.
        let slope = 3.0 + (parameters.morph - 0.5).abs() * 5.0;
        let shape_amount = (parameters.harmonics - 0.5).abs() * 2.0;
        let shape_amount_attenuation = tame(f0, slope, 16.0);
        let wavefolder_gain = parameters.timbre;
        let wavefolder_gain_attenuation = tame(
            f0,
            slope * (3.0 + shape_amount * shape_amount_attenuation * 5.0),
            12.0,
        );

        let mut shape_modulation = ParameterInterpolator::new(
            &mut self.previous_shape,
            0.5 + (parameters.harmonics - 0.5) * shape_amount_attenuation,
            size,
        );
        let mut wf_gain_modulation = ParameterInterpolator::new(
            &mut self.previous_wavefolder_gain,
            0.03 + 0.46 * wavefolder_gain * wavefolder_gain_attenuation,
            size,
        );
        let overtone_gain = parameters.timbre * (2.0 - parameters.timbre);
        let mut overtone_gain_modulation = ParameterInterpolator::new(
            &mut self.previous_overtone_gain,
            overtone_gain * (2.0 - overtone_gain),
            size,
        );

        let last_shaper = (NUM_WAVESHAPERS - 2) as f32 + 0.9999;
        for (o, a) in out.iter_mut().zip(aux.iter_mut()) {
            let shape = shape_modulation.next().clamp(0.0, 1.0) * last_shaper;
            let shape_integral = shape as usize;
            let shape_fractional = shape - shape_integral as f32;

            let ws_index = 0.5 + 0.5 * o.clamp(-1.0, 1.0);
            let x = interpolate(&WAVESHAPERS[shape_integral], ws_index, WAVESHAPER_SIZE as f32);
            let y = interpolate(&WAVESHAPERS[shape_integral + 1], ws_index, WAVESHAPER_SIZE as f32);
            let mix = x + (y - x) * shape_fractional;

            let index = mix * wf_gain_modulation.next() + 0.5;
            let fold = interpolate_hermite(&FOLD, index, FOLD_SIZE as f32);
            let fold_2 = -interpolate_hermite(&FOLD_2, index, FOLD_SIZE as f32);

            let sine = interpolate_wrap(&SINE, *a * 0.25 + 0.5, SINE_SIZE as f32);
            *o = fold;
            *a = sine + (fold_2 - sine) * overtone_gain_modulation.next();
        }
    }
}
