//! Continuously variable waveform: triangle → saw → square, with hard sync.
//!
//! `waveshape` 0.0 is a triangle (with a movable peak set by `pw`), 0.5 a
//! saw and 1.0 a pulse of width `pw`. With `SYNC`, a master phase resets the
//! slave at the master frequency; the reset is itself a discontinuity and is
//! corrected like any other edge.

use crate::dsp::oscillator::MAX_FREQUENCY;
use crate::dsp::parameter_interpolator::ParameterInterpolator;
use crate::dsp::units::saturate;
use crate::dsp::polyblep::{
    next_blep_sample, next_integrated_blep_sample, this_blep_sample, this_integrated_blep_sample,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct VariableShapeOscillator {
    master_phase: f32,
    slave_phase: f32,
    next_sample: f32,
    previous_pw: f32,
    high: bool,

    master_frequency: f32,
    slave_frequency: f32,
    pw: f32,
    waveshape: f32,
}

impl VariableShapeOscillator {
    pub fn new() -> Self {
        let mut oscillator = Self::default();
        oscillator.reset();
        oscillator
    }

    pub fn reset(&mut self) {
        self.master_phase = 0.0;
        self.slave_phase = 0.0;
        self.next_sample = 0.0;
        self.previous_pw = 0.5;
        self.high = false;
        self.master_frequency = 0.0;
        self.slave_frequency = 0.01;
        self.pw = 0.5;
        self.waveshape = 0.0;
    }

    /// Offsets the master phase so two oscillators of the same frequency
    /// do not reset together.
    pub fn set_master_phase(&mut self, phase: f32) {
        self.master_phase = phase - phase.floor();
    }

    #[inline]
    pub fn phase(&self) -> f32 {
        self.slave_phase
    }

    pub fn render<const SYNC: bool>(
        &mut self,
        master_frequency: f32,
        frequency: f32,
        pw: f32,
        waveshape: f32,
        out: &mut [f32],
    ) {
        let size = out.len();
        let master_frequency = saturate(master_frequency, 0.0, MAX_FREQUENCY);
        let frequency = saturate(frequency, 0.000_001, MAX_FREQUENCY);
        let pw = if frequency >= 0.25 {
            0.5
        } else {
            saturate(pw, frequency * 2.0, 1.0 - 2.0 * frequency)
        };

        let mut master_fm = ParameterInterpolator::new(&mut self.master_frequency, master_frequency, size);
        let mut fm = ParameterInterpolator::new(&mut self.slave_frequency, frequency, size);
        let mut pwm = ParameterInterpolator::new(&mut self.pw, pw, size);
        let mut waveshape_modulation =
            ParameterInterpolator::new(&mut self.waveshape, saturate(waveshape, 0.0, 1.0), size);

        let mut next_sample = self.next_sample;
        for sample in out.iter_mut() {
            let mut reset = false;
            let mut transition_during_reset = false;
            let mut reset_time = 0.0;

            let mut this_sample = next_sample;
            next_sample = 0.0;

            let master_frequency = master_fm.next();
            let frequency = fm.next();
            let pw = pwm.next();
            let waveshape = waveshape_modulation.next();
            let square_amount = ((waveshape - 0.5) * 2.0).max(0.0);
            let triangle_amount = (1.0 - waveshape * 2.0).max(0.0);
            let slope_up = 1.0 / pw;
            let slope_down = 1.0 / (1.0 - pw);

            if SYNC && master_frequency > 0.0 {
                self.master_phase += master_frequency;
                if self.master_phase >= 1.0 {
                    self.master_phase -= 1.0;
                    reset_time = (self.master_phase / master_frequency).clamp(0.0, 1.0);

                    let mut slave_phase_at_reset = self.slave_phase + (1.0 - reset_time) * frequency;
                    reset = true;
                    if slave_phase_at_reset >= 1.0 {
                        slave_phase_at_reset -= 1.0;
                        transition_during_reset = true;
                    }
                    if !self.high && slave_phase_at_reset >= pw {
                        transition_during_reset = true;
                    }
                    let value = naive_sample(
                        slave_phase_at_reset,
                        pw,
                        slope_up,
                        slope_down,
                        triangle_amount,
                        square_amount,
                    );
                    this_sample -= value * this_blep_sample(reset_time);
                    next_sample -= value * next_blep_sample(reset_time);
                }
            }

            self.slave_phase += frequency;
            if transition_during_reset || !reset {
                loop {
                    if !self.high {
                        if self.slave_phase < pw {
                            break;
                        }
                        let t = ((self.slave_phase - pw) / (self.previous_pw - pw + frequency))
                            .clamp(0.0, 1.0);
                        let triangle_step = (slope_up + slope_down) * frequency * triangle_amount;

                        this_sample += square_amount * this_blep_sample(t);
                        next_sample += square_amount * next_blep_sample(t);
                        this_sample -= triangle_step * this_integrated_blep_sample(t);
                        next_sample -= triangle_step * next_integrated_blep_sample(t);
                        self.high = true;
                    }
                    if self.slave_phase < 1.0 {
                        break;
                    }
                    self.slave_phase -= 1.0;
                    let t = (self.slave_phase / frequency).clamp(0.0, 1.0);
                    let triangle_step = (slope_up + slope_down) * frequency * triangle_amount;

                    this_sample -= (1.0 - triangle_amount) * this_blep_sample(t);
                    next_sample -= (1.0 - triangle_amount) * next_blep_sample(t);
                    this_sample += triangle_step * this_integrated_blep_sample(t);
                    next_sample += triangle_step * next_integrated_blep_sample(t);
                    self.high = false;
                }
            }

            if SYNC && reset {
                self.slave_phase = reset_time * frequency;
                self.high = false;
            }

            next_sample += naive_sample(
                self.slave_phase,
                pw,
                slope_up,
                slope_down,
                triangle_amount,
                square_amount,
            );
            self.previous_pw = pw;

            *sample = 2.0 * this_sample - 1.0;
        }
        self.next_sample = next_sample;
    }
}

#[inline]
fn naive_sample(
    phase: f32,
    pw: f32,
    slope_up: f32,
    slope_down: f32,
    triangle_amount: f32,
    square_amount: f32,
) -> f32 {
    let mut saw = phase;
    let square = if phase < pw { 0.0 } else { 1.0 };
    let triangle = if phase < pw {
        phase * slope_up
    } else {
        1.0 - (phase - pw) * slope_down
    };
    saw += (square - saw) * square_amount;
    saw += (triangle - saw) * triangle_amount;
    saw
}
