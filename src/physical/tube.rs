//! Reed and bore waveguide, the blown half of the resonator voice.
//!
//! ```text
//!   breath ──→(+)──→ reed ──→ [bore delay] ──→ ×(-0.95) ──┐
//!              ↑                                          │
//!              └──────────────────────────────────────────┘
//! ```
//!
//! The reed is a clipped linear table: the larger the pressure difference
//! across it, the more it closes. The loop value is clamped to [-5, 5]
//! before it is written back into the bore, so no setting can make the loop
//! run away.

use crate::dsp::delay::DelayLine;
use crate::dsp::units::one_pole;

pub const TUBE_DELAY_SIZE: usize = 2048;
/// Bound on the value circulating in the bore.
pub const TUBE_CLAMP: f32 = 5.0;

pub struct Tube {
    bore: DelayLine<TUBE_DELAY_SIZE>,
    lp_state: f32,
}

impl Default for Tube {
    fn default() -> Self {
        Self::new()
    }
}

impl Tube {
    pub fn new() -> Self {
        Self {
            bore: DelayLine::new(),
            lp_state: 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.bore.reset();
        self.lp_state = 0.0;
    }

    #[inline]
    fn reed(pressure_delta: f32) -> f32 {
        (0.7 - 0.2 * pressure_delta).clamp(-1.0, 1.0)
    }

    /// Blows `in_out` (the breath signal) into the tube and adds the tube
    /// output back onto it, in place.
    ///
    /// `envelope` scales the output, `damping` the breath pressure and
    /// `timbre` the brightness of the bore.
    pub fn process(
        &mut self,
        frequency: f32,
        envelope: f32,
        damping: f32,
        timbre: f32,
        in_out: &mut [f32],
        gain: f32,
    ) {
        let mut delay = 1.0 / frequency.max(1e-6);
        while delay >= (TUBE_DELAY_SIZE - 2) as f32 {
            delay *= 0.5;
        }
        // The bore's low-pass adds roughly one sample of delay.
        let delay = (delay - 1.0).max(1.0);

        let lpf_coefficient = (frequency * (1.0 + timbre * timbre * 256.0)).clamp(0.0001, 0.995);
        let damping = damping.clamp(0.0, 1.0);

        for sample in in_out.iter_mut() {
            let breath = *sample * (1.0 - 0.5 * damping);
            let bore = self.bore.read_linear(delay);
            let pressure_delta = -0.95 * bore - breath;
            let mut value = breath + pressure_delta * Self::reed(pressure_delta);
            value = value.clamp(-TUBE_CLAMP, TUBE_CLAMP);
            one_pole(&mut self.lp_state, value, lpf_coefficient);
            self.bore.write(self.lp_state);
            *sample += gain * envelope * self.lp_state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_tube_is_silent() {
        let mut tube = Tube::new();
        let mut buffer = [0.0; 24];
        tube.process(0.01, 1.0, 0.0, 0.5, &mut buffer, 1.0);
        assert!(buffer.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn impulse_is_bounded_and_decays() {
        let mut tube = Tube::new();
        let frequency = 220.0 / 48_000.0;
        assert!(1.0 / frequency < TUBE_DELAY_SIZE as f32);
        let mut response = Vec::new();
        for n in 0..400 {
            let mut buffer = [0.0; 24];
            if n == 0 {
                buffer[0] = 1.0;
            }
            tube.process(frequency, 1.0, 0.0, 0.5, &mut buffer, 1.0);
            if n == 0 {
                buffer[0] -= 1.0;
            }
            response.extend_from_slice(&buffer);
        }
        assert!(response.iter().all(|x| x.abs() <= TUBE_CLAMP));
        let head: f32 = response[..2_400].iter().map(|x| x * x).sum();
        let tail: f32 = response[7_200..].iter().map(|x| x * x).sum();
        assert!(head > 0.0);
        assert!(tail < head, "head {} tail {}", head, tail);
    }

    #[test]
    fn sustained_breath_stays_bounded() {
        let mut tube = Tube::new();
        for _ in 0..2_000 {
            let mut buffer = [3.0; 24];
            tube.process(0.002, 1.0, 0.2, 1.0, &mut buffer, 1.0);
            assert!(buffer.iter().all(|x| x.is_finite() && (x - 3.0).abs() <= TUBE_CLAMP));
        }
    }
}
