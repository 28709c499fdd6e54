//! Quantizer with hysteresis, for turning a noisy control into a stable index.

/*
    index
      3 ┤                    ┌──────
      2 ┤            ┌───────┘
      1 ┤    ┌───────┘
      0 ┼────┘
        └────┬───────┬───────┬──────→ value
            0.5     1.5     2.5        (thresholds without hysteresis)

With hysteresis h, moving up requires crossing k + 0.5 + h and moving down
requires crossing k + 0.5 - h. A CV hovering near a boundary therefore never
flips the selection back and forth.
*/

#[derive(Debug, Clone, Copy)]
pub struct HysteresisQuantizer {
    num_steps: usize,
    hysteresis: f32,
    scale: f32,
    quantized_value: i32,
}

impl HysteresisQuantizer {
    /// `symmetric` maps the value range [0, 1] onto the first and last step;
    /// otherwise one unit of value spans `num_steps` steps.
    pub fn new(num_steps: usize, hysteresis: f32, symmetric: bool) -> Self {
        let num_steps = num_steps.max(1);
        let scale = if symmetric {
            (num_steps - 1) as f32
        } else {
            num_steps as f32
        };
        Self {
            num_steps,
            hysteresis,
            scale,
            quantized_value: 0,
        }
    }

    pub fn reset(&mut self) {
        self.quantized_value = 0;
    }

    #[inline]
    pub fn process(&mut self, value: f32) -> usize {
        self.process_with_base(0, value)
    }

    /// Quantizes `base + value * scale`.
    #[inline]
    pub fn process_with_base(&mut self, base: i32, value: f32) -> usize {
        let value = if value.is_finite() { value } else { 0.0 };
        let value = value * self.scale + base as f32;
        let feedback = if value > self.quantized_value as f32 {
            -self.hysteresis
        } else {
            self.hysteresis
        };
        let q = (value + feedback + 0.5).floor() as i32;
        self.quantized_value = q.clamp(0, self.num_steps as i32 - 1);
        self.quantized_value as usize
    }

    #[inline]
    pub fn quantized_value(&self) -> usize {
        self.quantized_value as usize
    }

    pub fn num_steps(&self) -> usize {
        self.num_steps
    }
}
