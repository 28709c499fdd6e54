//! Fixed-capacity delay line with integer, linear, Hermite and all-pass taps.
//!
//! The write pointer walks backwards through the buffer, so `read(1)` is the
//! most recently written sample and `read(d)` is `d` writes ago. Capacity is
//! a const parameter; storage is allocated once in `new`.

use crate::dsp::units::split;

pub struct DelayLine<const N: usize> {
    buffer: Vec<f32>,
    write_pos: usize,
    delay: usize,
}

impl<const N: usize> Default for DelayLine<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> DelayLine<N> {
    pub fn new() -> Self {
        Self {
            buffer: vec![0.0; N],
            write_pos: 0,
            delay: N - 1,
        }
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Sets the default tap used by [`DelayLine::read_default`].
    pub fn set_delay(&mut self, delay: usize) {
        self.delay = delay.min(N - 1);
    }

    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + N - 1) % N;
    }

    /// Schroeder all-pass around an integer tap.
    #[inline]
    pub fn allpass(&mut self, sample: f32, delay: usize, coefficient: f32) -> f32 {
        let read = self.buffer[(self.write_pos + delay.min(N - 1)) % N];
        let write = sample + coefficient * read;
        self.write(write);
        -write * coefficient + read
    }

    /// All-pass around a linearly interpolated tap.
    #[inline]
    pub fn allpass_linear(&mut self, sample: f32, delay: f32, coefficient: f32) -> f32 {
        let read = self.read_linear(delay);
        let write = sample + coefficient * read;
        self.write(write);
        -write * coefficient + read
    }

    #[inline]
    pub fn write_read(&mut self, sample: f32, delay: f32) -> f32 {
        self.write(sample);
        self.read_linear(delay)
    }

    #[inline]
    pub fn read_default(&self) -> f32 {
        self.read(self.delay)
    }

    #[inline]
    pub fn read(&self, delay: usize) -> f32 {
        self.buffer[(self.write_pos + delay.min(N - 1)) % N]
    }

    /// Linearly interpolated tap. `delay` is clamped to the capacity.
    #[inline]
    pub fn read_linear(&self, delay: f32) -> f32 {
        let (integral, fractional) = split(delay.clamp(0.0, (N - 2) as f32));
        let a = self.buffer[(self.write_pos + integral) % N];
        let b = self.buffer[(self.write_pos + integral + 1) % N];
        a + (b - a) * fractional
    }

    /// Four-point Hermite tap, smoother under fast delay modulation.
    #[inline]
    pub fn read_hermite(&self, delay: f32) -> f32 {
        let (integral, t) = split(delay.clamp(1.0, (N - 3) as f32));
        let index = self.write_pos + integral;
        let xm1 = self.buffer[(index + N - 1) % N];
        let x0 = self.buffer[index % N];
        let x1 = self.buffer[(index + 1) % N];
        let x2 = self.buffer[(index + 2) % N];
        let c = (x1 - xm1) * 0.5;
        let v = x0 - x1;
        let w = c + v;
        let a = w + v + (x2 - x0) * 0.5;
        let b_neg = w + a;
        (((a * t) - b_neg) * t + c) * t + x0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_tap_returns_past_writes() {
        let mut line = DelayLine::<16>::new();
        for i in 1..=5 {
            line.write(i as f32);
        }
        assert_eq!(line.read(1), 5.0);
        assert_eq!(line.read(3), 3.0);
    }

    #[test]
    fn linear_tap_interpolates() {
        let mut line = DelayLine::<16>::new();
        line.write(0.0);
        line.write(1.0);
        assert!((line.read_linear(1.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn hermite_tap_matches_integer_tap() {
        let mut line = DelayLine::<32>::new();
        for i in 0..20 {
            line.write((i as f32 * 0.3).sin());
        }
        assert!((line.read_hermite(4.0) - line.read(4)).abs() < 1e-6);
    }

    #[test]
    fn oversized_delay_is_clamped() {
        let mut line = DelayLine::<8>::new();
        line.write(1.0);
        assert!(line.read_linear(1_000.0).is_finite());
        assert!(line.read(1_000).is_finite());
    }

    #[test]
    fn allpass_preserves_energy() {
        let mut line = DelayLine::<64>::new();
        let mut energy_in = 0.0;
        let mut energy_out = 0.0;
        for i in 0..2_000 {
            let input = if i < 10 { 1.0 } else { 0.0 };
            let output = line.allpass(input, 13, 0.5);
            energy_in += input * input;
            energy_out += output * output;
        }
        assert!((energy_out - energy_in).abs() / energy_in < 0.05);
    }
}
