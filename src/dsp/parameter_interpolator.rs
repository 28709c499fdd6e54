//! Per-block linear parameter ramps.

/*
Why ramp every control?
=======================

Engines render in short blocks (a dozen samples or so). Controls arrive once
per block. Applying a new control value as a step at the start of a block
produces a tiny discontinuity every block: "zipper noise".

    value
      │        ┌───────          stepped: audible click at each block edge
      │  ──────┘
      │
      │       ╱────────          ramped: slope spread over the block
      │  ────╱
      └──────────────→ samples

The interpolator borrows the persisted "previous" value, walks from it to the
new target over `size` samples, and writes the target back when it goes out
of scope, so the next block starts exactly where this one ended. The write
happens even if the caller consumed fewer samples than `size`.
*/

/// Linear ramp from a persisted value to a new target.
///
/// The target is written back into the borrowed state on drop.
pub struct ParameterInterpolator<'a> {
    state: &'a mut f32,
    target: f32,
    value: f32,
    increment: f32,
}

impl<'a> ParameterInterpolator<'a> {
    pub fn new(state: &'a mut f32, target: f32, size: usize) -> Self {
        let value = *state;
        let increment = (target - value) / size.max(1) as f32;
        Self {
            state,
            target,
            value,
            increment,
        }
    }

    /// Advances one sample and returns the new value.
    #[inline]
    pub fn next(&mut self) -> f32 {
        self.value += self.increment;
        self.value
    }

    /// Value at a fractional position `t` (0..1) past the current sample.
    #[inline]
    pub fn subsample(&self, t: f32) -> f32 {
        self.value + self.increment * t
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }
}

impl Drop for ParameterInterpolator<'_> {
    fn drop(&mut self) {
        *self.state = self.target;
    }
}

/// Self-contained variant for consumers that keep the ramp between calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleParameterInterpolator {
    value: f32,
    increment: f32,
}

impl SimpleParameterInterpolator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new ramp from the current value towards `target`.
    pub fn init(&mut self, target: f32, size: usize) {
        self.increment = (target - self.value) / size.max(1) as f32;
    }

    pub fn reset(&mut self, value: f32) {
        self.value = value;
        self.increment = 0.0;
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        self.value += self.increment;
        self.value
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramps_linearly_to_target() {
        let mut state = 0.0;
        let mut ramp = ParameterInterpolator::new(&mut state, 1.0, 4);
        let values: Vec<f32> = (0..4).map(|_| ramp.next()).collect();
        assert_eq!(values, vec![0.25, 0.5, 0.75, 1.0]);
        drop(ramp);
        assert_eq!(state, 1.0);
    }

    #[test]
    fn equal_target_is_exact() {
        let mut state = 0.3721;
        {
            let mut ramp = ParameterInterpolator::new(&mut state, 0.3721, 24);
            for _ in 0..24 {
                assert_eq!(ramp.next(), 0.3721, "a flat ramp must not drift");
            }
        }
        assert_eq!(state, 0.3721);
    }

    #[test]
    fn partial_consumption_still_writes_target() {
        let mut state = -1.0;
        {
            let mut ramp = ParameterInterpolator::new(&mut state, 1.0, 8);
            ramp.next();
            ramp.next();
        }
        assert_eq!(state, 1.0);
    }

    #[test]
    fn subsample_interpolates_within_step() {
        let mut state = 0.0;
        let mut ramp = ParameterInterpolator::new(&mut state, 1.0, 2);
        assert_eq!(ramp.subsample(0.5), 0.25);
        ramp.next();
        assert_eq!(ramp.subsample(1.0), 1.0);
    }

    #[test]
    fn simple_interpolator_keeps_its_value() {
        let mut ramp = SimpleParameterInterpolator::new();
        ramp.init(2.0, 4);
        for _ in 0..4 {
            ramp.next();
        }
        assert!((ramp.value() - 2.0).abs() < 1e-6);
    }
}
