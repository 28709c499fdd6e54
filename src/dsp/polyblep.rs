//! Polynomial band-limited step (BLEP) and ramp (BLAMP) residuals.

/*
Band-limited discontinuities
============================

A naive sawtooth jumps from +1 to -1 in a single sample. That jump carries
energy at every frequency, and everything above Nyquist folds back down as
inharmonic aliasing.

The fix: find the exact (fractional) time the discontinuity happened, and add
a small residual that turns the ideal step into a band-limited one. The
residual spans two samples, the one just rendered and the next one:

                   t = time elapsed since the edge (in samples, 0..1)

     this sample:  0.5 t^2                 (added now)
     next sample: -0.5 (1 - t)^2           (carried to the next call)

  naive saw     corrected saw
     ╱│           ╱╮
    ╱ │          ╱  ╲
   ╱  │╱        ╱    ╲╱
       ╱              ╱

Each residual is scaled by the height of the jump. Slope breaks (the corners
of a triangle) use the integrated version (BLAMP), scaled by the change of
slope times the frequency.

Oscillators keep a `next_sample` accumulator: the part of the correction
that belongs to the following sample lives there, even across block
boundaries.
*/

/// BLEP residual for the sample containing the discontinuity.
#[inline]
pub fn this_blep_sample(t: f32) -> f32 {
    0.5 * t * t
}

/// BLEP residual carried into the following sample.
#[inline]
pub fn next_blep_sample(t: f32) -> f32 {
    let t = 1.0 - t;
    -0.5 * t * t
}

/// BLAMP residual carried into the following sample.
#[inline]
pub fn next_integrated_blep_sample(t: f32) -> f32 {
    let t1 = 0.5 * t;
    let t2 = t1 * t1;
    let t4 = t2 * t2;
    0.1875 - t1 + 1.5 * t2 - t4
}

/// BLAMP residual for the sample containing the slope break.
#[inline]
pub fn this_integrated_blep_sample(t: f32) -> f32 {
    next_integrated_blep_sample(1.0 - t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blep_residuals_meet_at_edges() {
        // An edge exactly at the sample boundary lands entirely in one sample.
        assert_eq!(this_blep_sample(0.0), 0.0);
        assert_eq!(next_blep_sample(1.0), 0.0);
        assert_eq!(this_blep_sample(1.0), 0.5);
        assert_eq!(next_blep_sample(0.0), -0.5);
    }

    #[test]
    fn blamp_residual_is_continuous() {
        // At t = 1 the BLAMP residual of the next sample is zero.
        assert!(next_integrated_blep_sample(1.0).abs() < 0.07);
        assert!((this_integrated_blep_sample(1.0) - 0.1875).abs() < 1e-6);
        let mut previous = next_integrated_blep_sample(0.0);
        for i in 1..=16 {
            let value = next_integrated_blep_sample(i as f32 / 16.0);
            assert!(value <= previous + 1e-6, "blamp residual should decay");
            previous = value;
        }
    }
}
