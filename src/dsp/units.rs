//! Small numeric helpers shared by every engine: pitch conversion, table
//! interpolation, one-pole smoothing and soft saturation.

/// Converts a pitch offset in semitones to a frequency ratio.
#[inline]
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    (semitones * (1.0 / 12.0)).exp2()
}

/// Linear interpolation into a table, `index` in [0, 1] scaled by `size`.
#[inline]
pub fn interpolate(table: &[f32], index: f32, size: f32) -> f32 {
    let index = (index * size).max(0.0);
    let integral = (index as usize).min(table.len().saturating_sub(2));
    let fractional = index - integral as f32;
    let a = table[integral];
    let b = table[integral + 1];
    a + (b - a) * fractional
}

/// Linear interpolation into a periodic table; the index wraps.
#[inline]
pub fn interpolate_wrap(table: &[f32], index: f32, size: f32) -> f32 {
    let index = (index - index.floor()) * size;
    let integral = index as usize;
    let fractional = index - integral as f32;
    let len = size as usize;
    let a = table[integral % len];
    let b = table[(integral + 1) % len];
    a + (b - a) * fractional
}

/// Four-point Hermite interpolation; `table` must hold `size + 3` guard points
/// after the start index.
#[inline]
pub fn interpolate_hermite(table: &[f32], index: f32, size: f32) -> f32 {
    let index = (index * size).max(0.0);
    let integral = (index as usize).min(table.len().saturating_sub(4));
    let t = index - integral as f32;
    let xm1 = table[integral];
    let x0 = table[integral + 1];
    let x1 = table[integral + 2];
    let x2 = table[integral + 3];
    let c = (x1 - xm1) * 0.5;
    let v = x0 - x1;
    let w = c + v;
    let a = w + v + (x2 - x0) * 0.5;
    let b_neg = w + a;
    (((a * t) - b_neg) * t + c) * t + x0
}

#[inline]
pub fn crossfade(a: f32, b: f32, fade: f32) -> f32 {
    a + (b - a) * fade
}

/// One-pole low-pass step towards `target`.
#[inline]
pub fn one_pole(state: &mut f32, target: f32, coefficient: f32) {
    *state += coefficient * (target - *state);
}

/// One-pole with separate rise and fall coefficients.
#[inline]
pub fn slope(state: &mut f32, target: f32, positive: f32, negative: f32) {
    let error = target - *state;
    *state += if error > 0.0 { positive } else { negative } * error;
}

/// Rational approximation of tanh, exact enough for |x| < 3.
#[inline]
pub fn soft_limit(x: f32) -> f32 {
    x * (27.0 + x * x) / (27.0 + 9.0 * x * x)
}

#[inline]
pub fn soft_clip(x: f32) -> f32 {
    if x < -3.0 {
        -1.0
    } else if x > 3.0 {
        1.0
    } else {
        soft_limit(x)
    }
}

/// Splits a value into integral and fractional parts.
#[inline]
pub fn split(x: f32) -> (usize, f32) {
    let x = x.max(0.0);
    let integral = x as usize;
    (integral, x - integral as f32)
}

/// Clamps to `[min, max]`; infinities saturate to the nearer bound and NaN
/// becomes the in-range value closest to zero.
#[inline]
pub fn saturate(x: f32, min: f32, max: f32) -> f32 {
    if x.is_nan() {
        0.0f32.clamp(min, max)
    } else {
        x.clamp(min, max)
    }
}

/// Squares a value while keeping its sign.
#[inline]
pub fn sqr_signed(x: f32) -> f32 {
    x * x.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturate_never_leaks_non_finite_values() {
        assert_eq!(saturate(f32::NAN, 0.0, 1.0), 0.0);
        assert_eq!(saturate(f32::NAN, 12.0, 108.0), 12.0);
        assert_eq!(saturate(f32::NAN, -119.0, 120.0), 0.0);
        assert_eq!(saturate(f32::INFINITY, 0.0, 1.0), 1.0);
        assert_eq!(saturate(f32::NEG_INFINITY, 0.0, 1.0), 0.0);
        assert_eq!(saturate(0.25, 0.0, 1.0), 0.25);
    }

    #[test]
    fn octave_is_ratio_two() {
        assert!((semitones_to_ratio(12.0) - 2.0).abs() < 1e-5);
        assert!((semitones_to_ratio(-12.0) - 0.5).abs() < 1e-6);
        assert_eq!(semitones_to_ratio(0.0), 1.0);
    }

    #[test]
    fn interpolate_hits_table_points() {
        let table = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(interpolate(&table, 0.5, 4.0), 2.0);
        assert!((interpolate(&table, 0.625, 4.0) - 2.5).abs() < 1e-6);
        // Index past the end saturates instead of reading out of bounds.
        assert!(interpolate(&table, 4.0, 4.0).is_finite());
    }

    #[test]
    fn hermite_passes_through_samples() {
        let table: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let value = interpolate_hermite(&table, 2.0 / 4.0, 4.0);
        assert!((value - 3.0).abs() < 1e-5, "got {}", value);
    }

    #[test]
    fn soft_limit_is_bounded() {
        assert!((soft_clip(10.0) - 1.0).abs() < 1e-6);
        assert!(soft_limit(0.1) > 0.09 && soft_limit(0.1) < 0.11);
    }
}
