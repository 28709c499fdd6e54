//! Signal mixing and crossfading primitives.

/*
Signal Mixing
=============

Mixing combines signals by ADDING them together with weights.

  crossfade     Transitioning between two signals using complementary weights.
                As one fades out, the other fades in.

  balance       A control value (0.0 to 1.0) that determines the mix ratio.
                  balance = 0.0  →  100% signal A
                  balance = 1.0  →  100% signal B


Engine-switch crossfade
-----------------------

When the voice switches engines, the old engine keeps rendering for a short
window while the new one comes in. The balance ramps linearly across the
window, possibly over several blocks, so each call gets the start and end of
its slice of the ramp:

    weight_b
      1 ┤            ╱────
        │          ╱
        │        ╱     ← one call covers [start, end]
      0 ┼──────╱
        └──────┬─────┬──→ samples
             switch  window end

The weights always sum to 1.0, so two engines at the same level never bump
the output. Two uncorrelated signals do dip by up to 3 dB in the middle,
which over a few milliseconds is inaudible.
*/

/// Crossfade B over A in place with a balance ramping from `start` to `end`
/// across the buffer. Both are clamped to [0, 1].
#[inline]
pub fn crossfade_in_place(a: &mut [f32], b: &[f32], start: f32, end: f32) {
    debug_assert_eq!(a.len(), b.len());

    let start = start.clamp(0.0, 1.0);
    let end = end.clamp(0.0, 1.0);
    let increment = (end - start) / a.len().max(1) as f32;
    let mut balance = start;
    for (sa, &sb) in a.iter_mut().zip(b.iter()) {
        balance += increment;
        *sa += (sb - *sa) * balance;
    }
}
