//! How a CV input and its attenuverter move a knob value.

/*
Patched and unpatched inputs
============================

Every modulated parameter has three ingredients:

  knob          The stored value (Patch).
  attenuverter  A bipolar amount in [-1, 1].
  input         The CV, which may or may not be physically patched.

When the input is patched, the attenuverter scales the external CV. When it
is not, the attenuverter scales the voice's internal decay envelope instead
(if the voice is using it), and otherwise a fixed default source:

    source = external            if patched
           = envelope            if using the internal envelope
           = default             otherwise

    value  = clamp(knob + amount' * source, min, max)

The attenuverter response is curved so that the centre of its travel is a
wide dead zone and the ends are steep:

    amount' = 1.05 * amount * max(|amount| - 0.05, 0.05)

    amount'
      1 ┤                 ╱
        │               ╱
      0 ┼──────────────
        │   ╱
     -1 ┤ ╱
        └─┬──────┬──────┬──→ amount
         -1      0      1
*/

use crate::dsp::units::saturate;

/// One modulated parameter's inputs.
#[derive(Debug, Clone, Copy)]
pub struct ModulationInput {
    /// Attenuverter, -1..1.
    pub amount: f32,
    pub patched: bool,
    /// External CV, used when patched.
    pub external: f32,
    /// Internal envelope value, used when not patched and `use_envelope`.
    pub envelope: f32,
    pub use_envelope: bool,
    /// Used when neither the CV nor the envelope drives the parameter.
    pub default: f32,
}

/// Curved attenuverter response.
#[inline]
pub fn attenuverter_curve(amount: f32) -> f32 {
    let amount = amount.clamp(-1.0, 1.0);
    amount * (amount.abs() - 0.05).max(0.05) * 1.05
}

/// Applies the patched/unpatched modulation policy to a knob value and
/// clamps the result to `[min, max]`.
#[inline]
pub fn apply_modulations(value: f32, input: ModulationInput, min: f32, max: f32) -> f32 {
    let amount = attenuverter_curve(input.amount);
    let source = if input.patched {
        input.external
    } else if input.use_envelope {
        input.envelope
    } else {
        input.default
    };
    saturate(value + amount * source, min, max)
}
