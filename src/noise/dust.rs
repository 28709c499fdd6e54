//! Sparse random impulses.

use crate::dsp::random::Random;

/// Returns a non-zero impulse with probability `frequency`, zero otherwise.
///
/// The impulse height is uniform in [0, 1), independent of the density.
#[inline]
pub fn dust(frequency: f32, random: &mut Random) -> f32 {
    let frequency = frequency.max(1e-7);
    let u = random.get_float();
    if u < frequency {
        u / frequency
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_matches_probability() {
        let mut random = Random::new_with_seed(7);
        let hits = (0..100_000)
            .filter(|_| dust(0.01, &mut random) != 0.0)
            .count();
        assert!((700..1_300).contains(&hits), "{} hits", hits);
    }

    #[test]
    fn impulses_are_in_unit_range() {
        let mut random = Random::new_with_seed(3);
        for _ in 0..10_000 {
            let x = dust(0.2, &mut random);
            assert!((0.0..1.0).contains(&x));
        }
    }
}
