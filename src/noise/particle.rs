//! Random impulses ringing a band-pass filter.
//!
//! Every impulse also re-rolls the filter frequency within `spread`
//! semitones of the base frequency, at most once per block. The dry
//! impulses are added into `aux`, the filtered ones into `out`.

use crate::dsp::filter::{FilterMode, FrequencyApproximation, Svf};
use crate::dsp::random::Random;
use crate::dsp::units::semitones_to_ratio;

#[derive(Debug, Clone)]
pub struct Particle {
    pre_gain: f32,
    filter: Svf,
    random: Random,
}

impl Particle {
    pub fn new(seed: u64) -> Self {
        Self {
            pre_gain: 0.0,
            filter: Svf::new(),
            random: Random::new_with_seed(seed),
        }
    }

    pub fn reset(&mut self) {
        self.pre_gain = 0.0;
        self.filter.reset();
    }

    /// Adds one block of particles into `out` and `aux`.
    ///
    /// `density` is the per-sample impulse probability, `sync` forces an
    /// impulse on the first sample.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        sync: bool,
        density: f32,
        gain: f32,
        frequency: f32,
        spread: f32,
        q: f32,
        out: &mut [f32],
        aux: &mut [f32],
    ) {
        let mut u = self.random.get_float();
        if sync {
            u = density;
        }
        let mut can_randomize_frequency = true;
        for (out_sample, aux_sample) in out.iter_mut().zip(aux.iter_mut()) {
            let mut s = 0.0;
            if u <= density {
                s = u * gain;
                if can_randomize_frequency {
                    let u = self.random.get_bipolar();
                    let f = (semitones_to_ratio(spread * u) * frequency).min(0.25);
                    self.pre_gain = 0.5 / (q * f * density.max(1e-6).sqrt()).max(1e-6).sqrt();
                    self.filter.set_f_q(f, q, FrequencyApproximation::Fast);
                    can_randomize_frequency = false;
                }
            }
            *aux_sample += s;
            *out_sample += self.filter.process(self.pre_gain * s, FilterMode::BandPass);
            u = self.random.get_float();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_fires_an_impulse() {
        let mut particle = Particle::new(1);
        let mut out = [0.0; 12];
        let mut aux = [0.0; 12];
        particle.render(true, 0.0001, 1.0, 0.02, 0.0, 2.0, &mut out, &mut aux);
        assert!(aux[0] > 0.0);
        assert!(out.iter().any(|&x| x != 0.0));
    }

    #[test]
    fn zero_density_is_silent() {
        let mut particle = Particle::new(2);
        let mut out = [0.0; 12];
        let mut aux = [0.0; 12];
        for _ in 0..100 {
            particle.render(false, 0.0, 1.0, 0.02, 12.0, 2.0, &mut out, &mut aux);
        }
        assert!(out.iter().chain(aux.iter()).all(|&x| x == 0.0));
    }

    #[test]
    fn dense_particles_stay_finite() {
        let mut particle = Particle::new(3);
        let mut out = [0.0; 24];
        let mut aux = [0.0; 24];
        for _ in 0..200 {
            out.fill(0.0);
            aux.fill(0.0);
            particle.render(false, 0.5, 2.0, 0.1, 48.0, 100.0, &mut out, &mut aux);
            assert!(out.iter().all(|x| x.is_finite()));
        }
    }
}
