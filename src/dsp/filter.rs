use std::f32::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
| mode                 | passes          | rejects      | used by                     |
| -------------------- | --------------- | ------------ | --------------------------- |
| low-pass             | below cutoff    | above cutoff | LPG, exciter post-filter    |
| band-pass            | around cutoff   | elsewhere    | modal resonator, drums      |
| band-pass normalized | around cutoff   | elsewhere    | formant bank (unity peak)   |
| high-pass            | above cutoff    | below cutoff | hi-hat, noise engine        |

Frequencies are normalized: `f` is in cycles per sample, so 0.5 is Nyquist.
Engines never deal in Hz; `SampleRate::note_to_frequency` does the
conversion once.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    LowPass,
    BandPass,
    BandPassNormalized,
    HighPass,
}

/// How `tan(pi * f)` is evaluated when computing the integrator gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyApproximation {
    Exact,
    Accurate,
    Fast,
    Dirty,
}

/// Integrator gain for a normalized cutoff.
#[inline]
pub fn tan_approx(f: f32, approximation: FrequencyApproximation) -> f32 {
    match approximation {
        FrequencyApproximation::Exact => (PI * f.min(0.497)).tan(),
        FrequencyApproximation::Dirty => {
            // Good below ~8 kHz at 48 kHz.
            let a = 3.736e-01 * PI * PI * PI;
            f * (PI + a * f * f)
        }
        FrequencyApproximation::Fast => {
            let a = 3.260e-01 * PI.powi(3);
            let b = 1.823e-01 * PI.powi(5);
            let f2 = f * f;
            f * (PI + f2 * (a + b * f2))
        }
        FrequencyApproximation::Accurate => {
            let a = 3.333_314e-01 * PI.powi(3);
            let b = 1.333_924e-01 * PI.powi(5);
            let c = 5.337_406e-02 * PI.powi(7);
            let d = 2.900_525e-03 * PI.powi(9);
            let e = 9.516_809e-03 * PI.powi(11);
            let f2 = f * f;
            f * (PI + f2 * (a + f2 * (b + f2 * (c + f2 * (d + f2 * e)))))
        }
    }
}

pub struct FilterOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
    pub highpass: f32,
}

/// Topology-preserving (trapezoidal) state-variable filter.
#[derive(Debug, Clone, Copy)]
pub struct Svf {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    g: f32,
    k: f32,
    h: f32,
}

impl Default for Svf {
    fn default() -> Self {
        Self::new()
    }
}

impl Svf {
    pub fn new() -> Self {
        let mut filter = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            g: 0.0,
            k: 0.0,
            h: 0.0,
        };
        filter.set_f_q(0.01, 100.0, FrequencyApproximation::Dirty);
        filter
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    /// Sets cutoff (normalized) and resonance. `q` is clamped to stay stable.
    #[inline]
    pub fn set_f_q(&mut self, f: f32, q: f32, approximation: FrequencyApproximation) {
        let g = tan_approx(f.clamp(0.0, 0.497), approximation);
        self.set_g_k(g, 1.0 / q.max(0.05));
    }

    /// Sets the integrator gain and damping directly.
    #[inline]
    pub fn set_g_k(&mut self, g: f32, k: f32) {
        self.g = g;
        self.k = k;
        self.h = 1.0 / (1.0 + g * (g + k));
    }

    #[inline]
    pub fn g(&self) -> f32 {
        self.g
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32) -> FilterOutputs {
        let v3 = sample - self.ic2eq;
        let v1 = self.h * (self.ic1eq + self.g * v3);
        let v2 = self.ic2eq + self.g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        FilterOutputs {
            lowpass: v2,
            bandpass: v1,
            highpass: sample - self.k * v1 - v2,
        }
    }

    #[inline]
    pub fn process(&mut self, sample: f32, mode: FilterMode) -> f32 {
        let k = self.k;
        let outputs = self.next_sample(sample);
        match mode {
            FilterMode::LowPass => outputs.lowpass,
            FilterMode::BandPass => outputs.bandpass,
            FilterMode::BandPassNormalized => outputs.bandpass * k,
            FilterMode::HighPass => outputs.highpass,
        }
    }

    /// Filters `in_out` in place.
    pub fn process_buffer(&mut self, in_out: &mut [f32], mode: FilterMode) {
        for sample in in_out.iter_mut() {
            *sample = self.process(*sample, mode);
        }
    }

    /// Continuous sweep LP → BP → HP as `mode` goes 0 → 1.
    #[inline]
    pub fn process_multimode(&mut self, sample: f32, mode: f32) -> f32 {
        let k = self.k;
        let outputs = self.next_sample(sample);
        let mode = mode.clamp(0.0, 1.0);
        let bandpass = outputs.bandpass * k;
        if mode < 0.5 {
            let t = mode * 2.0;
            outputs.lowpass + (bandpass - outputs.lowpass) * t
        } else {
            let t = mode * 2.0 - 1.0;
            bandpass + (outputs.highpass - bandpass) * t
        }
    }
}

/// One-pole filter with low-pass and high-pass taps.
#[derive(Debug, Default, Clone, Copy)]
pub struct OnePole {
    g: f32,
    gi: f32,
    state: f32,
}

impl OnePole {
    pub fn new() -> Self {
        let mut filter = Self::default();
        filter.set_f(0.01, FrequencyApproximation::Dirty);
        filter
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }

    #[inline]
    pub fn set_f(&mut self, f: f32, approximation: FrequencyApproximation) {
        self.g = tan_approx(f.clamp(0.0, 0.497), approximation);
        self.gi = 1.0 / (1.0 + self.g);
    }

    #[inline]
    pub fn lowpass(&mut self, sample: f32) -> f32 {
        let v = (sample - self.state) * self.g * self.gi;
        let lp = v + self.state;
        self.state = lp + v;
        lp
    }

    #[inline]
    pub fn highpass(&mut self, sample: f32) -> f32 {
        sample - self.lowpass(sample)
    }
}

/// First-order DC blocker: `y = x - x[n-1] + pole * y[n-1]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DcBlocker {
    pole: f32,
    x: f32,
    y: f32,
}

impl DcBlocker {
    pub fn new(pole: f32) -> Self {
        Self {
            pole: 1.0 - pole.clamp(0.0, 1.0),
            x: 0.0,
            y: 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.x = 0.0;
        self.y = 0.0;
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let y = sample - self.x + self.pole * self.y;
        self.x = sample;
        self.y = y;
        y
    }

    /// Filters `in_out` in place.
    pub fn process_buffer(&mut self, in_out: &mut [f32]) {
        for sample in in_out.iter_mut() {
            *sample = self.process(*sample);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_block(frequency: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * frequency * i as f32).sin())
            .collect()
    }

    fn peak_after_transient(buffer: &[f32]) -> f32 {
        let skip = buffer.len().min(64);
        buffer
            .get(skip..)
            .unwrap_or(buffer)
            .iter()
            .fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    #[test]
    fn lowpass_passes_dc() {
        let mut filter = Svf::new();
        filter.set_f_q(500.0 / 48_000.0, 0.5, FrequencyApproximation::Exact);
        let mut buffer = vec![1.0; 256];
        filter.process_buffer(&mut buffer, FilterMode::LowPass);
        assert!(buffer[255] > 0.99, "expected DC to pass, got {}", buffer[255]);
    }

    #[test]
    fn highpass_blocks_dc() {
        let mut filter = Svf::new();
        filter.set_f_q(500.0 / 48_000.0, 0.5, FrequencyApproximation::Exact);
        let mut buffer = vec![1.0; 256];
        filter.process_buffer(&mut buffer, FilterMode::HighPass);
        assert!(buffer[255].abs() < 0.01, "expected DC to be blocked, got {}", buffer[255]);
    }

    #[test]
    fn lowpass_attenuates_high_frequencies() {
        let mut filter = Svf::new();
        filter.set_f_q(500.0 / 48_000.0, 0.5, FrequencyApproximation::Fast);
        let mut buffer = sine_block(5_000.0 / 48_000.0, 512);
        filter.process_buffer(&mut buffer, FilterMode::LowPass);
        let peak = peak_after_transient(&buffer);
        assert!(peak < 0.05, "Expected high freq attenuation, got peak: {}", peak);
    }

    #[test]
    fn bandpass_emphasizes_cutoff_frequency() {
        let cutoff = 1_000.0 / 48_000.0;
        let mut filter = Svf::new();
        filter.set_f_q(cutoff, 4.0, FrequencyApproximation::Accurate);

        let mut pass = sine_block(cutoff, 1024);
        filter.process_buffer(&mut pass, FilterMode::BandPassNormalized);
        let pass_peak = peak_after_transient(&pass);

        filter.reset();
        let mut off = sine_block(200.0 / 48_000.0, 1024);
        filter.process_buffer(&mut off, FilterMode::BandPassNormalized);
        let off_peak = peak_after_transient(&off);

        assert!(
            pass_peak > off_peak * 2.0,
            "expected bandpass to emphasize cutoff freq, got pass_peak={}, off_peak={}",
            pass_peak,
            off_peak
        );
        assert!((pass_peak - 1.0).abs() < 0.1, "normalized peak should be ~1, got {}", pass_peak);
    }

    #[test]
    fn approximations_agree_at_low_frequencies() {
        let f = 0.01;
        let exact = tan_approx(f, FrequencyApproximation::Exact);
        for approx in [
            FrequencyApproximation::Accurate,
            FrequencyApproximation::Fast,
            FrequencyApproximation::Dirty,
        ] {
            let value = tan_approx(f, approx);
            assert!(
                (value - exact).abs() / exact < 0.01,
                "{:?} drifts: {} vs {}",
                approx,
                value,
                exact
            );
        }
    }

    #[test]
    fn multimode_endpoints_match_fixed_modes() {
        let mut a = Svf::new();
        let mut b = Svf::new();
        a.set_f_q(0.05, 1.0, FrequencyApproximation::Fast);
        b.set_f_q(0.05, 1.0, FrequencyApproximation::Fast);
        for i in 0..64 {
            let x = if i == 0 { 1.0 } else { 0.0 };
            assert_eq!(a.process_multimode(x, 0.0), b.process(x, FilterMode::LowPass));
        }
    }

    #[test]
    fn one_pole_and_dc_blocker_settle() {
        let mut lp = OnePole::new();
        lp.set_f(0.01, FrequencyApproximation::Exact);
        let mut dc = DcBlocker::new(0.01);
        let mut lp_out = 0.0;
        let mut dc_out = 1.0;
        for _ in 0..4096 {
            lp_out = lp.lowpass(1.0);
            dc_out = dc.process(1.0);
        }
        assert!((lp_out - 1.0).abs() < 1e-3);
        assert!(dc_out.abs() < 1e-3);
    }
}
