//! Voice configuration and the sample-rate context handed to every component.
//!
//! Nothing in the render path reads a global: oscillators, resonators and
//! engines receive a [`SampleRate`] at `init` time and re-derive their
//! constants when the host reports a new rate.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::MAX_BLOCK_SIZE;

/// Lowest sample rate the engines are tuned to run at.
pub const MIN_SAMPLE_RATE_HZ: f32 = 8_000.0;
/// Highest sample rate the engines are tuned to run at.
pub const MAX_SAMPLE_RATE_HZ: f32 = 192_000.0;

/// Reasons a configuration is rejected before any audio is rendered.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("sample rate {0} Hz is outside the supported range ({MIN_SAMPLE_RATE_HZ}..={MAX_SAMPLE_RATE_HZ} Hz)")]
    SampleRateOutOfRange(f32),
    #[error("sample rate must be a finite number")]
    SampleRateNotFinite,
    #[error("block size {0} must be between 1 and {MAX_BLOCK_SIZE}")]
    BlockSize(usize),
}

/// Sample rate context for DSP calculations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRate {
    pub sample_rate_hz: f32,
    /// `1 / sample_rate_hz`
    pub inv_sample_rate: f32,
    /// Normalized frequency of A0 (55 Hz).
    pub a0: f32,
}

impl SampleRate {
    pub fn new(sample_rate_hz: f32) -> Result<Self, ConfigError> {
        if !sample_rate_hz.is_finite() {
            return Err(ConfigError::SampleRateNotFinite);
        }
        if !(MIN_SAMPLE_RATE_HZ..=MAX_SAMPLE_RATE_HZ).contains(&sample_rate_hz) {
            return Err(ConfigError::SampleRateOutOfRange(sample_rate_hz));
        }
        let inv_sample_rate = 1.0 / sample_rate_hz;
        Ok(Self {
            sample_rate_hz,
            inv_sample_rate,
            a0: 55.0 * inv_sample_rate,
        })
    }

    /// Converts a (fractional) MIDI note to a normalized frequency.
    ///
    /// The note is offset so that A0 sits at index 0 and clamped to the
    /// range the pitch table covers.
    #[inline]
    pub fn note_to_frequency(&self, midi_note: f32) -> f32 {
        let note = (midi_note - 9.0).clamp(-128.0, 127.0);
        self.a0 * 0.25 * crate::dsp::units::semitones_to_ratio(note)
    }

    /// Seconds to samples.
    #[inline]
    pub fn samples(&self, seconds: f32) -> f32 {
        seconds * self.sample_rate_hz
    }

    /// Ratio between this rate and the 48 kHz the per-sample constants were
    /// tuned at. Used to keep time constants stable across rates.
    #[inline]
    pub fn rate_ratio(&self) -> f32 {
        48_000.0 * self.inv_sample_rate
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        let sample_rate_hz = 48_000.0;
        let inv_sample_rate = 1.0 / sample_rate_hz;
        Self {
            sample_rate_hz,
            inv_sample_rate,
            a0: 55.0 * inv_sample_rate,
        }
    }
}

/// Host-provided settings for a voice.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceConfig {
    pub sample_rate_hz: f32,
    /// Number of samples rendered per internal engine block.
    pub block_size: usize,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 48_000.0,
            block_size: 12,
        }
    }
}

impl VoiceConfig {
    pub fn new(sample_rate_hz: f32, block_size: usize) -> Self {
        Self {
            sample_rate_hz,
            block_size,
        }
    }

    /// Checks the configuration and derives the sample-rate context.
    pub fn validate(&self) -> Result<SampleRate, ConfigError> {
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            log::warn!("rejecting block size {}", self.block_size);
            return Err(ConfigError::BlockSize(self.block_size));
        }
        SampleRate::new(self.sample_rate_hz).map_err(|err| {
            log::warn!("rejecting voice config: {err}");
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let sr = VoiceConfig::default().validate().expect("default config");
        assert_eq!(sr.sample_rate_hz, 48_000.0);
        assert!((sr.a0 - 55.0 / 48_000.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_bad_block_sizes() {
        assert_eq!(
            VoiceConfig::new(48_000.0, 0).validate(),
            Err(ConfigError::BlockSize(0))
        );
        assert_eq!(
            VoiceConfig::new(48_000.0, MAX_BLOCK_SIZE + 1).validate(),
            Err(ConfigError::BlockSize(MAX_BLOCK_SIZE + 1))
        );
    }

    #[test]
    fn rejects_bad_sample_rates() {
        assert_eq!(
            SampleRate::new(f32::NAN),
            Err(ConfigError::SampleRateNotFinite)
        );
        assert!(matches!(
            SampleRate::new(1_000.0),
            Err(ConfigError::SampleRateOutOfRange(_))
        ));
    }

    #[test]
    fn a4_maps_to_440_hz() {
        let sr = SampleRate::default();
        let hz = sr.note_to_frequency(69.0) * sr.sample_rate_hz;
        assert!((hz - 440.0).abs() < 0.5, "A4 should be 440 Hz, got {}", hz);
    }
}
