//! Noise sources: sample-and-hold noise, sparse impulses and filtered
//! particles.
//!
//! Each source owns its own [`Random`](crate::dsp::random::Random), seeded
//! at construction.

pub mod clocked_noise;
pub mod dust;
pub mod particle;

pub use clocked_noise::ClockedNoise;
pub use dust::dust;
pub use particle::Particle;
