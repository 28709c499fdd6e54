//! Benchmarks for low-level DSP kernels.

mod distortion;
mod filter;
mod oscillator;
mod resonator;
mod reverb;

pub use distortion::bench_distortion;
pub use filter::bench_filter;
pub use oscillator::bench_oscillator;
pub use resonator::bench_resonator;
pub use reverb::bench_reverb;
