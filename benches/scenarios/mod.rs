//! Complete voice benchmarks.
//!
//! These render the way a host does: one `render` call per audio callback,
//! controls held steady.

mod engines;
mod resonator;

pub use engines::bench_engines;
pub use resonator::bench_resonator_voice;
