//! Every engine through the voice, with the LPG active.
//!
//! Each engine is benchmarked at every block size so that the slowest one
//! (usually chord or speech) stands out against the deadline.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_macro::engine::{ENGINES, NUM_ENGINES};
use saavy_macro::{Modulations, Patch, Voice, VoiceConfig};

use crate::BLOCK_SIZES;

pub fn bench_engines(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engines");

    for &size in BLOCK_SIZES {
        let Ok(mut voice) = Voice::new(VoiceConfig::new(48_000.0, size)) else {
            continue;
        };
        let mut out = vec![0.0f32; size];
        let mut aux = vec![0.0f32; size];
        let modulations = Modulations::gated(true);

        for engine in 0..NUM_ENGINES {
            let patch = Patch {
                engine,
                ..Patch::default()
            };
            // Settle the switch crossfade before timing.
            for _ in 0..64 {
                voice.render(&patch, &modulations, &mut out, &mut aux);
            }
            let name = ENGINES[engine].name.replace(' ', "_");
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    voice.render(black_box(&patch), black_box(&modulations), &mut out, &mut aux);
                })
            });
        }
    }

    group.finish();
}
