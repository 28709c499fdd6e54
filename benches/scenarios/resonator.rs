//! The resonator voice at full polyphony, both resonator models.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_macro::patch::ResonatorModel;
use saavy_macro::{Modulations, Patch, ResonatorVoice, VoiceConfig};

use crate::BLOCK_SIZES;

pub fn bench_resonator_voice(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/resonator_voice");

    for &size in BLOCK_SIZES {
        let Ok(mut voice) = ResonatorVoice::new(VoiceConfig::new(48_000.0, size)) else {
            continue;
        };
        let mut out = vec![0.0f32; size];
        let mut aux = vec![0.0f32; size];
        let modulations = Modulations::gated(true);

        for model in ResonatorModel::ALL {
            let mut patch = Patch::default();
            patch.resonator.resonator_model = model;
            patch.resonator.polyphony = 4;
            patch.resonator.space = 0.8;
            group.bench_with_input(BenchmarkId::new(model.name(), size), &size, |b, _| {
                b.iter(|| {
                    voice.render(black_box(&patch), black_box(&modulations), &mut out, &mut aux);
                })
            });
        }
    }

    group.finish();
}
