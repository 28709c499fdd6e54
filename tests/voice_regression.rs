//! Voice behaviour through the public API, across sample rates and block
//! sizes.

use saavy_macro::engine::NUM_ENGINES;
use saavy_macro::patch::ResonatorModel;
use saavy_macro::{ConfigError, Modulations, Patch, ResonatorVoice, Voice, VoiceConfig};

fn energy(x: &[f32]) -> f32 {
    x.iter().map(|s| s * s).sum::<f32>() / x.len().max(1) as f32
}

#[test]
fn rejects_configs_outside_the_supported_range() {
    assert_eq!(
        Voice::new(VoiceConfig::new(4_000.0, 12)).err(),
        Some(ConfigError::SampleRateOutOfRange(4_000.0))
    );
    assert_eq!(
        Voice::new(VoiceConfig::new(48_000.0, 25)).err(),
        Some(ConfigError::BlockSize(25))
    );
    assert!(ResonatorVoice::new(VoiceConfig::new(f32::INFINITY, 12)).is_err());
}

#[test]
fn engine_zero_resolves_repeatedly() {
    let mut voice = Voice::new(VoiceConfig::default()).expect("config");
    let patch = Patch::default();
    let modulations = Modulations::default();
    let mut out = [0.0; 48];
    let mut aux = [0.0; 48];
    for _ in 0..100 {
        assert_eq!(voice.render(&patch, &modulations, &mut out, &mut aux).engine, 0);
    }
}

#[test]
fn engine_cv_spans_every_engine() {
    let mut voice = Voice::new(VoiceConfig::default()).expect("config");
    let patch = Patch::default();
    let mut out = [0.0; 12];
    let mut aux = [0.0; 12];
    for engine in 0..NUM_ENGINES {
        let modulations = Modulations {
            engine: engine as f32 / NUM_ENGINES as f32,
            ..Modulations::default()
        };
        assert_eq!(voice.render(&patch, &modulations, &mut out, &mut aux).engine, engine);
    }
}

#[test]
fn every_engine_is_finite_at_every_rate_and_block_size() {
    for (sample_rate, block_size) in [(44_100.0, 8), (48_000.0, 24), (96_000.0, 12)] {
        let mut voice = Voice::new(VoiceConfig::new(sample_rate, block_size)).expect("config");
        let mut patch = Patch::default();
        for engine in 0..NUM_ENGINES {
            patch.engine = engine;
            let mut out = vec![0.0; 4_800];
            let mut aux = vec![0.0; 4_800];
            for n in 0..4 {
                let modulations = Modulations::gated(n % 2 == 0);
                voice.render(&patch, &modulations, &mut out, &mut aux);
                assert!(
                    out.iter().chain(aux.iter()).all(|x| x.is_finite()),
                    "engine {} at {} Hz",
                    engine,
                    sample_rate
                );
            }
        }
    }
}

#[test]
fn pitch_follows_the_note() {
    // FM with no modulation index is a pure sine: count zero crossings.
    let mut patch = Patch {
        engine: 2,
        timbre: 0.0,
        ..Patch::default()
    };
    let crossings = |patch: &Patch| {
        let mut voice = Voice::new(VoiceConfig::default()).expect("config");
        let mut out = vec![0.0; 48_000];
        let mut aux = vec![0.0; 48_000];
        voice.render(patch, &Modulations::default(), &mut out, &mut aux);
        out[4_800..]
            .windows(2)
            .filter(|pair| pair[0] < 0.0 && pair[1] >= 0.0)
            .count()
    };
    let low = crossings(&patch);
    patch.note += 12.0;
    let high = crossings(&patch);
    let ratio = high as f32 / low as f32;
    assert!((ratio - 2.0).abs() < 0.05, "{} vs {}", low, high);
}

#[test]
fn level_cv_opens_the_gate() {
    let mut voice = Voice::new(VoiceConfig::default()).expect("config");
    let patch = Patch::default();
    let mut out = vec![0.0; 4_800];
    let mut aux = vec![0.0; 4_800];
    let closed = Modulations {
        level_patched: true,
        level: 0.0,
        ..Modulations::default()
    };
    voice.render(&patch, &closed, &mut out, &mut aux);
    let silent = energy(&out[2_400..]);

    let open = Modulations { level: 1.0, ..closed };
    voice.render(&patch, &open, &mut out, &mut aux);
    assert!(energy(&out[2_400..]) > silent + 1e-4);
}

#[test]
fn resonator_voice_models_ring_and_decay() {
    for model in ResonatorModel::ALL {
        let mut voice = ResonatorVoice::new(VoiceConfig::default()).expect("config");
        let mut patch = Patch::default();
        patch.resonator.resonator_model = model;
        patch.resonator.space = 0.0;
        patch.resonator.damping = 0.4;

        let mut response = Vec::new();
        let mut out = [0.0; 24];
        let mut aux = [0.0; 24];
        for n in 0..1_000 {
            voice.render(&patch, &Modulations::gated(n < 2), &mut out, &mut aux);
            response.extend_from_slice(&out);
        }
        assert!(response.iter().all(|x| x.is_finite()), "{}", model.name());
        let head = energy(&response[..4_800]);
        assert!(head > 0.0, "{}", model.name());
        assert!(energy(&response[19_200..]) < head, "{}", model.name());
    }
}

type Poke = fn(&mut Patch, &mut Modulations, f32);

const POKES: [Poke; 28] = [
    |p, _, x| p.note = x,
    |p, _, x| p.harmonics = x,
    |p, _, x| p.timbre = x,
    |p, _, x| p.morph = x,
    |p, _, x| p.frequency_modulation_amount = x,
    |p, _, x| p.timbre_modulation_amount = x,
    |p, _, x| p.morph_modulation_amount = x,
    |p, _, x| p.decay = x,
    |p, _, x| p.lpg_colour = x,
    |p, _, x| p.resonator.exciter_timbre = x,
    |p, _, x| p.resonator.exciter_parameter = x,
    |p, _, x| p.resonator.blow_level = x,
    |p, _, x| p.resonator.structure = x,
    |p, _, x| p.resonator.brightness = x,
    |p, _, x| p.resonator.damping = x,
    |p, _, x| p.resonator.position = x,
    |p, _, x| p.resonator.geometry = x,
    |p, _, x| p.resonator.chord = x,
    |p, _, x| p.resonator.space = x,
    |_, m, x| m.engine = x,
    |_, m, x| m.note = x,
    |_, m, x| m.frequency = x,
    |_, m, x| m.harmonics = x,
    |_, m, x| m.timbre = x,
    |_, m, x| m.morph = x,
    |_, m, x| m.trigger = x,
    |_, m, x| m.level = x,
    |p, m, x| {
        p.harmonics = x;
        p.lpg_colour = x;
        m.level = x;
    },
];

#[test]
fn non_finite_controls_never_reach_the_output() {
    let mut out = vec![0.0; 480];
    let mut aux = vec![0.0; 480];
    for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
        for (field, poke) in POKES.iter().enumerate() {
            let mut voice = Voice::new(VoiceConfig::default()).expect("config");
            for engine in 0..NUM_ENGINES {
                let mut patch = Patch {
                    engine,
                    ..Patch::default()
                };
                let mut modulations = Modulations {
                    level_patched: true,
                    frequency_patched: true,
                    timbre_patched: true,
                    morph_patched: true,
                    ..Modulations::gated(true)
                };
                poke(&mut patch, &mut modulations, bad);
                voice.render(&patch, &modulations, &mut out, &mut aux);
                assert!(
                    out.iter().chain(aux.iter()).all(|x| x.is_finite()),
                    "field {} = {} on engine {}",
                    field,
                    bad,
                    engine
                );
            }

            for model in ResonatorModel::ALL {
                let mut voice = ResonatorVoice::new(VoiceConfig::default()).expect("config");
                let mut patch = Patch::default();
                patch.resonator.resonator_model = model;
                let mut modulations = Modulations::gated(true);
                poke(&mut patch, &mut modulations, bad);
                for _ in 0..4 {
                    voice.render(&patch, &modulations, &mut out, &mut aux);
                }
                assert!(
                    out.iter().chain(aux.iter()).all(|x| x.is_finite()),
                    "field {} = {} on the {} resonator",
                    field,
                    bad,
                    model.name()
                );
            }
        }
    }
}
