//! Steady-state renders show no seams at block boundaries.

use saavy_macro::dsp::oscillator::{Oscillator, OscillatorShape, SineOscillator};
use saavy_macro::{Modulations, Patch, Voice, VoiceConfig};

fn render_in_blocks(block_size: usize, samples: usize, mut render: impl FnMut(&mut [f32])) -> Vec<f32> {
    let mut signal = vec![0.0; samples];
    for block in signal.chunks_mut(block_size) {
        render(block);
    }
    signal
}

#[test]
fn sine_does_not_depend_on_block_size() {
    let f = 440.0 / 48_000.0;
    let mut small = SineOscillator::new();
    let mut large = SineOscillator::new();
    // Ramp both up to the target first so the rest is steady.
    let mut prime = [0.0; 24];
    small.render_add(f, 1.0, &mut prime);
    large.render_add(f, 1.0, &mut prime);

    let a = render_in_blocks(8, 4_800, |block| small.render_add(f, 1.0, block));
    let b = render_in_blocks(24, 4_800, |block| large.render_add(f, 1.0, block));
    for (x, y) in a.iter().zip(b.iter()) {
        assert!((x - y).abs() < 1e-4);
    }
}

#[test]
fn triangle_has_no_steps_at_boundaries() {
    let f = 220.0 / 48_000.0;
    let mut osc = Oscillator::new();
    let signal = render_in_blocks(12, 9_600, |block| {
        osc.render(OscillatorShape::Triangle, f, 0.5, None, block)
    });
    let max_step = 4.0 * f * 1.01;
    for pair in signal[24..].windows(2) {
        assert!((pair[1] - pair[0]).abs() <= max_step);
    }
}

#[test]
fn voice_boundaries_are_no_rougher_than_block_interiors() {
    for engine in [0, 2, 4, 5] {
        let mut voice = Voice::new(VoiceConfig::new(48_000.0, 12)).expect("config");
        let patch = Patch {
            engine,
            ..Patch::default()
        };
        let mut out = vec![0.0; 24_000];
        let mut aux = vec![0.0; 24_000];
        voice.render(&patch, &Modulations::default(), &mut out, &mut aux);

        let steady = &out[12_000..];
        let mut at_boundary: f32 = 0.0;
        let mut inside: f32 = 0.0;
        for (i, pair) in steady.windows(2).enumerate() {
            let step = (pair[1] - pair[0]).abs();
            if (i + 1) % 12 == 0 {
                at_boundary = at_boundary.max(step);
            } else {
                inside = inside.max(step);
            }
        }
        assert!(
            at_boundary <= inside * 1.1 + 1e-6,
            "engine {}: boundary {} inside {}",
            engine,
            at_boundary,
            inside
        );
    }
}
