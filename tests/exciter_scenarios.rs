//! Exciter and tube behaviour seen from outside the crate.

use saavy_macro::dsp::tables::PULSE_AMPLITUDE;
use saavy_macro::exciter::{Exciter, ExciterFlags, ExciterModel};
use saavy_macro::physical::tube::{Tube, TUBE_CLAMP, TUBE_DELAY_SIZE};

#[test]
fn mallet_strike_is_one_lookup_pulse() {
    let mut exciter = Exciter::new();
    exciter.set_model(ExciterModel::Mallet);
    exciter.set_timbre(0.99);
    exciter.set_parameter(0.0);
    let mut out = [0.5; 16];
    exciter.render_model(ExciterFlags::RISING_EDGE, &mut out);

    assert_eq!(out[0], PULSE_AMPLITUDE[253]);
    assert!(out[1..].iter().all(|&x| x == 0.0));
    // No gate: the damper starts to fall back onto the object, and with
    // the parameter at zero the damping is the damper itself.
    assert!((exciter.damping() - 0.002 * 16.0).abs() < 1e-6);
}

#[test]
fn plectrum_pre_pulse_then_release() {
    let mut exciter = Exciter::new();
    exciter.set_model(ExciterModel::Plectrum);
    exciter.set_parameter(0.5);
    let delay = 64 + (4_096.0 * 0.25) as usize;

    let mut response = Vec::new();
    let mut out = [0.0; 24];
    exciter.process(ExciterFlags::RISING_EDGE | ExciterFlags::GATE, &mut out);
    response.extend_from_slice(&out);
    for _ in 0..60 {
        exciter.render_model(ExciterFlags::GATE, &mut out);
        response.extend_from_slice(&out);
    }

    let first_positive = response.iter().skip(24).position(|&x| x > 0.0).map(|i| i + 24);
    assert_eq!(first_positive, Some(delay - 1));
}

#[test]
fn every_model_renders_finite_blocks() {
    for model in ExciterModel::ALL {
        let mut exciter = Exciter::new();
        exciter.set_model(model);
        exciter.set_timbre(0.7);
        exciter.set_parameter(0.6);
        let mut out = [0.0; 24];
        for n in 0..500 {
            let flags = match n {
                0 => ExciterFlags::RISING_EDGE | ExciterFlags::GATE,
                1..=199 => ExciterFlags::GATE,
                200 => ExciterFlags::FALLING_EDGE,
                _ => ExciterFlags::empty(),
            };
            exciter.process(flags, &mut out);
            assert!(out.iter().all(|x| x.is_finite()), "{}", model.name());
            assert!((0.0..=1.0).contains(&exciter.damping()), "{}", model.name());
        }
    }
}

#[test]
fn switching_models_resets_the_exciter() {
    let mut exciter = Exciter::new();
    exciter.set_model(ExciterModel::Plectrum);
    let mut out = [0.0; 24];
    exciter.render_model(ExciterFlags::RISING_EDGE | ExciterFlags::GATE, &mut out);
    exciter.set_model(ExciterModel::Mallet);
    exciter.render_model(ExciterFlags::GATE, &mut out);
    assert!(out.iter().all(|&x| x == 0.0));
    assert_eq!(exciter.damping(), 0.0);
}

#[test]
fn tube_impulse_stays_clamped_and_decays() {
    let frequency = 110.0 / 48_000.0;
    assert!(1.0 / frequency < TUBE_DELAY_SIZE as f32);

    let mut tube = Tube::new();
    let mut response = Vec::new();
    for n in 0..800 {
        let mut buffer = [0.0; 24];
        if n == 0 {
            buffer[0] = 1.0;
        }
        tube.process(frequency, 1.0, 0.0, 0.5, &mut buffer, 1.0);
        response.extend_from_slice(&buffer);
    }

    assert!(response
        .iter()
        .all(|x| x.is_finite() && x.abs() <= 2.0 * TUBE_CLAMP));
    let head: f32 = response[..4_800].iter().map(|x| x * x).sum();
    let tail: f32 = response[14_400..].iter().map(|x| x * x).sum();
    assert!(tail < head);
}

#[test]
fn fresh_tube_is_silent_without_breath() {
    let mut tube = Tube::new();
    let mut buffer = [0.0; 24];
    for _ in 0..10 {
        tube.process(0.005, 1.0, 0.0, 0.5, &mut buffer, 1.0);
    }
    assert!(buffer.iter().all(|&x| x == 0.0));
}
