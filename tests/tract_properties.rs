//! Behavioural properties of the waveguide tract.

use proptest::prelude::*;
use rand::{SeedableRng, rngs::SmallRng};

use vocal_tract::{
    Frication, NoiseField, ScatteringCoefficients, Tract, TractError, TractGeometry, TractParms,
    VelumCoefficients, WaveState, area, noise2d, reflection,
};

const N: usize = 16;
const M: usize = 8;

/// A uniform tube without losses and with the velum closed.
fn lossless_uniform(glottal: f32, labial: f32) -> ScatteringCoefficients {
    ScatteringCoefficients {
        buccal: vec![0.0; N],
        nasal: vec![0.0; M],
        glottal,
        labial,
        nares: -0.9,
        velum: VelumCoefficients::default(),
        attenuation: 1.0,
        velum_index: N / 2,
        nasal_enabled: false,
        frication: None,
    }
}

/// Energy weighted by admittance, the quantity Kelly-Lochbaum junctions conserve.
fn weighted_energy(state: &WaveState, areas: &[f32]) -> f32 {
    let chain = &state.buccal;
    (0..chain.len())
        .map(|m| (chain.right[m] * chain.right[m] + chain.left[m] * chain.left[m]) / areas[m])
        .sum()
}

fn primed_tract() -> Tract {
    let mut tract = Tract::new(TractGeometry::default(), TractParms::default()).unwrap();
    let mut excitation = vec![0.0; 64];
    excitation[0] = 1.0;
    tract.process(&excitation, &[0.0; 64], 64).unwrap();
    tract
}

proptest! {
    #[test]
    fn equal_areas_do_not_reflect(a in 1e-3f32..1e3) {
        prop_assert_eq!(reflection(a, a), 0.0);
    }

    #[test]
    fn reflection_stays_inside_unit_interval(a in 1e-3f32..1e3, b in 1e-3f32..1e3) {
        let k = reflection(a, b);
        prop_assert!(k > -1.0 && k < 1.0, "reflection({}, {}) = {}", a, b, k);
    }

    #[test]
    fn area_is_monotonic(d in 0.0f32..100.0, delta in 0.0f32..10.0) {
        prop_assert!(area(d) <= area(d + delta));
    }

    #[test]
    fn uniform_tube_is_passive(
        glottal in -1.0f32..=1.0,
        labial in -1.0f32..=1.0,
        right in prop::collection::vec(-1.0f32..1.0, N),
        left in prop::collection::vec(-1.0f32..1.0, N),
    ) {
        let k = lossless_uniform(glottal, labial);
        let mut state = WaveState::new(N, M);
        state.buccal.right.copy_from_slice(&right);
        state.buccal.left.copy_from_slice(&left);
        let before = state.energy();
        state.step(&k, 0.0, 0.0);
        prop_assert!(state.energy() <= before * (1.0 + 1e-5) + 1e-12);
    }

    #[test]
    fn shaped_tube_is_passive_in_weighted_energy(
        areas in prop::collection::vec(0.1f32..10.0, N),
        glottal in -1.0f32..=1.0,
        labial in -1.0f32..=1.0,
        right in prop::collection::vec(-1.0f32..1.0, N),
        left in prop::collection::vec(-1.0f32..1.0, N),
    ) {
        let mut k = lossless_uniform(glottal, labial);
        for m in 1..N {
            k.buccal[m] = reflection(areas[m - 1], areas[m]);
        }
        let mut state = WaveState::new(N, M);
        state.buccal.right.copy_from_slice(&right);
        state.buccal.left.copy_from_slice(&left);
        let before = weighted_energy(&state, &areas);
        state.step(&k, 0.0, 0.0);
        let after = weighted_energy(&state, &areas);
        prop_assert!(after <= before * (1.0 + 1e-4) + 1e-9, "{} > {}", after, before);
    }

    #[test]
    fn noise_stays_in_range(x in -1e3f64..1e3, y in -1e3f64..1e3, seed in any::<i64>()) {
        let value = NoiseField::new(seed).sample(x, y);
        prop_assert!((-1.0..=1.0).contains(&value));
    }
}

#[test]
fn silence_is_a_fixed_point() {
    let mut tract = Tract::new(TractGeometry::default(), TractParms::default()).unwrap();
    let zeros = vec![0.0; 512];
    let out = tract.process(&zeros, &zeros, 512).unwrap();
    assert!(out.iter().all(|&x| x == 0.0));
    assert!(tract.state().is_silent());
}

#[test]
fn echo_returns_after_one_round_trip() {
    let k = lossless_uniform(0.7, -0.85);
    let mut state = WaveState::new(N, M);
    let mut lips = Vec::new();
    for s in 0..4 * N {
        let excitation = if s == 0 { 1.0 } else { 0.0 };
        state.step(&k, excitation, 0.0);
        lips.push(state.buccal.output());
    }
    let arrivals: Vec<(usize, f32)> = lips
        .iter()
        .enumerate()
        .filter(|&(_, &x)| x != 0.0)
        .map(|(i, &x)| (i + 1, x))
        .collect();
    assert_eq!(arrivals[0], (N, 1.0));
    assert_eq!(arrivals[1].0, N + 2 * N);
    assert!((arrivals[1].1 - 0.7 * -0.85).abs() < 1e-7);
}

#[test]
fn identical_inputs_give_identical_output() {
    let field = NoiseField::new(42);
    let mut excitation = vec![0.0; 1024];
    let mut noise = vec![0.0; 1024];
    field.fill(&mut excitation, 0.0, 0.05, 0.0);
    field.fill(&mut noise, 0.0, 0.7, 10.0);
    let parms = TractParms {
        frication: Some(Frication {
            position: 30.5,
            diameter: 0.5,
        }),
        ..TractParms::default()
    };

    let mut a = Tract::new(TractGeometry::default(), parms.clone()).unwrap();
    let mut b = Tract::new(TractGeometry::default(), parms).unwrap();
    let out_a = a.process(&excitation, &noise, 1024).unwrap().to_vec();
    let out_b = b.process(&excitation, &noise, 1024).unwrap().to_vec();
    assert!(out_a.iter().any(|&x| x != 0.0));
    assert!(
        out_a
            .iter()
            .zip(&out_b)
            .all(|(x, y)| x.to_bits() == y.to_bits())
    );
}

#[test]
fn empty_block_changes_nothing() {
    let mut tract = primed_tract();
    let before = tract.state().clone();
    let out = tract.process(&[], &[], 0).unwrap();
    assert!(out.is_empty());
    assert_eq!(tract.state(), &before);
}

#[test]
fn mismatched_buffers_are_rejected_before_stepping() {
    let mut tract = primed_tract();
    let before = tract.state().clone();

    let err = tract.process(&[0.5; 128], &[0.0; 64], 128).unwrap_err();
    assert_eq!(
        err,
        TractError::BufferLengthMismatch {
            excitation: 128,
            noise: 64,
            expected: 128,
        }
    );
    assert!(matches!(
        tract.process(&[0.5; 64], &[0.0; 64], 128),
        Err(TractError::BufferLengthMismatch { .. })
    ));
    let mut out = [0.0; 32];
    assert!(matches!(
        tract.process_into(&[0.5; 64], &[0.0; 64], &mut out),
        Err(TractError::BufferLengthMismatch { .. })
    ));
    assert_eq!(tract.state(), &before);
}

#[test]
fn unit_reflection_is_rejected() {
    let parms = TractParms {
        labial_k: -1.0,
        ..TractParms::default()
    };
    assert!(matches!(
        Tract::new(TractGeometry::default(), parms.clone()),
        Err(TractError::UnstableConfiguration { what: "labial_k", .. })
    ));

    let mut tract = primed_tract();
    let before = tract.state().clone();
    assert!(matches!(
        tract.configure(TractGeometry::default(), parms),
        Err(TractError::UnstableConfiguration { .. })
    ));
    assert_eq!(tract.state(), &before);
    assert_eq!(tract.parms(), &TractParms::default());

    let velum = VelumCoefficients {
        left: 1.0,
        ..VelumCoefficients::default()
    };
    assert!(tract.set_velum(velum).is_err());
    assert_eq!(tract.coefficients().velum, VelumCoefficients::default());
}

#[test]
fn unit_attenuation_is_rejected() {
    let parms = TractParms {
        attenuation: 1.0,
        ..TractParms::default()
    };
    assert!(matches!(
        Tract::new(TractGeometry::default(), parms),
        Err(TractError::UnstableConfiguration { what: "attenuation", .. })
    ));
}

#[test]
fn degenerate_geometry_is_rejected() {
    let mut geometry = TractGeometry::default();
    geometry.buccal[5] = 0.0;
    assert!(matches!(
        Tract::new(geometry, TractParms::default()),
        Err(TractError::InvalidGeometry { .. })
    ));

    for velum_index in [0, 44] {
        let parms = TractParms {
            velum_index,
            ..TractParms::default()
        };
        assert!(matches!(
            Tract::new(TractGeometry::default(), parms),
            Err(TractError::InvalidGeometry { what: "velum_index", .. })
        ));
    }

    let parms = TractParms {
        frication: Some(Frication {
            position: 42.0,
            diameter: 0.5,
        }),
        ..TractParms::default()
    };
    assert!(Tract::new(TractGeometry::default(), parms).is_err());
}

#[test]
fn impulse_response_decays() {
    let mut tract = Tract::new(TractGeometry::default(), TractParms::default()).unwrap();
    let mut excitation = vec![0.0; 4000];
    excitation[0] = 1.0;
    let out = tract.process(&excitation, &[0.0; 4000], 4000).unwrap();
    assert!(out.iter().all(|x| x.is_finite()));
    let peak = |block: &[f32]| block.iter().fold(0.0_f32, |a, &x| a.max(x.abs()));
    assert!(peak(&out[..500]) > 100.0 * peak(&out[3500..]));
}

#[test]
fn open_velum_sounds_through_the_nose() {
    let tract = primed_tract();
    assert!(tract.state().nasal.energy() > 0.0);

    let parms = TractParms {
        nasal_enabled: false,
        ..TractParms::default()
    };
    let mut closed = Tract::new(TractGeometry::default(), parms).unwrap();
    let mut excitation = vec![0.0; 64];
    excitation[0] = 1.0;
    closed.process(&excitation, &[0.0; 64], 64).unwrap();
    assert_eq!(closed.state().nasal.energy(), 0.0);
}

#[test]
fn caller_and_instance_buffers_agree() {
    let field = NoiseField::new(9);
    let mut excitation = vec![0.0; 256];
    field.fill(&mut excitation, 0.0, 0.1, 0.0);
    let noise = vec![0.0; 256];

    let mut a = Tract::new(TractGeometry::default(), TractParms::default()).unwrap();
    let mut b = a.clone();
    let owned = a.process(&excitation, &noise, 256).unwrap().to_vec();
    let mut provided = vec![0.0; 256];
    b.process_into(&excitation, &noise, &mut provided).unwrap();
    assert_eq!(owned, provided);
}

#[test]
fn articulation_reaches_the_target() {
    let mut tract = primed_tract();
    let mut target = TractGeometry::default();
    for d in &mut target.buccal[25..35] {
        *d = 0.8;
    }
    tract.set_target(target.clone()).unwrap();

    let mut blocks = 0;
    while tract.articulate(128.0 / 48_000.0).unwrap() {
        blocks += 1;
        assert!(blocks < 1000);
    }
    assert_eq!(tract.geometry(), &target);
    assert!(tract.coefficients().buccal.iter().all(|k| k.abs() < 1.0));

    assert!(tract.set_target(TractGeometry::uniform(10, 1.0, 28, 1.0)).is_err());
    assert!(tract.articulate(-1.0).is_err());
}

#[test]
fn seeded_noise_fields_repeat() {
    let a = NoiseField::from_rng(&mut SmallRng::seed_from_u64(69));
    let b = NoiseField::from_rng(&mut SmallRng::seed_from_u64(69));
    assert_eq!(a, b);
    assert_eq!(NoiseField::new(5).sample(1.25, -3.5), NoiseField::new(5).sample(1.25, -3.5));
    for i in 0..100 {
        let x = f64::from(i) * 0.173;
        assert!((-1.0..=1.0).contains(&a.sample(x, x * 0.5)));
        assert_eq!(noise2d(&a, x, 2.0), a.sample(x, 2.0));
    }
}

#[test]
fn closed_velum_drains_the_nose_before_reopening() {
    let mut tract = primed_tract();
    let stored = tract.state().nasal.energy();
    assert!(stored > 0.0);

    tract.set_nasal_enabled(false).unwrap();
    assert!(!tract.coefficients().nasal_enabled);
    assert!(!tract.parms().nasal_enabled);
    let zeros = vec![0.0; 48_000];
    tract.process(&zeros, &zeros, 48_000).unwrap();
    let drained = tract.state().nasal.energy();
    assert!(drained < 1e-6 * stored, "{drained} left of {stored}");

    tract.set_nasal_enabled(true).unwrap();
    assert!(tract.coefficients().nasal_enabled);
    assert_eq!(tract.state().nasal.energy(), drained);
}

#[test]
fn opening_with_an_unstable_velum_is_rejected() {
    let parms = TractParms {
        nasal_enabled: false,
        velum: VelumCoefficients {
            left: 1.0,
            ..VelumCoefficients::default()
        },
        ..TractParms::default()
    };
    let mut tract = Tract::new(TractGeometry::default(), parms).unwrap();
    assert!(matches!(
        tract.set_nasal_enabled(true),
        Err(TractError::UnstableConfiguration { .. })
    ));
    assert!(!tract.coefficients().nasal_enabled);
    assert!(!tract.parms().nasal_enabled);
}

#[test]
fn configure_swaps_coefficients_and_silences() {
    let mut tract = primed_tract();
    assert!(!tract.state().is_silent());

    let resized = TractGeometry::neutral(40, 20);
    tract.configure(resized.clone(), TractParms::default()).unwrap();
    assert!(tract.state().is_silent());
    assert_eq!(tract.state().buccal.len(), 40);
    assert_eq!(tract.state().nasal.len(), 20);
    assert_eq!(tract.coefficients().buccal.len(), 40);
    assert_eq!(tract.geometry(), &resized);
    assert_eq!(tract.target(), &resized);

    let mut excitation = vec![0.0; 64];
    excitation[0] = 1.0;
    tract.process(&excitation, &[0.0; 64], 64).unwrap();
    assert!(!tract.state().is_silent());

    let parms = TractParms {
        glottal_k: 0.5,
        ..TractParms::default()
    };
    tract.configure(resized, parms.clone()).unwrap();
    assert!(tract.state().is_silent());
    assert_eq!(tract.state().buccal.len(), 40);
    assert_eq!(tract.coefficients().glottal, 0.5);
    assert_eq!(tract.parms(), &parms);
}
