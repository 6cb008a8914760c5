//! End-to-end checks of built tables against their target functions.

use std::f64::consts::PI;

use polylut::{
    taylor, CompositeLookupTable, DiscontinuityKind, FunctionContainer,
    LimitKind, LookupTable, LookupTableGenerator, LutError, LutParameters,
    Registry, SpecialPoint,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn par(min: f64, max: f64, step: f64) -> LutParameters<f64> {
    LutParameters {
        min_arg: min,
        max_arg: max,
        step_size: step,
    }
}

#[test]
fn cubic_interpolation_of_sin() {
    let fc = FunctionContainer::new(|x: f64| x.sin());
    let registry = Registry::with_default_families();
    let lut = registry
        .build("UniformCubicInterpolation", &fc, par(0.0, 2.0 * PI, 0.01))
        .unwrap();

    let x = PI / 4.0;
    assert!((lut.eval(x) - x.sin()).abs() < 1e-9);
    // the first sample is stored verbatim
    assert_eq!(lut.eval(0.0), 0.0);
}

#[test]
fn linear_interpolation_of_exp() {
    let fc = FunctionContainer::new(|x: f64| x.exp());
    let registry = Registry::with_default_families();
    let lut = registry
        .build("UniformLinearInterpolation", &fc, par(0.0, 1.0, 0.1))
        .unwrap();

    let mid = lut.eval(0.5);
    assert!((1.6484..=1.6492).contains(&mid), "T(0.5) = {mid}");

    // |T - exp| <= h^2 max|exp''| / 8 over the whole domain
    let bound = 0.1 * 0.1 * 1.0f64.exp() / 8.0;
    for i in 0..=1000 {
        let x = i as f64 / 1000.0;
        assert!(
            (lut.eval(x) - x.exp()).abs() <= bound,
            "chord error at {x} exceeds the curvature bound"
        );
    }
}

#[test]
fn generator_meets_tolerance_on_the_runge_function() {
    let fc = FunctionContainer::new(|x: f64| 1.0 / (1.0 + 25.0 * x * x));
    let registry = Registry::with_default_families();
    let generator = LookupTableGenerator::new(&fc, &registry, -1.0, 1.0);

    let lut = generator
        .generate_by_tol("UniformCubicInterpolation", 1e-4)
        .unwrap();
    // the one-interval shortcut must not fire on a function this curvy
    assert!(lut.num_intervals() > 1);
    assert!(lut.step_size() < 2.0);

    let err = generator
        .error_at_step_size("UniformCubicInterpolation", lut.step_size())
        .unwrap();
    assert!(err <= 1e-4, "sampled error {err} above tolerance");
}

#[test]
fn pade_pole_guard_on_tan() {
    // tan's pole at pi/2 sits just past the table; the last subinterval's
    // rational block must fall back to its Taylor polynomial
    let fc = FunctionContainer::with_derivatives(
        |x: f64| x.tan(),
        |x, k| {
            let v = taylor::variable(x, k + 1);
            let mut s = vec![0.0; k + 1];
            let mut c = vec![0.0; k + 1];
            taylor::sin_cos(&v, &mut s, &mut c);
            let mut t = vec![0.0; k + 1];
            taylor::div(&s, &c, &mut t);
            taylor::derivatives(&t)
        },
    );
    let registry = Registry::with_default_families();
    let lut = registry
        .build("UniformPade<2,2>", &fc, par(0.0, 1.5, 0.1))
        .unwrap();

    let record = lut.to_record();
    let last = lut.num_intervals() - 1;
    // denominator slots (q1, q2) of the block containing x = 1.4
    assert_eq!(record.table[last].coefs[3], 0.0);
    assert_eq!(record.table[last].coefs[4], 0.0);
    // interior blocks keep their rational form
    assert!(record.table[7].coefs[3] != 0.0);

    // away from the pole the approximant is tight
    assert!((lut.eval(0.75) - 0.75f64.tan()).abs() < 5e-6);
}

#[test]
fn composite_absolute_value() {
    let fc = FunctionContainer::new(|x: f64| x.abs());
    let registry = Registry::with_default_families();
    let points = vec![
        SpecialPoint::new(-1.0, 1.0, DiscontinuityKind::None, LimitKind::Equals),
        SpecialPoint::new(
            0.0,
            0.0,
            DiscontinuityKind::FirstDerivative,
            LimitKind::Equals,
        ),
        SpecialPoint::new(1.0, 1.0, DiscontinuityKind::None, LimitKind::Equals),
    ];
    let lut = CompositeLookupTable::new(
        &fc,
        &registry,
        &["UniformLinearInterpolation", "UniformLinearInterpolation"],
        &[0.01, 0.01],
        points,
    )
    .unwrap();

    assert!((lut.eval(-0.5).unwrap() - 0.5).abs() < 5e-6);
    assert!(lut.eval(0.0).unwrap().abs() < 5e-6);
    assert!((lut.eval(0.5).unwrap() - 0.5).abs() < 5e-6);
    assert!(matches!(
        lut.eval(2.0),
        Err(LutError::DomainOutOfRange { .. })
    ));
}

#[test]
fn json_roundtrip_preserves_bits_and_behavior() {
    let fc = FunctionContainer::new(|x: f64| x * x);
    let registry = Registry::with_default_families();
    let lut = registry
        .build("UniformQuadraticInterpolation", &fc, par(0.0, 1.0, 0.1))
        .unwrap();

    let json = lut.to_json().unwrap();
    let text = serde_json::to_string(&json).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    let back = LookupTable::<f64>::from_json(&parsed).unwrap();

    // coefficients survive byte for byte
    let before = lut.to_record();
    let after = back.to_record();
    for (a, b) in before.table.iter().zip(after.table.iter()) {
        for (ca, cb) in a.coefs.iter().zip(b.coefs.iter()) {
            assert_eq!(ca.to_bits(), cb.to_bits());
        }
    }

    // and the evaluators agree everywhere
    let mut rng = StdRng::seed_from_u64(12345);
    for _ in 0..100 {
        let x: f64 = rng.random_range(0.0..1.0);
        assert_eq!(lut.eval(x), back.eval(x));
    }
}

#[test]
fn loading_as_the_wrong_family_fails() {
    let fc = FunctionContainer::new(|x: f64| x * x);
    let registry = Registry::with_default_families();
    let lut = registry
        .build("UniformQuadraticInterpolation", &fc, par(0.0, 1.0, 0.1))
        .unwrap();
    let json = lut.to_json().unwrap();

    assert!(LookupTable::<f64>::from_json_expecting(
        &json,
        "UniformQuadraticInterpolation"
    )
    .is_ok());
    assert!(matches!(
        LookupTable::<f64>::from_json_expecting(&json, "UniformCubicTaylor"),
        Err(LutError::NameMismatch { .. })
    ));
}
