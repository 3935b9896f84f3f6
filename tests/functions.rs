//! Precision comparison between element-wise expressions and the standard library.
//!
//! Native functions run through packed kernels, the others through per-lane
//! emulation. Both must reproduce the scalar `f32`/`f64` functions.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use simdmat::{
    evaluate_with_policy, AccessKind, DenseMatrix, Ex, KernelKind, MatExpr, MatRef, Policy, WIDTH,
};

const SCALAR: Policy = Policy::new(AccessKind::Linear, KernelKind::Scalar);
const PACKED: Policy = Policy::new(AccessKind::Linear, KernelKind::Simd);

/// Repeats `inputs` until at least two full packs are covered, so the packed
/// kernel sees every value in a pack lane as well as in the scalar tail.
fn tiled(inputs: &[f32]) -> Vec<f32> {
    let copies = (2 * WIDTH).div_ceil(inputs.len()) + 1;
    inputs.iter().copied().cycle().take(inputs.len() * copies).collect()
}

fn same_value(a: f32, b: f32) -> bool {
    a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
}

/// Evaluates `f` over `inputs` laid out as one column, through the scalar and the
/// packed kernels, and returns the packed result.
fn run_unary<'a, F, E>(inputs: &'a [f32], f: F) -> Vec<f32>
where
    F: Fn(Ex<MatRef<'a, f32>>) -> E,
    E: MatExpr<Elem = f32>,
{
    let view = MatRef::new(inputs, inputs.len(), 1).unwrap();
    let mut scalar = DenseMatrix::zeros(0, 0);
    let mut packed = DenseMatrix::zeros(0, 0);
    evaluate_with_policy(f(view.ex()), &mut scalar, SCALAR).unwrap();
    evaluate_with_policy(f(view.ex()), &mut packed, PACKED).unwrap();
    for (k, (&s, &p)) in scalar.as_slice().iter().zip(packed.as_slice()).enumerate() {
        assert!(same_value(s, p), "scalar {s} vs packed {p} for input {}", inputs[k]);
    }
    packed.into_vec()
}

fn assert_close(name: &str, inputs: &[f32], expected: &[f32], actual: &[f32], tolerance: f32) {
    assert_eq!(expected.len(), actual.len(), "Result vectors have different lengths");
    for (j, (&scalar_val, &engine_val)) in expected.iter().zip(actual.iter()).enumerate() {
        if scalar_val.is_nan() {
            assert!(engine_val.is_nan(), "{name}({}) should be NaN, got {engine_val}", inputs[j]);
            continue;
        }
        // equal infinities have no finite difference
        if scalar_val == engine_val {
            continue;
        }
        let absolute_error = (scalar_val - engine_val).abs();
        let relative_error = if scalar_val != 0.0 {
            absolute_error / scalar_val.abs()
        } else {
            absolute_error
        };
        assert!(
            absolute_error <= tolerance || relative_error <= tolerance,
            "Precision error too large for {name}({}): scalar={scalar_val}, engine={engine_val}, abs_error={absolute_error:.2e}, rel_error={relative_error:.2e}",
            inputs[j]
        );
    }
}

/// Test precision of each unary function against scalar `f32` for various input ranges.
#[test]
fn test_unary_precision_comparison() {
    let test_cases = [
        // Small positive values
        vec![0.0f32, 0.01, 0.1, 0.25, 0.5],
        // Unit values and perfect squares
        vec![1.0f32, 2.0, 4.0, 9.0, 16.0, 25.0, 36.0, 100.0, 256.0],
        // Negative values, including the odd lengths that leave a scalar tail
        vec![-0.75f32, -1.5, -2.0, -10.0, -1e-3],
        // Special angles
        vec![FRAC_PI_4, FRAC_PI_2, PI, -PI, 2.0 * PI],
    ];

    for (i, test_case) in test_cases.iter().enumerate() {
        println!("Testing case {}: {:?}", i + 1, test_case);
        let test_case = &tiled(test_case);

        macro_rules! check {
            ($name:ident, $tolerance:expr) => {{
                let expected: Vec<f32> = test_case.iter().map(|x| x.$name()).collect();
                let actual = run_unary(test_case, |a| a.$name());
                assert_close(stringify!($name), test_case, &expected, &actual, $tolerance);
            }};
        }

        check!(abs, 0.0);
        check!(sqrt, 0.0);
        check!(floor, 0.0);
        check!(ceil, 0.0);
        check!(trunc, 0.0);
        check!(round, 0.0);
        check!(exp, 1e-6);
        check!(exp2, 1e-6);
        check!(cbrt, 1e-6);
        check!(sin, 1e-6);
        check!(cos, 1e-6);
        check!(tan, 1e-6);
        check!(atan, 1e-6);
        check!(sinh, 1e-6);
        check!(tanh, 1e-6);

        let expected: Vec<f32> = test_case.iter().map(|x| x.ln()).collect();
        let actual = run_unary(test_case, |a| a.ln());
        assert_close("ln", test_case, &expected, &actual, 1e-6);

        let expected: Vec<f32> = test_case.iter().map(|x| x.exp_m1()).collect();
        let actual = run_unary(test_case, |a| a.expm1());
        assert_close("expm1", test_case, &expected, &actual, 1e-6);
    }
}

/// Domain-restricted functions outside their domain produce NaN like the scalar library.
#[test]
fn test_out_of_domain_inputs() {
    let inputs = tiled(&[-2.0f32, -1.0, -0.5, 0.0, 0.5, 1.0, 2.0]);

    let expected: Vec<f32> = inputs.iter().map(|x| x.asin()).collect();
    assert_close("asin", &inputs, &expected, &run_unary(&inputs, |a| a.asin()), 1e-6);

    let expected: Vec<f32> = inputs.iter().map(|x| x.acos()).collect();
    assert_close("acos", &inputs, &expected, &run_unary(&inputs, |a| a.acos()), 1e-6);

    let expected: Vec<f32> = inputs.iter().map(|x| x.sqrt()).collect();
    assert_close("sqrt", &inputs, &expected, &run_unary(&inputs, |a| a.sqrt()), 0.0);

    let expected: Vec<f32> = inputs.iter().map(|x| x.ln_1p()).collect();
    assert_close("log1p", &inputs, &expected, &run_unary(&inputs, |a| a.log1p()), 1e-6);
}

/// Test precision of the two-argument functions against scalar `f32`.
#[test]
fn test_binary_precision_comparison() {
    let ys = tiled(&[1.0f32, 1.0, -1.0, -1.0, 0.0, 100.0, -1000.0, 3.0, 0.5]);
    let xs = tiled(&[1.0f32, -1.0, 1.0, -1.0, 1.0, 50.0, -500.0, 4.0, 2.0]);
    let yv = MatRef::new(&ys, ys.len(), 1).unwrap();
    let xv = MatRef::new(&xs, xs.len(), 1).unwrap();

    macro_rules! check {
        ($name:literal, $scalar:expr, $expr:expr, $tolerance:expr) => {{
            let expected: Vec<f32> = ys.iter().zip(xs.iter()).map(|(&y, &x)| $scalar(y, x)).collect();
            for policy in [SCALAR, PACKED] {
                let mut out = DenseMatrix::zeros(0, 0);
                evaluate_with_policy($expr, &mut out, policy).unwrap();
                assert_close($name, &ys, &expected, out.as_slice(), $tolerance);
            }
        }};
    }

    check!("atan2", |y: f32, x: f32| y.atan2(x), yv.ex().atan2(xv.ex()), 1e-6);
    check!("hypot", |y: f32, x: f32| y.hypot(x), yv.ex().hypot(xv.ex()), 1e-6);
    check!("pow", |y: f32, x: f32| y.abs().powf(x), yv.ex().abs().pow(xv.ex()), 1e-6);
    check!("mod", |y: f32, x: f32| y % x, yv.ex() % xv.ex(), 0.0);
    check!("min", |y: f32, x: f32| y.min(x), yv.ex().min(xv.ex()), 0.0);
    check!("max", |y: f32, x: f32| y.max(x), yv.ex().max(xv.ex()), 0.0);
}

/// Test precision with randomly generated inputs across several pack lengths.
#[test]
fn test_precision_random_inputs() {
    let mut rng = StdRng::seed_from_u64(12345);

    for test_size in [WIDTH - 1, 4 * WIDTH + 3, 1000] {
        let inputs: Vec<f32> = (0..test_size).map(|_| rng.random::<f32>() * 1000.0).collect();

        let expected: Vec<f32> = inputs.iter().map(|x| x.sqrt() * 2.0 + 1.0).collect();
        let actual = run_unary(&inputs, |a| a.sqrt() * 2.0f32 + 1.0f32);
        assert_close("sqrt", &inputs, &expected, &actual, 0.0);

        let expected: Vec<f32> = inputs.iter().map(|x| (x / 1000.0).sin()).collect();
        let actual = run_unary(&inputs, |a| (a / 1000.0f32).sin());
        assert_close("sin", &inputs, &expected, &actual, 1e-6);
    }
}
