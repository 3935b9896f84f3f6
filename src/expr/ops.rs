//! Operation tags.
//!
//! Each operation is a zero-sized type carrying its name, whether the active kind
//! has a native pack instruction for it, and one generic body that serves scalars
//! and packs alike. Expression nodes are generic over the tag, so there is exactly
//! one node implementation per arity.

use std::fmt::Debug;

use crate::simd::{BoolLanes, DefaultKind, Real, SimdKind};

const ROUNDING: bool = <DefaultKind as SimdKind>::NATIVE_ROUNDING;

/// Element-wise function of one real operand.
pub trait UnaryFn: Copy + Default + Debug + 'static {
    const NAME: &'static str;

    /// The active kind computes this with pack instructions rather than lane by lane.
    const NATIVE: bool;

    fn apply<V: Real>(x: V) -> V;
}

/// Element-wise function of two real operands.
pub trait BinaryFn: Copy + Default + Debug + 'static {
    const NAME: &'static str;
    const NATIVE: bool;

    fn apply<V: Real>(a: V, b: V) -> V;
}

/// Comparison of two real operands.
pub trait CmpFn: Copy + Default + Debug + 'static {
    const NAME: &'static str;

    fn apply<V: Real>(a: V, b: V) -> V::Mask;
}

/// Test on one real operand.
pub trait PredFn: Copy + Default + Debug + 'static {
    const NAME: &'static str;

    fn apply<V: Real>(x: V) -> V::Mask;
}

/// Combination of two boolean operands.
pub trait LogicFn: Copy + Default + Debug + 'static {
    const NAME: &'static str;

    fn apply<M: BoolLanes>(a: M, b: M) -> M;
}

macro_rules! unary_ops {
    ($($name:ident = $label:literal, $native:expr, |$x:ident| $body:expr;)*) => {
        $(
            #[derive(Debug, Clone, Copy, Default)]
            pub struct $name;

            impl UnaryFn for $name {
                const NAME: &'static str = $label;
                const NATIVE: bool = $native;

                #[inline(always)]
                fn apply<V: Real>($x: V) -> V {
                    $body
                }
            }
        )*
    };
}

unary_ops! {
    Neg = "neg", true, |x| -x;
    Abs = "abs", true, |x| x.abs();
    Sqr = "sqr", true, |x| x * x;
    Cube = "cube", true, |x| x * x * x;
    Rcp = "rcp", true, |x| V::from_f64(1.0) / x;
    Sqrt = "sqrt", true, |x| x.sqrt();
    Rsqrt = "rsqrt", true, |x| V::from_f64(1.0) / x.sqrt();
    Cbrt = "cbrt", false, |x| x.cbrt();
    Exp = "exp", false, |x| x.exp();
    Exp2 = "exp2", false, |x| x.exp2();
    Expm1 = "expm1", false, |x| x.exp_m1();
    Ln = "log", false, |x| x.ln();
    Log2 = "log2", false, |x| x.log2();
    Log10 = "log10", false, |x| x.log10();
    Log1p = "log1p", false, |x| x.ln_1p();
    Sin = "sin", false, |x| x.sin();
    Cos = "cos", false, |x| x.cos();
    Tan = "tan", false, |x| x.tan();
    Asin = "asin", false, |x| x.asin();
    Acos = "acos", false, |x| x.acos();
    Atan = "atan", false, |x| x.atan();
    Sinh = "sinh", false, |x| x.sinh();
    Cosh = "cosh", false, |x| x.cosh();
    Tanh = "tanh", false, |x| x.tanh();
    Asinh = "asinh", false, |x| x.asinh();
    Acosh = "acosh", false, |x| x.acosh();
    Atanh = "atanh", false, |x| x.atanh();
    Floor = "floor", ROUNDING, |x| x.floor();
    Ceil = "ceil", ROUNDING, |x| x.ceil();
    Round = "round", false, |x| x.round();
    Trunc = "trunc", ROUNDING, |x| x.trunc();
}

macro_rules! binary_ops {
    ($($name:ident = $label:literal, $native:expr, |$a:ident, $b:ident| $body:expr;)*) => {
        $(
            #[derive(Debug, Clone, Copy, Default)]
            pub struct $name;

            impl BinaryFn for $name {
                const NAME: &'static str = $label;
                const NATIVE: bool = $native;

                #[inline(always)]
                fn apply<V: Real>($a: V, $b: V) -> V {
                    $body
                }
            }
        )*
    };
}

binary_ops! {
    Add = "add", true, |a, b| a + b;
    Sub = "sub", true, |a, b| a - b;
    Mul = "mul", true, |a, b| a * b;
    Div = "div", true, |a, b| a / b;
    Rem = "mod", false, |a, b| a % b;
    Min = "min", true, |a, b| a.min(b);
    Max = "max", true, |a, b| a.max(b);
    Pow = "pow", false, |a, b| a.powf(b);
    Hypot = "hypot", false, |a, b| a.hypot(b);
    Atan2 = "atan2", false, |a, b| a.atan2(b);
}

macro_rules! cmp_ops {
    ($($name:ident = $label:literal, $method:ident;)*) => {
        $(
            #[derive(Debug, Clone, Copy, Default)]
            pub struct $name;

            impl CmpFn for $name {
                const NAME: &'static str = $label;

                #[inline(always)]
                fn apply<V: Real>(a: V, b: V) -> V::Mask {
                    a.$method(b)
                }
            }
        )*
    };
}

cmp_ops! {
    Eq = "eq", cmp_eq;
    Ne = "ne", cmp_ne;
    Lt = "lt", cmp_lt;
    Le = "le", cmp_le;
    Gt = "gt", cmp_gt;
    Ge = "ge", cmp_ge;
}

macro_rules! pred_ops {
    ($($name:ident = $label:literal, |$x:ident| $body:expr;)*) => {
        $(
            #[derive(Debug, Clone, Copy, Default)]
            pub struct $name;

            impl PredFn for $name {
                const NAME: &'static str = $label;

                #[inline(always)]
                fn apply<V: Real>($x: V) -> V::Mask {
                    $body
                }
            }
        )*
    };
}

pred_ops! {
    Signbit = "signbit", |x| x.signbit();
    IsNan = "isnan", |x| x.cmp_ne(x);
    IsInf = "isinf", |x| x.abs().cmp_eq(V::from_f64(f64::INFINITY));
    IsFinite = "isfinite", |x| x.abs().cmp_lt(V::from_f64(f64::INFINITY));
}

#[derive(Debug, Clone, Copy, Default)]
pub struct And;

#[derive(Debug, Clone, Copy, Default)]
pub struct Or;

#[derive(Debug, Clone, Copy, Default)]
pub struct Xor;

/// Boolean equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct Eqv;

/// Boolean inequality.
#[derive(Debug, Clone, Copy, Default)]
pub struct Neqv;

impl LogicFn for And {
    const NAME: &'static str = "and";

    #[inline(always)]
    fn apply<M: BoolLanes>(a: M, b: M) -> M {
        a & b
    }
}

impl LogicFn for Or {
    const NAME: &'static str = "or";

    #[inline(always)]
    fn apply<M: BoolLanes>(a: M, b: M) -> M {
        a | b
    }
}

impl LogicFn for Xor {
    const NAME: &'static str = "xor";

    #[inline(always)]
    fn apply<M: BoolLanes>(a: M, b: M) -> M {
        a ^ b
    }
}

impl LogicFn for Eqv {
    const NAME: &'static str = "eq";

    #[inline(always)]
    fn apply<M: BoolLanes>(a: M, b: M) -> M {
        !(a ^ b)
    }
}

impl LogicFn for Neqv {
    const NAME: &'static str = "ne";

    #[inline(always)]
    fn apply<M: BoolLanes>(a: M, b: M) -> M {
        a ^ b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::PackOf;
    use crate::simd::{Packed, WIDTH};

    fn same_on_packs<Op: UnaryFn>(inputs: &[f64]) {
        for chunk in inputs.chunks_exact(WIDTH) {
            let pack = Op::apply(<PackOf<f64>>::from_fn(|l| chunk[l]));
            for (l, x) in chunk.iter().enumerate() {
                let scalar = Op::apply(*x);
                let lane = pack.extract(l);
                assert!(
                    scalar.to_bits() == lane.to_bits() || (scalar.is_nan() && lane.is_nan()),
                    "{}: scalar {scalar} vs lane {lane} for {x}",
                    Op::NAME
                );
            }
        }
    }

    #[test]
    fn test_unary_ops_agree_on_scalars_and_packs() {
        let inputs: Vec<f64> = (0..4 * WIDTH).map(|k| k as f64 * 0.37 - 2.5).collect();
        same_on_packs::<Neg>(&inputs);
        same_on_packs::<Abs>(&inputs);
        same_on_packs::<Sqr>(&inputs);
        same_on_packs::<Rcp>(&inputs);
        same_on_packs::<Sqrt>(&inputs);
        same_on_packs::<Exp>(&inputs);
        same_on_packs::<Ln>(&inputs);
        same_on_packs::<Floor>(&inputs);
        same_on_packs::<Ceil>(&inputs);
        same_on_packs::<Round>(&inputs);
        same_on_packs::<Trunc>(&inputs);
        same_on_packs::<Atanh>(&inputs);
    }

    #[test]
    fn test_binary_and_compare() {
        assert_eq!(Hypot::apply(3.0f32, 4.0), 5.0);
        assert_eq!(Rem::apply(7.5f64, 2.0), 1.5);
        assert_eq!(Min::apply(1.0f64, f64::NAN).is_nan(), true);
        assert!(Le::apply(2.0f32, 2.0));
        assert!(!Ne::apply(2.0f32, 2.0));
        assert!(Xor::apply(true, false));
        assert!(!And::apply(true, false));
        assert!(Eqv::apply(false, false));
        assert!(!Eqv::apply(true, false));
        assert!(Neqv::apply(true, false));
    }

    #[test]
    fn test_predicates_agree_on_scalars_and_packs() {
        let specials = [
            0.0f64,
            -0.0,
            1.5,
            -2.0,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NAN,
            -f64::NAN,
            f64::MIN_POSITIVE,
            -f64::MAX,
        ];
        let inputs: Vec<f64> = specials.iter().cycle().take(specials.len() * WIDTH).copied().collect();

        fn check<Op: PredFn>(inputs: &[f64], expected: impl Fn(f64) -> bool) {
            for chunk in inputs.chunks_exact(WIDTH) {
                let mask = Op::apply(<PackOf<f64>>::from_fn(|l| chunk[l])).to_bits();
                for (l, &x) in chunk.iter().enumerate() {
                    assert_eq!(Op::apply(x), expected(x), "{} on scalar {x}", Op::NAME);
                    assert_eq!((mask >> l) & 1 == 1, expected(x), "{} on lane {x}", Op::NAME);
                }
            }
        }

        check::<Signbit>(&inputs, |x| x.is_sign_negative());
        check::<IsNan>(&inputs, |x| x.is_nan());
        check::<IsInf>(&inputs, |x| x.is_infinite());
        check::<IsFinite>(&inputs, |x| x.is_finite());
    }
}
