//! Numerical stability utilities.
//!
//! Provides safe implementations of the nonlinear transforms used by the
//! routing model and the box-bounded solver backend, which are prone to
//! overflow in naïve form once the sigmoid argument is multiplied by a large
//! temperature.
//!
//! # Provided items
//! - [`LOGIT_EPS`]: clamp applied before taking a logit so that points on a
//!   box bound map to a finite unconstrained coordinate.
//! - [`GENERAL_TOL`]: generic tolerance for probability-mass checks.
//! - [`safe_logistic(x)`]: `1 / (1 + exp(-x))` evaluated on the branch that
//!   never exponentiates a positive argument. Generic over [`Scalar`].
//! - [`safe_logit(p)`]: inverse of the logistic map with clamping.
//! - [`to_bounded`] / [`to_unbounded`]: map between a box `[lo, hi]` and ℝ.
use crate::optimization::scalar::Scalar;

/// Clamp used before taking `logit(p)`; keeps boundary points finite.
pub const LOGIT_EPS: f64 = 1e-8;

/// Generic tolerance for probability-mass and normalisation checks.
pub const GENERAL_TOL: f64 = 1e-6;

/// Numerically stable logistic function `σ(x) = 1 / (1 + exp(-x))`.
///
/// - For `x ≥ 0` evaluates `1 / (1 + exp(-x))`.
/// - For `x < 0` evaluates `exp(x) / (1 + exp(x))`.
///
/// Neither branch exponentiates a positive number, so the result and (for
/// [`Dual`](crate::optimization::scalar::Dual) inputs) its derivative stay
/// finite for arbitrarily large `|x|`.
pub fn safe_logistic<S: Scalar>(x: S) -> S {
    if x.value() >= 0.0 {
        S::one() / ((-x).exp() + 1.0)
    } else {
        let e = x.exp();
        e.clone() / (e + 1.0)
    }
}

/// Inverse logistic `logit(p) = ln(p / (1 - p))`, clamping `p` to
/// `[LOGIT_EPS, 1 - LOGIT_EPS]` first.
pub fn safe_logit(p: f64) -> f64 {
    let p = p.clamp(LOGIT_EPS, 1.0 - LOGIT_EPS);
    (p / (1.0 - p)).ln()
}

/// Map an unconstrained coordinate `z` into the box `[lo, hi]` via
/// `lo + (hi - lo) σ(z)`. A degenerate box (`lo == hi`) yields the constant.
pub fn to_bounded<S: Scalar>(z: S, lo: f64, hi: f64) -> S {
    let width = hi - lo;
    if width <= 0.0 { S::constant(lo) } else { safe_logistic(z) * width + lo }
}

/// Inverse of [`to_bounded`] for plain values; points outside the box are
/// clamped onto it first.
pub fn to_unbounded(x: f64, lo: f64, hi: f64) -> f64 {
    let width = hi - lo;
    if width <= 0.0 { 0.0 } else { safe_logit((x - lo) / width) }
}
