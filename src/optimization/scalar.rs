//! optimization::scalar: numeric domain shared by prediction and training.
//!
//! Purpose
//! -------
//! Let the routing, cost, penalty, and constraint formulas be written once and
//! evaluated in two interchangeable numeric domains: plain `f64` (prediction
//! and post-fit diagnostics) and [`Dual`] (forward-mode automatic
//! differentiation used by the solver to obtain exact gradients).
//!
//! Key behaviors
//! -------------
//! - [`Scalar`] abstracts over addition, subtraction, multiplication, division,
//!   negation, mixed arithmetic with `f64`, an exponential primitive, and
//!   read-only access to the real part (used for branch decisions).
//! - [`Dual`] carries a value and a dense gradient. Constants carry an empty
//!   gradient and never allocate; binary operations broadcast an empty
//!   gradient as the zero vector.
//!
//! Invariants & assumptions
//! ------------------------
//! - Two non-constant `Dual`s combined in one operation must share the same
//!   gradient dimension; this holds whenever every variable of a program is
//!   seeded with [`Dual::variable`] using the same `dim`.
//! - Comparisons are made on `value()` only; branches therefore select a
//!   smooth piece of a piecewise formula and never differentiate through the
//!   branch condition.
//!
//! Conventions
//! -----------
//! - The gradient of a `Dual` is with respect to the seeded variables, in
//!   seeding order.
//! - `f64` implements [`Scalar`] with the obvious identity semantics.
//!
//! Testing notes
//! -------------
//! - Unit tests compare `Dual` gradients of small composite expressions with
//!   closed forms and with central finite differences.
use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// Numeric interface shared by the plain and differentiable domains.
pub trait Scalar:
    Clone
    + Debug
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Add<f64, Output = Self>
    + Sub<f64, Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
    + AddAssign
{
    /// Lift a plain constant into the domain.
    fn constant(value: f64) -> Self;

    /// Real part.
    fn value(&self) -> f64;

    /// Natural exponential.
    fn exp(&self) -> Self;

    /// Keep the derivative part, replace the real part with `value`.
    fn with_value(self, value: f64) -> Self;

    fn zero() -> Self {
        Self::constant(0.0)
    }

    fn one() -> Self {
        Self::constant(1.0)
    }
}

impl Scalar for f64 {
    #[inline]
    fn constant(value: f64) -> Self {
        value
    }

    #[inline]
    fn value(&self) -> f64 {
        *self
    }

    #[inline]
    fn exp(&self) -> Self {
        f64::exp(*self)
    }

    #[inline]
    fn with_value(self, value: f64) -> Self {
        value
    }
}

/// Forward-mode dual number with a dense gradient.
///
/// An empty `grad` stands for the zero vector, so constants are cheap.
#[derive(Debug, Clone, PartialEq)]
pub struct Dual {
    re: f64,
    grad: Vec<f64>,
}

impl Dual {
    /// Independent variable `index` out of `dim`, with value `value`.
    pub fn variable(value: f64, index: usize, dim: usize) -> Self {
        let mut grad = vec![0.0; dim];
        grad[index] = 1.0;
        Dual { re: value, grad }
    }

    /// Gradient with respect to the seeded variables; zero-filled to `dim`
    /// when the number is a constant.
    pub fn gradient(&self, dim: usize) -> Vec<f64> {
        if self.grad.is_empty() { vec![0.0; dim] } else { self.grad.clone() }
    }

    pub fn is_constant(&self) -> bool {
        self.grad.is_empty()
    }

    fn scaled(mut self, factor: f64) -> Vec<f64> {
        self.grad.iter_mut().for_each(|g| *g *= factor);
        self.grad
    }
}

/// `ca * a + cb * b` with empty vectors read as zero.
fn combine(a: Vec<f64>, ca: f64, b: Vec<f64>, cb: f64) -> Vec<f64> {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Vec::new(),
        (false, true) => a.into_iter().map(|x| ca * x).collect(),
        (true, false) => b.into_iter().map(|x| cb * x).collect(),
        (false, false) => {
            debug_assert_eq!(a.len(), b.len(), "dual gradients must share a dimension");
            a.into_iter().zip(b).map(|(x, y)| ca * x + cb * y).collect()
        }
    }
}

impl Scalar for Dual {
    fn constant(value: f64) -> Self {
        Dual { re: value, grad: Vec::new() }
    }

    fn value(&self) -> f64 {
        self.re
    }

    fn exp(&self) -> Self {
        let e = self.re.exp();
        Dual { re: e, grad: self.grad.iter().map(|g| g * e).collect() }
    }

    fn with_value(self, value: f64) -> Self {
        Dual { re: value, grad: self.grad }
    }
}

impl Add for Dual {
    type Output = Dual;

    fn add(self, rhs: Dual) -> Dual {
        Dual { re: self.re + rhs.re, grad: combine(self.grad, 1.0, rhs.grad, 1.0) }
    }
}

impl Sub for Dual {
    type Output = Dual;

    fn sub(self, rhs: Dual) -> Dual {
        Dual { re: self.re - rhs.re, grad: combine(self.grad, 1.0, rhs.grad, -1.0) }
    }
}

impl Mul for Dual {
    type Output = Dual;

    fn mul(self, rhs: Dual) -> Dual {
        let (a, b) = (self.re, rhs.re);
        Dual { re: a * b, grad: combine(self.grad, b, rhs.grad, a) }
    }
}

impl Div for Dual {
    type Output = Dual;

    fn div(self, rhs: Dual) -> Dual {
        let (a, b) = (self.re, rhs.re);
        let inv = 1.0 / b;
        Dual { re: a * inv, grad: combine(self.grad, inv, rhs.grad, -a * inv * inv) }
    }
}

impl Neg for Dual {
    type Output = Dual;

    fn neg(self) -> Dual {
        let re = -self.re;
        Dual { re, grad: self.scaled(-1.0) }
    }
}

impl Add<f64> for Dual {
    type Output = Dual;

    fn add(self, rhs: f64) -> Dual {
        Dual { re: self.re + rhs, grad: self.grad }
    }
}

impl Sub<f64> for Dual {
    type Output = Dual;

    fn sub(self, rhs: f64) -> Dual {
        Dual { re: self.re - rhs, grad: self.grad }
    }
}

impl Mul<f64> for Dual {
    type Output = Dual;

    fn mul(self, rhs: f64) -> Dual {
        let re = self.re * rhs;
        Dual { re, grad: self.scaled(rhs) }
    }
}

impl Div<f64> for Dual {
    type Output = Dual;

    fn div(self, rhs: f64) -> Dual {
        let re = self.re / rhs;
        Dual { re, grad: self.scaled(1.0 / rhs) }
    }
}

impl AddAssign for Dual {
    fn add_assign(&mut self, rhs: Dual) {
        self.re += rhs.re;
        let lhs = std::mem::take(&mut self.grad);
        self.grad = combine(lhs, 1.0, rhs.grad, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use finitediff::FiniteDiff;
    use ndarray::{Array1, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Gradient propagation of the `Dual` arithmetic and `exp`.
    // - Constant broadcasting (empty gradients).
    //
    // They intentionally DO NOT cover:
    // - Routing/objective formulas, tested in `tree`.
    // -------------------------------------------------------------------------

    fn composite<S: Scalar>(x: &[S]) -> S {
        // f(x, y) = x * y / (1 + exp(-x)) - 3 y
        let s = S::one() / ((-x[0].clone()).exp() + 1.0);
        x[0].clone() * x[1].clone() * s - x[1].clone() * 3.0
    }

    #[test]
    // Purpose
    // -------
    // Verify that the gradient of a product matches the product rule.
    //
    // Given
    // -----
    // - x = 2, y = -3 seeded as variables 0 and 1.
    //
    // Expect
    // ------
    // - d(xy)/dx = y, d(xy)/dy = x.
    fn product_rule_is_exact() {
        // Arrange
        let x = Dual::variable(2.0, 0, 2);
        let y = Dual::variable(-3.0, 1, 2);

        // Act
        let p = x * y;

        // Assert
        assert_relative_eq!(p.value(), -6.0);
        assert_eq!(p.gradient(2), vec![-3.0, 2.0]);
    }

    #[test]
    // Purpose
    // -------
    // Ensure constants never allocate a gradient and read back as zeros.
    //
    // Given
    // -----
    // - Two constants combined through every operator.
    //
    // Expect
    // ------
    // - The result is still a constant with an all-zero padded gradient.
    fn constants_stay_constant() {
        let a = Dual::constant(1.5);
        let b = Dual::constant(0.5);

        let c = (a.clone() + b.clone()) * (a - b) / 2.0 + 1.0;

        assert!(c.is_constant());
        assert_relative_eq!(c.value(), 2.0);
        assert_eq!(c.gradient(3), vec![0.0; 3]);
    }

    #[test]
    // Purpose
    // -------
    // `with_value` swaps the real part and leaves the derivative untouched.
    fn with_value_keeps_gradient() {
        let x = Dual::variable(2.0, 1, 3) * 4.0;

        let y = x.with_value(-1.0);

        assert_eq!(y.value(), -1.0);
        assert_eq!(y.gradient(3), vec![0.0, 4.0, 0.0]);
        assert_eq!(3.0_f64.with_value(5.0), 5.0);
    }

    #[test]
    // Purpose
    // -------
    // Cross-check the `Dual` gradient of a composite expression against a
    // central finite-difference gradient of the same expression in `f64`.
    //
    // Given
    // -----
    // - f(x, y) = x y sigmoid(x) - 3y at (0.7, -1.2).
    //
    // Expect
    // ------
    // - Gradients agree to 1e-6 relative tolerance; values agree exactly.
    fn composite_gradient_matches_finite_differences() {
        // Arrange
        let point: Array1<f64> = array![0.7, -1.2];
        let duals: Vec<Dual> =
            point.iter().enumerate().map(|(i, &v)| Dual::variable(v, i, 2)).collect();

        // Act
        let out = composite(&duals);
        let fd = point.central_diff(&|p: &Array1<f64>| composite(&[p[0], p[1]]));

        // Assert
        assert_relative_eq!(out.value(), composite(&[0.7, -1.2]), epsilon = 1e-14);
        let grad = out.gradient(2);
        for i in 0..2 {
            assert_relative_eq!(grad[i], fd[i], max_relative = 1e-6);
        }
    }

    #[test]
    // Purpose
    // -------
    // Check that `+=` accumulates both value and gradient, including when the
    // accumulator starts as a constant zero.
    fn add_assign_accumulates_from_constant_zero() {
        let mut acc = Dual::zero();
        acc += Dual::variable(1.0, 0, 2);
        acc += Dual::variable(2.0, 1, 2) * 3.0;

        assert_relative_eq!(acc.value(), 7.0);
        assert_eq!(acc.gradient(2), vec![1.0, 3.0]);
    }
}
