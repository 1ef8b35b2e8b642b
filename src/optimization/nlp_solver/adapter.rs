//! Adapter that exposes one augmented-Lagrangian subproblem as an `argmin`
//! problem.
//!
//! The constrained program `min f(x)` s.t. `xl <= x <= xu`, `gl <= g(x) <= gu`
//! is turned into an unconstrained problem in `z` by
//!
//! - mapping `x = xl + (xu - xl) σ(z)` so the box holds by construction, and
//! - adding Powell–Hestenes–Rockafellar terms for the general constraints:
//!   - equality `h = g - gl` (when `gl == gu`): `λ h + ρ/2 h²`;
//!   - inequality `c >= 0` (one per finite side): `(max(0, μ - ρ c)² - μ²) / (2ρ)`.
//!
//! Costs are evaluated in plain `f64`; gradients come from a single
//! [`Dual`] evaluation of the same formula, so no finite differences are
//! involved.
use crate::optimization::{
    errors::OptError,
    nlp_solver::{
        program::MathProgram,
        traits::ProgramEvaluator,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
    numerical_stability::transformations::to_bounded,
    scalar::{Dual, Scalar},
};
use argmin::core::{CostFunction, Error, Gradient};

/// Lagrange multiplier estimates, one slot per constraint side.
///
/// For an equality constraint only `lower[i]` is used and it may take
/// either sign. For inequalities `lower[i]` belongs to `g_i >= gl_i` and
/// `upper[i]` to `g_i <= gu_i`; both stay non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct Multipliers {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Multipliers {
    pub fn zeros(n_constraints: usize) -> Self {
        Self { lower: vec![0.0; n_constraints], upper: vec![0.0; n_constraints] }
    }

    /// First-order multiplier update at constraint values `g`.
    pub fn update<E: ProgramEvaluator>(
        &mut self, program: &MathProgram<'_, E>, g: &Theta, rho: f64,
    ) {
        for (i, &gi) in g.iter().enumerate() {
            let (lo, hi) = (program.gl[i], program.gu[i]);
            if lo == hi {
                self.lower[i] += rho * (gi - lo);
                continue;
            }
            self.lower[i] = (self.lower[i] - rho * (gi - lo)).max(0.0);
            if hi.is_finite() {
                self.upper[i] = (self.upper[i] - rho * (hi - gi)).max(0.0);
            }
        }
    }
}

/// Bridges an augmented-Lagrangian subproblem to `argmin`'s `CostFunction`
/// and `Gradient`.
#[derive(Debug)]
pub struct AugLagAdapter<'p, 'a, E: ProgramEvaluator> {
    pub program: &'p MathProgram<'a, E>,
    pub multipliers: &'p Multipliers,
    pub rho: f64,
}

impl<'p, 'a, E: ProgramEvaluator> AugLagAdapter<'p, 'a, E> {
    pub fn new(program: &'p MathProgram<'a, E>, multipliers: &'p Multipliers, rho: f64) -> Self {
        Self { program, multipliers, rho }
    }

    /// Augmented Lagrangian at the unconstrained point `z`, in any scalar
    /// domain.
    fn lagrangian<S: Scalar>(&self, z: Vec<S>) -> S {
        let p = self.program;
        let x: Vec<S> = z
            .into_iter()
            .zip(p.xl.iter().zip(p.xu.iter()))
            .map(|(zi, (&lo, &hi))| to_bounded(zi, lo, hi))
            .collect();
        let mut fg = vec![S::zero(); 1 + p.n_constraints()];
        p.evaluator.eval(&x, &mut fg);

        let rho = self.rho;
        let mut fg = fg.into_iter();
        let mut total = fg.next().unwrap_or_else(S::zero);
        for (i, gi) in fg.enumerate() {
            let (lo, hi) = (p.gl[i], p.gu[i]);
            if lo == hi {
                let h = gi - lo;
                total += h.clone() * self.multipliers.lower[i] + h.clone() * h * (0.5 * rho);
                continue;
            }
            total += phr_inequality(gi.clone() - lo, self.multipliers.lower[i], rho);
            if hi.is_finite() {
                total += phr_inequality(-gi + hi, self.multipliers.upper[i], rho);
            }
        }
        total
    }
}

/// PHR term for `c >= 0` with multiplier `mu`.
fn phr_inequality<S: Scalar>(c: S, mu: f64, rho: f64) -> S {
    let shifted = -(c * rho) + mu;
    if shifted.value() > 0.0 {
        (shifted.clone() * shifted - mu * mu) / (2.0 * rho)
    } else {
        S::constant(-mu * mu / (2.0 * rho))
    }
}

impl<'p, 'a, E: ProgramEvaluator> CostFunction for AugLagAdapter<'p, 'a, E> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate the augmented Lagrangian at `z`.
    ///
    /// # Errors
    /// Returns `NonFiniteCost` if the value is not finite.
    fn cost(&self, z: &Self::Param) -> Result<Self::Output, Error> {
        let value = self.lagrangian(z.to_vec());
        if !value.is_finite() {
            return Err((OptError::NonFiniteCost { value }).into());
        }
        Ok(value)
    }
}

impl<'p, 'a, E: ProgramEvaluator> Gradient for AugLagAdapter<'p, 'a, E> {
    type Param = Theta;
    type Gradient = Grad;

    /// Exact gradient of the augmented Lagrangian with respect to `z`.
    ///
    /// # Errors
    /// Returns `InvalidGradient` if any component is non-finite.
    fn gradient(&self, z: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = z.len();
        let seeded: Vec<Dual> =
            z.iter().enumerate().map(|(i, &zi)| Dual::variable(zi, i, dim)).collect();
        let grad = Grad::from(self.lagrangian(seeded).gradient(dim));
        validate_grad(&grad, dim)?;
        Ok(grad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::nlp_solver::program::tests::{Toy, toy_program};
    use approx::assert_relative_eq;
    use finitediff::FiniteDiff;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Agreement of the dual gradient with finite differences of the cost.
    // - Reduction to the plain objective when multipliers vanish and the
    //   constraints hold.
    // - Multiplier updates for equality and inequality sides.
    //
    // They intentionally DO NOT cover:
    // - Outer-loop convergence, tested in `api`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Cross-check the exact gradient against central differences with
    // non-zero multipliers, so every PHR branch contributes.
    //
    // Given
    // -----
    // - Toy program, λ = 0.3 on the equality, μ = 0.7 on the inequality,
    //   ρ = 4, at a point where the inequality is active.
    //
    // Expect
    // ------
    // - Gradients agree to 1e-5 relative tolerance.
    fn gradient_matches_finite_differences() {
        // Arrange
        let toy = Toy;
        let program = toy_program(&toy);
        let multipliers = Multipliers { lower: vec![0.3, 0.7], upper: vec![0.0, 0.0] };
        let adapter = AugLagAdapter::new(&program, &multipliers, 4.0);
        let z = array![0.2, 0.4];

        // Act
        let grad = adapter.gradient(&z).unwrap();
        let fd = z.central_diff(&|p: &Theta| adapter.cost(p).unwrap());

        // Assert
        for i in 0..2 {
            assert_relative_eq!(grad[i], fd[i], max_relative = 1e-5, epsilon = 1e-8);
        }
    }

    #[test]
    // Purpose
    // -------
    // With zero multipliers at a feasible point the augmented Lagrangian
    // equals the objective.
    fn feasible_point_without_multipliers_costs_objective() {
        let toy = Toy;
        let program = toy_program(&toy);
        let multipliers = Multipliers::zeros(2);
        let adapter = AugLagAdapter::new(&program, &multipliers, 10.0);
        let x = array![0.75, 0.25];

        let z = program.from_box(&x);
        let cost = adapter.cost(&z).unwrap();

        let (f, _) = program.evaluate(&program.to_box(&z));
        assert_relative_eq!(cost, f, epsilon = 1e-9);
        assert_relative_eq!(program.to_box(&z)[0], 0.75, epsilon = 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // Multiplier updates follow λ += ρh for equalities and μ = max(0, μ - ρc)
    // for inequalities.
    fn multiplier_update_rules() {
        let toy = Toy;
        let program = toy_program(&toy);
        let mut m = Multipliers { lower: vec![0.0, 0.5], upper: vec![0.0, 0.0] };

        // h = 3 - 1 = 2, c = -3 - 0 = -3.
        m.update(&program, &array![3.0, -3.0], 2.0);
        assert_relative_eq!(m.lower[0], 4.0);
        assert_relative_eq!(m.lower[1], 6.5);

        // c = 10 satisfied with slack: multiplier clamps to zero.
        m.update(&program, &array![1.0, 10.0], 2.0);
        assert_relative_eq!(m.lower[0], 4.0);
        assert_relative_eq!(m.lower[1], 0.0);
        assert_eq!(m.upper, vec![0.0, 0.0]);
    }
}
