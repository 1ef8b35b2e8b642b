//! High-level entry point for solving a [`MathProgram`].
//!
//! [`AugLagSolver`] runs a Powell–Hestenes–Rockafellar augmented-Lagrangian
//! outer loop. Each outer step minimizes one [`AugLagAdapter`] subproblem
//! with L-BFGS (chosen line search first, the other one as a single
//! fallback), then updates the multipliers and, when the violation did not
//! shrink enough, the penalty weight. Every outer step starts from a point
//! whose unconstrained coordinates are clamped to `±`[`Z_START_CAP`], and a
//! solve that ends infeasible is reported as an error.
use crate::optimization::{
    errors::{OptError, OptResult},
    nlp_solver::{
        adapter::{AugLagAdapter, Multipliers},
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        program::MathProgram,
        run::run_lbfgs,
        traits::{
            InnerOutcome, LineSearcher, NonlinearSolver, ProgramEvaluator, SolveOutcome,
            SolverOptions,
        },
        types::{FnEvalMap, Theta},
        validation::validate_start,
    },
};

/// Required shrink factor of the violation between outer steps before the
/// penalty weight is increased.
const VIOLATION_DECREASE: f64 = 0.25;

/// Largest `|z|` an outer step starts from. Past it the logistic box map is
/// flat enough that L-BFGS stalls on a bound.
pub const Z_START_CAP: f64 = 6.0;

/// Bundled constrained solver: augmented Lagrangian over argmin L-BFGS.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AugLagSolver {
    pub opts: SolverOptions,
}

impl AugLagSolver {
    pub fn new(opts: SolverOptions) -> Self {
        Self { opts }
    }

    /// Minimize one subproblem, retrying once with the other line search.
    ///
    /// # Errors
    /// Returns the error of the first attempt when both attempts fail.
    fn inner_solve<E: ProgramEvaluator>(
        &self, program: &MathProgram<'_, E>, multipliers: &Multipliers, rho: f64, z0: &Theta,
    ) -> OptResult<InnerOutcome> {
        let preferred = self.opts.line_searcher;
        match self.run_with(preferred, program, multipliers, rho, z0.clone()) {
            Ok(out) => Ok(out),
            Err(first) => self
                .run_with(preferred.alternate(), program, multipliers, rho, z0.clone())
                .map_err(|_| first),
        }
    }

    fn run_with<E: ProgramEvaluator>(
        &self, line_searcher: LineSearcher, program: &MathProgram<'_, E>,
        multipliers: &Multipliers, rho: f64, z0: Theta,
    ) -> OptResult<InnerOutcome> {
        let problem = AugLagAdapter::new(program, multipliers, rho);
        match line_searcher {
            LineSearcher::MoreThuente => {
                let solver = build_optimizer_more_thuente(&self.opts)?;
                run_lbfgs(z0, &self.opts, problem, solver)
            }
            LineSearcher::HagerZhang => {
                let solver = build_optimizer_hager_zhang(&self.opts)?;
                run_lbfgs(z0, &self.opts, problem, solver)
            }
        }
    }
}

impl NonlinearSolver for AugLagSolver {
    /// Solve `program` from `x0`.
    ///
    /// # Behavior
    /// - Validates `x0` (length, finiteness) and maps it into unconstrained
    ///   coordinates; points on a bound are pulled just inside.
    /// - Alternates subproblem minimization and multiplier updates until the
    ///   maximum violation drops below `constraint_tol` or `max_outer_iter`
    ///   steps have run. Each step warm-starts from the previous iterate with
    ///   its unconstrained coordinates clamped to `±Z_START_CAP`.
    /// - An inner failure on the first outer step is returned as `Err`; a
    ///   later one ends the loop with the last good iterate.
    ///
    /// # Errors
    /// - Start-point validation errors.
    /// - Any inner-run error from the first outer step.
    /// - [`OptError::SolverFailed`] if the final iterate violates a
    ///   constraint or bound by more than `constraint_tol`.
    /// - Outcome validation errors (non-finite objective or point).
    fn solve<E: ProgramEvaluator>(
        &self, program: &MathProgram<'_, E>, x0: Theta,
    ) -> OptResult<SolveOutcome> {
        validate_start(&x0, program.n_vars())?;
        let opts = &self.opts;
        let mut z = program.from_box(&x0);
        let mut multipliers = Multipliers::zeros(program.n_constraints());
        let mut rho = opts.penalty_init;
        let mut last_violation = f64::INFINITY;
        let mut iterations = 0;
        let mut fn_evals = FnEvalMap::new();
        let mut best: Option<(Theta, f64, f64)> = None;
        let mut inner_terminated = false;
        let mut status = format!("Outer iteration limit ({}) reached", opts.max_outer_iter);

        for outer in 0..opts.max_outer_iter {
            z.mapv_inplace(|v| v.clamp(-Z_START_CAP, Z_START_CAP));
            let inner = match self.inner_solve(program, &multipliers, rho, &z) {
                Ok(inner) => inner,
                Err(err) if outer == 0 => return Err(err),
                Err(err) => {
                    status = format!("Stopped after outer step {outer}: {err}");
                    break;
                }
            };
            iterations += inner.iterations;
            for (name, count) in inner.fn_evals {
                *fn_evals.entry(name).or_insert(0) += count;
            }
            inner_terminated = inner.converged;
            z = inner.theta_hat;

            let x = program.to_box(&z);
            let (objective, g) = program.evaluate(&x);
            let violation = program.violation_of(&x, &g);
            best = Some((x, objective, violation));
            if violation <= opts.constraint_tol {
                status = format!("Feasible after {} outer steps ({})", outer + 1, inner.status);
                break;
            }

            multipliers.update(program, &g, rho);
            if violation > VIOLATION_DECREASE * last_violation {
                rho = (rho * opts.penalty_growth).min(opts.penalty_max);
            }
            last_violation = violation;
        }

        let (x, objective, max_violation) = best.ok_or(OptError::MissingThetaHat)?;
        if max_violation > opts.constraint_tol {
            return Err(OptError::SolverFailed {
                status: format!(
                    "{status}; max violation {max_violation:.3e} exceeds {:.1e}",
                    opts.constraint_tol
                ),
            });
        }
        let converged = inner_terminated;
        SolveOutcome::new(x, objective, converged, status, iterations, fn_evals, max_violation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{
        nlp_solver::{
            program::tests::{Toy, toy_program},
            types::UNBOUNDED,
        },
        scalar::Scalar,
    };
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Convergence of the augmented-Lagrangian loop on a small convex
    //   program with one equality and one inequality constraint.
    // - Handling of a pure box-constrained program (no general constraints).
    // - Start-point validation and infeasible end points.
    //
    // They intentionally DO NOT cover:
    // - The tree objective, exercised in `tree::fit` and integration tests.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify the solver finds the analytic optimum of the toy program.
    //
    // Given
    // -----
    // - min (x0-2)² + (x1-2)²  s.t.  x0 + x1 = 1,  x0 - x1 >= 0,
    //   x in [-5, 5]². The optimum is (0.5, 0.5) with f = 4.5 and the
    //   inequality active.
    // - Start at (-1, 3), infeasible for both constraints.
    //
    // Expect
    // ------
    // - Solution within 1e-3 of (0.5, 0.5) and a violation below 1e-4.
    fn solves_small_constrained_program() {
        // Arrange
        let toy = Toy;
        let program = toy_program(&toy);
        let solver = AugLagSolver::default();

        // Act
        let out = solver.solve(&program, array![-1.0, 3.0]).unwrap();

        // Assert
        assert_relative_eq!(out.x[0], 0.5, epsilon = 1e-3);
        assert_relative_eq!(out.x[1], 0.5, epsilon = 1e-3);
        assert_relative_eq!(out.objective, 4.5, epsilon = 1e-2);
        assert!(out.max_violation <= 1e-4, "status: {}", out.status);
        assert!(out.iterations > 0);
    }

    struct BoxOnly;

    impl ProgramEvaluator for BoxOnly {
        fn n_vars(&self) -> usize {
            1
        }

        fn n_constraints(&self) -> usize {
            0
        }

        fn eval<S: Scalar>(&self, x: &[S], fg: &mut [S]) {
            let d = x[0].clone() - 0.3;
            fg[0] = d.clone() * d;
        }
    }

    #[test]
    // Purpose
    // -------
    // A program without general constraints is solved in a single outer
    // step with an interior optimum.
    fn box_only_program_finishes_in_one_outer_step() {
        let eval = BoxOnly;
        let program =
            MathProgram::new(&eval, array![0.0], array![1.0], Theta::zeros(0), Theta::zeros(0))
                .unwrap();

        let out = AugLagSolver::default().solve(&program, array![0.9]).unwrap();

        assert_relative_eq!(out.x[0], 0.3, epsilon = 1e-4);
        assert_eq!(out.max_violation, 0.0);
        assert!(out.status.starts_with("Feasible after 1 outer steps"));
    }

    #[test]
    // Purpose
    // -------
    // Invalid starting points are rejected before any iteration.
    fn rejects_non_finite_start() {
        let toy = Toy;
        let program = toy_program(&toy);

        let err = AugLagSolver::default().solve(&program, array![f64::NAN, 0.0]).unwrap_err();

        assert!(matches!(err, OptError::InvalidStartingPoint { index: 0, .. }));
    }

    #[test]
    // Purpose
    // -------
    // A start whose first subproblem step would run into a box corner still
    // reaches the optimum: outer steps restart from clamped coordinates.
    //
    // Given
    // -----
    // - The toy program from (4.9, -4.9), (-4.9, 4.9) and (-1, 3).
    //
    // Expect
    // ------
    // - Every solve ends within 1e-3 of (0.5, 0.5) and is feasible.
    fn starts_near_the_box_corners_reach_the_optimum() {
        let toy = Toy;
        let program = toy_program(&toy);
        let solver = AugLagSolver::default();

        for start in [array![4.9, -4.9], array![-4.9, 4.9], array![-1.0, 3.0]] {
            let out = solver.solve(&program, start).unwrap();

            assert_relative_eq!(out.x[0], 0.5, epsilon = 1e-3);
            assert_relative_eq!(out.x[1], 0.5, epsilon = 1e-3);
            assert!(out.max_violation <= 1e-6);
        }
    }

    struct OutOfReach;

    impl ProgramEvaluator for OutOfReach {
        fn n_vars(&self) -> usize {
            1
        }

        fn n_constraints(&self) -> usize {
            1
        }

        fn eval<S: Scalar>(&self, x: &[S], fg: &mut [S]) {
            fg[0] = x[0].clone() * x[0].clone();
            fg[1] = x[0].clone();
        }
    }

    #[test]
    // Purpose
    // -------
    // A constraint that no point of the box satisfies ends in an error, not
    // in an infeasible `Ok`.
    //
    // Given
    // -----
    // - x in [0, 1] with the constraint x >= 2, three outer steps.
    //
    // Expect
    // ------
    // - `SolverFailed` whose status reports the violation.
    fn infeasible_end_point_is_an_error() {
        let eval = OutOfReach;
        let program =
            MathProgram::new(&eval, array![0.0], array![1.0], array![2.0], array![UNBOUNDED])
                .unwrap();
        let solver = AugLagSolver::new(SolverOptions { max_outer_iter: 3, ..Default::default() });

        let err = solver.solve(&program, array![0.5]).unwrap_err();

        match err {
            OptError::SolverFailed { status } => assert!(status.contains("max violation")),
            other => panic!("expected SolverFailed, got {other:?}"),
        }
    }
}
