//! Public API surface for constrained nonlinear programs.
//!
//! - [`ProgramEvaluator`]: trait a model implements to expose its objective
//!   and constraint functions, generic over the [`Scalar`] domain.
//! - [`NonlinearSolver`]: trait implemented by solver backends (the bundled
//!   augmented-Lagrangian solver, or a test double).
//! - [`SolverOptions`] and [`Tolerances`]: configuration for the bundled backend.
//! - [`LineSearcher`]: choice of line search used by the inner L-BFGS runs.
//! - [`InnerOutcome`]: normalized result of one inner unconstrained run.
//! - [`SolveOutcome`]: normalized result of a full constrained solve.
//!
//! Convention: programs are always *minimized*. Constraints are written as
//! `gl <= g(x) <= gu`, with `gu = +∞` meaning "no upper bound".
use crate::optimization::{
    errors::{OptError, OptResult},
    nlp_solver::{
        program::MathProgram,
        types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta},
        validation::{
            validate_theta_hat, validate_value, verify_constraint_tol, verify_tol_cost,
            verify_tol_grad,
        },
    },
    scalar::Scalar,
};
use argmin::core::TerminationStatus;
use argmin_math::ArgminL2Norm;
use std::str::FromStr;

/// Objective and constraint evaluator of a nonlinear program.
///
/// `eval` writes the objective into `fg[0]` and the constraint values into
/// `fg[1..=n_constraints]`. The same implementation serves plain `f64`
/// evaluation and [`Dual`](crate::optimization::scalar::Dual) evaluation for
/// exact gradients, so the formulas are written exactly once.
///
/// Implementations must be pure functions of `x`: the solver may evaluate
/// from several threads at once (one program per restart) and calls `eval`
/// many times per iteration.
pub trait ProgramEvaluator: Sync {
    /// Number of decision variables.
    fn n_vars(&self) -> usize;

    /// Number of general constraints (excluding variable bounds).
    fn n_constraints(&self) -> usize;

    /// Evaluate objective and constraints at `x`.
    ///
    /// `x.len() == n_vars()` and `fg.len() == 1 + n_constraints()` are
    /// guaranteed by the caller.
    fn eval<S: Scalar>(&self, x: &[S], fg: &mut [S]);
}

/// A solver backend for box- and constraint-bounded programs.
///
/// A returned `Err` is a runtime failure of this single solve; callers that
/// run many solves decide whether it is fatal.
pub trait NonlinearSolver: Sync {
    fn solve<E: ProgramEvaluator>(
        &self, program: &MathProgram<'_, E>, x0: Theta,
    ) -> OptResult<SolveOutcome>;
}

/// Choice of line search used inside the L-BFGS solver.
///
/// Variants:
/// - `MoreThuente`: More–Thuente line search.
/// - `HagerZhang`: Hager–Zhang line search.
///
/// Parsing:
/// This enum implements `FromStr` and accepts case-insensitive names
/// (`"MoreThuente"`, `"HagerZhang"`). Unknown names return
/// `OptError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl LineSearcher {
    /// The other line search, used as a fallback when an inner run errors.
    pub fn alternate(self) -> Self {
        match self {
            LineSearcher::MoreThuente => LineSearcher::HagerZhang,
            LineSearcher::HagerZhang => LineSearcher::MoreThuente,
        }
    }
}

impl FromStr for LineSearcher {
    type Err = OptError;

    /// Parse a line-search choice from a string (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Numerical tolerances and iteration limits of the inner L-BFGS runs.
///
/// - `tol_grad`: terminate when the gradient norm falls below this threshold.
/// - `tol_cost`: terminate when the change in cost falls below this threshold.
/// - `max_iter`: hard cap on the number of iterations.
///
/// Any field can be `None` but **at least one** of the three must be provided
/// (see [`Tolerances::new`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Rules
    /// - At least one of `tol_grad`, `tol_cost`, or `max_iter` must be `Some`.
    /// - If provided, tolerances must be **finite and strictly positive**.
    /// - If provided, `max_iter` must be `> 0`.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self { tol_grad: Some(1e-7), tol_cost: None, max_iter: Some(500) }
    }
}

/// Configuration of the bundled augmented-Lagrangian backend.
///
/// Fields:
/// - `tols`: tolerances of every inner L-BFGS run.
/// - `line_searcher`: preferred line search; the other one is tried once if
///   an inner run errors.
/// - `lbfgs_mem`: optional L-BFGS history size (defaults to
///   [`DEFAULT_LBFGS_MEM`]).
/// - `max_outer_iter`: cap on multiplier updates.
/// - `constraint_tol`: maximum constraint/bound violation accepted as feasible.
/// - `penalty_init`, `penalty_growth`, `penalty_max`: schedule of the
///   quadratic penalty weight `ρ`.
/// - `verbose`: if `true`, attaches an observer (behind the `obs_slog`
///   feature) to every inner run.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub lbfgs_mem: Option<usize>,
    pub max_outer_iter: usize,
    pub constraint_tol: f64,
    pub penalty_init: f64,
    pub penalty_growth: f64,
    pub penalty_max: f64,
    pub verbose: bool,
}

impl SolverOptions {
    /// Create a validated set of solver options.
    ///
    /// # Errors
    /// - [`OptError::InvalidLBFGSMem`] if `lbfgs_mem == Some(0)`.
    /// - [`OptError::InvalidMaxIter`] if `max_outer_iter == 0`.
    /// - [`OptError::InvalidConstraintTol`] for a non-positive tolerance.
    /// - [`OptError::InvalidPenalty`] unless `0 < penalty_init <= penalty_max`
    ///   (both finite) and `penalty_growth > 1`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, lbfgs_mem: Option<usize>,
        max_outer_iter: usize, constraint_tol: f64, penalty_init: f64, penalty_growth: f64,
        penalty_max: f64, verbose: bool,
    ) -> OptResult<Self> {
        if let Some(m) = lbfgs_mem {
            if m == 0 {
                return Err(OptError::InvalidLBFGSMem {
                    mem: m,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        if max_outer_iter == 0 {
            return Err(OptError::InvalidMaxIter {
                max_iter: max_outer_iter,
                reason: "Outer iterations must be greater than zero.",
            });
        }
        verify_constraint_tol(constraint_tol)?;
        if !penalty_init.is_finite() || penalty_init <= 0.0 {
            return Err(OptError::InvalidPenalty {
                value: penalty_init,
                reason: "Initial penalty must be positive and finite.",
            });
        }
        if !penalty_max.is_finite() || penalty_max < penalty_init {
            return Err(OptError::InvalidPenalty {
                value: penalty_max,
                reason: "Maximum penalty must be finite and at least the initial penalty.",
            });
        }
        if !penalty_growth.is_finite() || penalty_growth <= 1.0 {
            return Err(OptError::InvalidPenalty {
                value: penalty_growth,
                reason: "Penalty growth factor must be finite and greater than one.",
            });
        }
        Ok(Self {
            tols,
            line_searcher,
            lbfgs_mem,
            max_outer_iter,
            constraint_tol,
            penalty_init,
            penalty_growth,
            penalty_max,
            verbose,
        })
    }

    /// History size actually used by L-BFGS.
    pub fn memory(&self) -> usize {
        self.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM)
    }
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances::default(),
            line_searcher: LineSearcher::MoreThuente,
            lbfgs_mem: None,
            max_outer_iter: 20,
            constraint_tol: 1e-6,
            penalty_init: 1.0,
            penalty_growth: 10.0,
            penalty_max: 1e8,
            verbose: false,
        }
    }
}

/// Result of one inner unconstrained L-BFGS run.
///
/// - `theta_hat`: best unconstrained point found.
/// - `value`: best augmented-Lagrangian cost.
/// - `converged`: `true` if the solver reported a terminating status other
///   than `NotTerminated`.
/// - `status`: human-readable termination status string.
/// - `iterations`: number of optimizer iterations performed.
/// - `fn_evals`: function-evaluation counters reported by `argmin`.
/// - `grad_norm`: norm of the last available gradient, if present.
#[derive(Debug, Clone, PartialEq)]
pub struct InnerOutcome {
    pub theta_hat: Theta,
    pub value: Cost,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl InnerOutcome {
    /// Build a validated [`InnerOutcome`] from raw solver state.
    ///
    /// # Errors
    /// - Propagates validation errors for `theta_hat` (missing or non-finite)
    ///   and `value` (non-finite).
    pub fn new(
        theta_hat_opt: Option<Theta>, value: Cost, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let (converged, status) = match termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            other => (true, format!("{other:?}")),
        };
        let iterations = iterations as usize;
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self { theta_hat, value, converged, status, iterations, fn_evals, grad_norm })
    }
}

/// Canonical result of a constrained solve.
///
/// - `x`: final point in the original (bounded) variable space.
/// - `objective`: objective value `f(x)` (without penalty terms).
/// - `converged`: `true` when the final point is feasible within the
///   configured tolerance and the last inner run terminated.
/// - `status`: human-readable summary.
/// - `iterations`: total inner iterations over all outer steps.
/// - `fn_evals`: accumulated function-evaluation counters.
/// - `max_violation`: largest constraint or bound violation at `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub x: Theta,
    pub objective: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub max_violation: f64,
}

impl SolveOutcome {
    /// Build a validated [`SolveOutcome`].
    ///
    /// # Errors
    /// - [`OptError::InvalidThetaHat`] if `x` has a non-finite entry.
    /// - [`OptError::NonFiniteCost`] if `objective` is non-finite.
    pub fn new(
        x: Theta, objective: f64, converged: bool, status: String, iterations: usize,
        fn_evals: FnEvalMap, max_violation: f64,
    ) -> OptResult<Self> {
        let x = validate_theta_hat(Some(x))?;
        validate_value(objective)?;
        Ok(Self { x, objective, converged, status, iterations, fn_evals, max_violation })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Validation rules of `Tolerances` and `SolverOptions`.
    // - `LineSearcher` parsing and alternation.
    // - `InnerOutcome` status mapping.
    //
    // They intentionally DO NOT cover:
    // - Actual solves, tested in `api`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // `Tolerances::new` requires at least one criterion and a positive cap.
    fn tolerances_require_a_criterion() {
        assert_eq!(Tolerances::new(None, None, None), Err(OptError::NoTolerancesProvided));
        assert!(matches!(
            Tolerances::new(None, None, Some(0)),
            Err(OptError::InvalidMaxIter { max_iter: 0, .. })
        ));
        assert!(Tolerances::new(None, None, Some(10)).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Ensure `SolverOptions::new` rejects each inconsistent penalty setting
    // and accepts the defaults.
    //
    // Given
    // -----
    // - Default tolerances and line search.
    //
    // Expect
    // ------
    // - Zero memory, zero outer iterations, non-positive initial penalty,
    //   max below init, growth <= 1 are all rejected.
    fn solver_options_validate_penalty_schedule() {
        let d = SolverOptions::default();
        let build = |mem, outer, tol, init, growth, max| {
            SolverOptions::new(d.tols, d.line_searcher, mem, outer, tol, init, growth, max, false)
        };

        assert!(build(None, 20, 1e-6, 10.0, 10.0, 1e8).is_ok());
        assert!(matches!(
            build(Some(0), 20, 1e-6, 10.0, 10.0, 1e8),
            Err(OptError::InvalidLBFGSMem { .. })
        ));
        assert!(matches!(
            build(None, 0, 1e-6, 10.0, 10.0, 1e8),
            Err(OptError::InvalidMaxIter { .. })
        ));
        assert!(matches!(
            build(None, 20, 0.0, 10.0, 10.0, 1e8),
            Err(OptError::InvalidConstraintTol { .. })
        ));
        assert!(matches!(
            build(None, 20, 1e-6, 0.0, 10.0, 1e8),
            Err(OptError::InvalidPenalty { .. })
        ));
        assert!(matches!(
            build(None, 20, 1e-6, 10.0, 10.0, 1.0),
            Err(OptError::InvalidPenalty { .. })
        ));
        assert!(matches!(
            build(None, 20, 1e-6, 10.0, 1.0, 1e8),
            Err(OptError::InvalidPenalty { .. })
        ));
        assert_eq!(d.memory(), DEFAULT_LBFGS_MEM);
    }

    #[test]
    // Purpose
    // -------
    // Line-search names parse case-insensitively and alternate symmetrically.
    fn line_searcher_parses_and_alternates() {
        assert_eq!("hagerZHANG".parse::<LineSearcher>(), Ok(LineSearcher::HagerZhang));
        assert!("newton".parse::<LineSearcher>().is_err());
        assert_eq!(LineSearcher::MoreThuente.alternate(), LineSearcher::HagerZhang);
        assert_eq!(LineSearcher::HagerZhang.alternate().alternate(), LineSearcher::HagerZhang);
    }

    #[test]
    // Purpose
    // -------
    // `InnerOutcome::new` maps `NotTerminated` to "not converged" and keeps
    // the gradient norm.
    fn inner_outcome_maps_status_and_grad_norm() {
        let out = InnerOutcome::new(
            Some(array![1.0, 2.0]),
            0.5,
            TerminationStatus::NotTerminated,
            3,
            FnEvalMap::new(),
            Some(array![3.0, 4.0]),
        )
        .unwrap();

        assert!(!out.converged);
        assert_eq!(out.status, "Not terminated");
        assert_eq!(out.iterations, 3);
        assert_eq!(out.grad_norm, Some(5.0));

        let err = InnerOutcome::new(
            None,
            0.5,
            TerminationStatus::NotTerminated,
            0,
            FnEvalMap::new(),
            None,
        );
        assert_eq!(err, Err(OptError::MissingThetaHat));
    }
}
