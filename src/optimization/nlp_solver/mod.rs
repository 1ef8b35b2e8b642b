//! nlp_solver: constrained nonlinear programs over an argmin L-BFGS core.
//!
//! Purpose
//! -------
//! Provide the nonlinear-program layer consumed by the tree fitter: a model
//! implements [`ProgramEvaluator`] once (generic over the crate's
//! [`Scalar`](crate::optimization::scalar::Scalar) domain), wraps it in a
//! validated [`MathProgram`] with variable and constraint bounds, and hands it
//! to any [`NonlinearSolver`]. The bundled backend [`AugLagSolver`] handles
//! the bounds and constraints itself and delegates the unconstrained work to
//! Argmin's L-BFGS.
//!
//! Key behaviors
//! -------------
//! - Box bounds are removed by a logistic reparameterisation, so L-BFGS only
//!   ever sees an unconstrained problem ([`MathProgram::to_box`] /
//!   [`MathProgram::from_box`]).
//! - General constraints `gl <= g(x) <= gu` enter a Powell–Hestenes–Rockafellar
//!   augmented Lagrangian ([`adapter::AugLagAdapter`]); multipliers and the
//!   penalty weight are updated by the outer loop in [`api`].
//! - Gradients are exact: the adapter evaluates the program once with
//!   [`Dual`](crate::optimization::scalar::Dual) numbers.
//! - Inner runs use the configured line search and fall back to the other
//!   one once if Argmin reports an error.
//!
//! Invariants & assumptions
//! ------------------------
//! - Programs are minimized. Variable bounds are finite; an infinite upper
//!   constraint bound means "unbounded above".
//! - [`ProgramEvaluator::eval`] is a pure function of `x` and is `Sync`, so
//!   independent solves can run on different threads against one evaluator.
//! - Configuration types ([`Tolerances`], [`SolverOptions`]) are validated on
//!   construction.
//!
//! Conventions
//! -----------
//! - A solver returns `Err` for a runtime failure of that one solve and, in
//!   the case of [`AugLagSolver`], for an end point whose violation exceeds
//!   `constraint_tol`. Callers still re-check [`SolveOutcome::max_violation`]
//!   since other backends may report infeasible points as `Ok`.
//! - This module never logs through `tracing`; the optional `obs_slog`
//!   feature attaches Argmin's slog observer to inner runs when `verbose`
//!   is set.
//!
//! Downstream usage
//! ----------------
//! - `tree::objective` implements [`ProgramEvaluator`] for the ORCT program.
//! - `tree::fit` is generic over [`NonlinearSolver`], so tests can inject a
//!   failing mock in place of [`AugLagSolver`].
//!
//! Testing notes
//! -------------
//! - Unit tests cover validation rules, builder wiring, gradient agreement
//!   with finite differences in the adapter, multiplier updates, and
//!   convergence on small convex programs.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod program;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::AugLagSolver;
pub use self::program::MathProgram;
pub use self::traits::{
    InnerOutcome, LineSearcher, NonlinearSolver, ProgramEvaluator, SolveOutcome, SolverOptions,
    Tolerances,
};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta, UNBOUNDED};

pub mod prelude {
    pub use super::api::AugLagSolver;
    pub use super::program::MathProgram;
    pub use super::traits::{
        LineSearcher, NonlinearSolver, ProgramEvaluator, SolveOutcome, SolverOptions, Tolerances,
    };
    pub use super::types::{Theta, UNBOUNDED};
}
