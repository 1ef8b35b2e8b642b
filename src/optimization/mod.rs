//! optimization: differentiable scalars, constrained solver, error surface.
//!
//! Purpose
//! -------
//! Provide a cohesive optimization layer for fitting randomized trees:
//! a numeric domain in which objective and constraint formulas are written
//! once and evaluated either in plain `f64` or with exact first derivatives,
//! numerically stable transforms, an Argmin-backed constrained solver, and a
//! single error/result surface.
//!
//! Key behaviors
//! -------------
//! - [`scalar`]: the [`Scalar`](scalar::Scalar) trait and the forward-mode
//!   [`Dual`](scalar::Dual) number.
//! - [`numerical_stability`]: overflow-safe logistic/logit and the box
//!   reparameterisation used by the solver.
//! - [`nlp_solver`]: nonlinear programs with variable and constraint bounds,
//!   solved by an augmented Lagrangian over L-BFGS.
//! - [`errors`]: [`OptError`](errors::OptError) / [`OptResult`](errors::OptResult),
//!   including conversions from Argmin errors.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are validated at the boundary; invalid states are reported as
//!   `OptError`, not panics.
//! - Programs are minimized.
//!
//! Conventions
//! -----------
//! - Vectors use `ndarray` aliases ([`Theta`](nlp_solver::Theta),
//!   [`Grad`](nlp_solver::Grad)); evaluator callbacks use plain slices so the
//!   same code serves `f64` and `Dual`.
//! - This module avoids I/O and `tracing`; the tree orchestrator reports
//!   progress.
//!
//! Downstream usage
//! ----------------
//! - `tree` implements `ProgramEvaluator` for the ORCT objective and drives
//!   any `NonlinearSolver` from its parallel restart loop.
//! - Front-ends import the curated surface via `optimization::prelude::*`.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each submodule; `finitediff` cross-checks the
//!   dual-number gradients.

pub mod errors;
pub mod nlp_solver;
pub mod numerical_stability;
pub mod scalar;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::nlp_solver::prelude::*;
    pub use super::numerical_stability::prelude::*;
    pub use super::scalar::{Dual, Scalar};
}
