//! numerical_stability: numerically robust transforms for routing and bounds.
//!
//! Purpose
//! -------
//! Collect the numerically stable scalar transforms shared by the soft tree
//! routing model and the box-bounded solver backend. Centralizing them keeps
//! the sigmoid evaluation in one place, so a large routing temperature never
//! produces overflow or NaN derivatives anywhere in the crate.
//!
//! Key behaviors
//! -------------
//! - Provide a stable logistic (`safe_logistic`) and its inverse
//!   (`safe_logit`), generic over the crate's [`Scalar`] domain where needed.
//! - Map between a finite box `[lo, hi]` and the real line (`to_bounded`,
//!   `to_unbounded`) so box-constrained variables can be optimized by an
//!   unconstrained quasi-Newton method.
//! - Centralize small numeric tolerances (`LOGIT_EPS`, `GENERAL_TOL`).
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are finite; shape and domain validation happens in the solver
//!   and tree layers.
//! - `to_bounded` with `lo == hi` is the constant `lo` and carries no
//!   derivative.
//!
//! Conventions
//! -----------
//! - This module never logs, performs I/O, or touches global state.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`transformations`] cover agreement with naïve formulas
//!   on safe grids, tail saturation, finiteness of dual derivatives in the
//!   tails, and the bounded/unbounded round trip.
//!
//! [`Scalar`]: crate::optimization::scalar::Scalar

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{
    GENERAL_TOL, LOGIT_EPS, safe_logistic, safe_logit, to_bounded, to_unbounded,
};

pub mod prelude {
    pub use super::transformations::{
        GENERAL_TOL, LOGIT_EPS, safe_logistic, safe_logit, to_bounded, to_unbounded,
    };
}
