//! tree: optimal randomized classification trees.
//!
//! Purpose
//! -------
//! Fit a complete binary tree of fixed depth whose splits and leaf labels are
//! soft: every interior node routes a sample left with a sigmoid probability
//! and every leaf holds a distribution over classes. All of it is trained
//! jointly as one constrained nonlinear program, from many random starts in
//! parallel, and the best start is kept.
//!
//! Key behaviors
//! -------------
//! - [`topology`]: node counts and the left/right ancestor sets of every
//!   node ([`TreeTopology`]).
//! - [`layout`]: the offset of each node's parameters in the flat vector
//!   ([`VariableLayout`]).
//! - [`routing`]: left-branch and leaf-reach probabilities
//!   ([`RoutingModel`]), generic over the numeric domain.
//! - [`objective`]: expected cost, within-leaf dissimilarity penalty,
//!   constraints and bounds ([`OrctProgram`]).
//! - [`fit`]: the configure/fit lifecycle, parallel restarts and best-restart
//!   selection ([`OrctModel`], [`FitResult`]).
//! - [`predict`]: class probabilities and arg-max labels ([`Prediction`]).
//! - [`options`], [`data`], [`init`], [`errors`]: hyperparameters, validated
//!   training data, restart seeds and initial points, and [`OrctError`].
//!
//! Invariants & assumptions
//! ------------------------
//! - `2^depth >= n_labels`; otherwise the normalization and coverage
//!   constraints cannot hold together and configuration is rejected.
//! - Nodes are numbered in level order; node `j` has children `2j + 1`
//!   (left) and `2j + 2` (right); interior nodes come before leaves.
//! - Labels are `0..n_labels`.
//!
//! Conventions
//! -----------
//! - Interior parameters live in `[-1, 1]`, leaf class probabilities in
//!   `[0, 1]`; the objective is minimized.
//! - Logging goes through `tracing` from [`fit`] only.
//!
//! Downstream usage
//! ----------------
//! - Build a [`TreeSpec`], wrap it in an [`OrctModel`], call
//!   `fit_data` (or `configure` + `fit`) with [`FitOptions`] and a
//!   solver such as [`AugLagSolver`](crate::optimization::nlp_solver::AugLagSolver),
//!   then `predict`.
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests; the end-to-end scenarios live in
//!   `tests/integration_orct_pipeline.rs`.

pub mod data;
pub mod errors;
pub mod fit;
pub mod init;
pub mod layout;
pub mod objective;
pub mod options;
pub mod predict;
pub mod routing;
pub mod topology;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::data::OrctData;
pub use self::errors::{OrctError, OrctResult};
pub use self::fit::{FitResult, FitState, OrctModel, RestartDiagnostics, RestartFailure};
pub use self::layout::VariableLayout;
pub use self::objective::{ObjectiveTerms, OrctProgram};
pub use self::options::{
    DEFAULT_GAMMA, DEFAULT_MISCLASSIFICATION_COST, DEFAULT_SEED, FitOptions, MisclassificationCost,
    TreeSpec,
};
pub use self::predict::Prediction;
pub use self::routing::RoutingModel;
pub use self::topology::{AncestorRecord, TreeTopology};

pub mod prelude {
    pub use super::errors::{OrctError, OrctResult};
    pub use super::fit::{FitResult, FitState, OrctModel};
    pub use super::options::{FitOptions, MisclassificationCost, TreeSpec};
    pub use super::predict::Prediction;
}
