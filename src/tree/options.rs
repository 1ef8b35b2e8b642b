//! tree::options: hyperparameters and fit configuration.
//!
//! Purpose
//! -------
//! Collect the validated configuration of a randomized classification tree:
//! the structural and regularization hyperparameters ([`TreeSpec`]), the
//! misclassification costs ([`MisclassificationCost`]), and the run-time
//! settings of a fit ([`FitOptions`]).
//!
//! Key behaviors
//! -------------
//! - [`TreeSpec::new`] rejects every precondition violation up front,
//!   including trees with fewer leaves than classes.
//! - [`MisclassificationCost::Uniform`] charges `c` for any wrong class and
//!   nothing for the right one; [`MisclassificationCost::Matrix`] gives full
//!   control.
//! - [`FitOptions`] bundles the restart count, thread count, feature
//!   scaling flag, and the solver options.
//!
//! Invariants & assumptions
//! ------------------------
//! - A constructed `TreeSpec` satisfies `n_feats >= 1`, `n_labels >= 2`,
//!   `2^depth >= n_labels`, `alpha >= 0`, `gamma > 0`, all finite.
//! - A constructed `FitOptions` has `n_restarts >= 1`.
//!
//! Conventions
//! -----------
//! - Defaults: `gamma = 512`, `seed = 22200337`, uniform cost `0.5`.
use crate::{
    optimization::nlp_solver::SolverOptions,
    tree::{
        errors::{OrctError, OrctResult},
        topology::MAX_DEPTH,
    },
};
use ndarray::Array2;

/// Default routing temperature.
pub const DEFAULT_GAMMA: f64 = 512.0;

/// Default base seed of the restart seed sequence.
pub const DEFAULT_SEED: u64 = 22_200_337;

/// Default cost of a wrong class under [`MisclassificationCost::Uniform`].
pub const DEFAULT_MISCLASSIFICATION_COST: f64 = 0.5;

/// Cost of predicting class `k` for a sample whose true class is `y`.
#[derive(Debug, Clone, PartialEq)]
pub enum MisclassificationCost {
    /// `0` if `y == k`, otherwise the given constant.
    Uniform(f64),
    /// Row = true class, column = predicted class.
    Matrix(Array2<f64>),
}

impl Default for MisclassificationCost {
    fn default() -> Self {
        MisclassificationCost::Uniform(DEFAULT_MISCLASSIFICATION_COST)
    }
}

impl MisclassificationCost {
    #[inline]
    pub fn cost(&self, truth: usize, predicted: usize) -> f64 {
        match self {
            MisclassificationCost::Uniform(c) => {
                if truth == predicted {
                    0.0
                } else {
                    *c
                }
            }
            MisclassificationCost::Matrix(m) => m[[truth, predicted]],
        }
    }

    fn validate(&self, n_labels: usize) -> OrctResult<()> {
        match self {
            MisclassificationCost::Uniform(c) => {
                if !c.is_finite() || *c < 0.0 {
                    return Err(OrctError::InvalidCost { reason: "Cost must be finite and >= 0." });
                }
            }
            MisclassificationCost::Matrix(m) => {
                if m.dim() != (n_labels, n_labels) {
                    return Err(OrctError::InvalidCost {
                        reason: "Cost matrix must be n_labels x n_labels.",
                    });
                }
                if m.iter().any(|c| !c.is_finite() || *c < 0.0) {
                    return Err(OrctError::InvalidCost {
                        reason: "Cost matrix entries must be finite and >= 0.",
                    });
                }
            }
        }
        Ok(())
    }
}

/// Hyperparameters of a randomized classification tree.
///
/// Fields
/// ------
/// - `depth`: depth of the complete tree (0 = root-only).
/// - `n_feats`: number of features per sample.
/// - `n_labels`: number of classes; labels are `0..n_labels`.
/// - `alpha`: weight of the dissimilarity penalty in the objective.
/// - `gamma`: routing temperature; larger values approach hard splits.
/// - `seed`: base seed from which every restart's seed is derived.
/// - `cost`: misclassification costs.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeSpec {
    pub depth: usize,
    pub n_feats: usize,
    pub n_labels: usize,
    pub alpha: f64,
    pub gamma: f64,
    pub seed: u64,
    pub cost: MisclassificationCost,
}

impl TreeSpec {
    /// Construct validated hyperparameters.
    ///
    /// # Errors
    /// - [`OrctError::DepthTooLarge`], [`OrctError::NoFeatures`],
    ///   [`OrctError::TooFewLabels`], [`OrctError::TooFewLeaves`],
    ///   [`OrctError::InvalidAlpha`], [`OrctError::InvalidGamma`],
    ///   [`OrctError::InvalidCost`].
    pub fn new(
        depth: usize, n_feats: usize, n_labels: usize, alpha: f64, gamma: f64, seed: u64,
        cost: MisclassificationCost,
    ) -> OrctResult<Self> {
        if depth > MAX_DEPTH {
            return Err(OrctError::DepthTooLarge { depth, max: MAX_DEPTH });
        }
        if n_feats == 0 {
            return Err(OrctError::NoFeatures);
        }
        if n_labels < 2 {
            return Err(OrctError::TooFewLabels { n_labels });
        }
        let n_leaf_nodes = 1usize << depth;
        if n_leaf_nodes < n_labels {
            return Err(OrctError::TooFewLeaves { n_leaf_nodes, n_labels });
        }
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(OrctError::InvalidAlpha { value: alpha });
        }
        if !gamma.is_finite() || gamma <= 0.0 {
            return Err(OrctError::InvalidGamma { value: gamma });
        }
        cost.validate(n_labels)?;
        Ok(Self { depth, n_feats, n_labels, alpha, gamma, seed, cost })
    }

    /// Hyperparameters with default `gamma`, `seed` and uniform cost.
    pub fn with_defaults(
        depth: usize, n_feats: usize, n_labels: usize, alpha: f64,
    ) -> OrctResult<Self> {
        Self::new(
            depth,
            n_feats,
            n_labels,
            alpha,
            DEFAULT_GAMMA,
            DEFAULT_SEED,
            MisclassificationCost::default(),
        )
    }
}

/// Run-time settings of one fit.
///
/// - `n_restarts`: number of independent randomized solves.
/// - `n_threads`: `0` runs on rayon's global pool, otherwise a dedicated
///   pool of that size is built for the fit.
/// - `scale_features`: min-max scale features to `[0, 1]` before fitting
///   (the scaler is stored and reapplied at prediction).
/// - `solver`: options of the bundled solver backend.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    pub n_restarts: usize,
    pub n_threads: usize,
    pub scale_features: bool,
    pub solver: SolverOptions,
}

impl FitOptions {
    /// # Errors
    /// - [`OrctError::NoRestarts`] if `n_restarts == 0`.
    pub fn new(
        n_restarts: usize, n_threads: usize, scale_features: bool, solver: SolverOptions,
    ) -> OrctResult<Self> {
        if n_restarts == 0 {
            return Err(OrctError::NoRestarts);
        }
        Ok(Self { n_restarts, n_threads, scale_features, solver })
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            n_restarts: 10,
            n_threads: 0,
            scale_features: true,
            solver: SolverOptions::default(),
        }
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
    // - Every rejection path of `TreeSpec::new`.
    // - Cost lookup for both cost variants.
    // - `FitOptions` restart-count validation.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // A root-only tree cannot host two classes.
    //
    // Given
    // -----
    // - depth 0 (one leaf), n_labels 2.
    //
    // Expect
    // ------
    // - `TooFewLeaves { n_leaf_nodes: 1, n_labels: 2 }`.
    fn rejects_fewer_leaves_than_labels() {
        let err = TreeSpec::with_defaults(0, 1, 2, 0.0).unwrap_err();
        assert_eq!(err, OrctError::TooFewLeaves { n_leaf_nodes: 1, n_labels: 2 });
        assert!(TreeSpec::with_defaults(2, 1, 4, 0.0).is_ok());
        assert!(matches!(
            TreeSpec::with_defaults(1, 1, 3, 0.0),
            Err(OrctError::TooFewLeaves { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Scalar hyperparameters are range-checked.
    fn rejects_invalid_scalars() {
        let uniform = MisclassificationCost::default;
        assert_eq!(TreeSpec::with_defaults(1, 0, 2, 0.0), Err(OrctError::NoFeatures));
        assert_eq!(
            TreeSpec::with_defaults(1, 1, 1, 0.0),
            Err(OrctError::TooFewLabels { n_labels: 1 })
        );
        assert_eq!(
            TreeSpec::with_defaults(1, 1, 2, -0.1),
            Err(OrctError::InvalidAlpha { value: -0.1 })
        );
        assert_eq!(
            TreeSpec::new(1, 1, 2, 0.0, 0.0, 1, uniform()),
            Err(OrctError::InvalidGamma { value: 0.0 })
        );
        assert!(matches!(
            TreeSpec::new(1, 1, 2, 0.0, 1.0, 1, MisclassificationCost::Uniform(-1.0)),
            Err(OrctError::InvalidCost { .. })
        ));
        assert!(matches!(
            TreeSpec::new(1, 1, 2, 0.0, 1.0, 1, MisclassificationCost::Matrix(array![[0.0]])),
            Err(OrctError::InvalidCost { .. })
        ));
        assert!(matches!(
            TreeSpec::with_defaults(MAX_DEPTH + 1, 1, 2, 0.0),
            Err(OrctError::DepthTooLarge { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Cost lookup: uniform cost is zero on the diagonal; matrices are indexed
    // (truth, predicted).
    fn cost_lookup() {
        let uniform = MisclassificationCost::default();
        assert_eq!(uniform.cost(1, 1), 0.0);
        assert_eq!(uniform.cost(0, 1), 0.5);

        let matrix = MisclassificationCost::Matrix(array![[0.0, 2.0], [1.0, 0.0]]);
        assert_eq!(matrix.cost(0, 1), 2.0);
        assert_eq!(matrix.cost(1, 0), 1.0);
    }

    #[test]
    // Purpose
    // -------
    // A fit needs at least one restart.
    fn fit_options_require_a_restart() {
        assert_eq!(
            FitOptions::new(0, 0, true, SolverOptions::default()),
            Err(OrctError::NoRestarts)
        );
        assert!(FitOptions::new(3, 2, false, SolverOptions::default()).is_ok());
    }
}
