//! tree::predict: class probabilities and labels from fitted parameters.
//!
//! Purpose
//! -------
//! Evaluate a fitted tree on new feature rows. For sample `i` and class `k`
//! the predicted probability is `Σ_τ P_iτ · θ[τ,k]`; the predicted label is
//! the arg-max, with ties going to the lowest class index.
//!
//! Key behaviors
//! -------------
//! - [`check_params`] rejects parameter vectors of the wrong length,
//!   with non-finite entries, or whose leaf blocks are not probability
//!   vectors (entries in `[0, 1]` and sums of one, both within
//!   [`LEAF_SUM_TOL`]), before any sample is routed.
//! - Row sums are debug-asserted, never renormalized.
//!
//! Invariants & assumptions
//! ------------------------
//! - Feature rows are already scaled the way the training features were;
//!   [`OrctModel::predict`](crate::tree::fit::OrctModel::predict) takes
//!   care of that.
use crate::tree::{
    errors::{OrctError, OrctResult},
    routing::RoutingModel,
};
use ndarray::{Array1, Array2, ArrayView2};

/// Allowed deviation of a leaf block sum from one.
pub const LEAF_SUM_TOL: f64 = 1e-4;

/// Allowed deviation of a predicted probability row sum from one.
pub const ROW_SUM_TOL: f64 = 1e-6;

/// Output of [`predict`].
///
/// - `probabilities`: samples x classes.
/// - `labels`: arg-max class of each row.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub probabilities: Array2<f64>,
    pub labels: Array1<usize>,
}

/// Validate a parameter vector against the routing model's layout.
///
/// # Errors
/// - [`OrctError::ParamLengthMismatch`], [`OrctError::NonFiniteParam`],
///   [`OrctError::ClassProbOutOfRange`], [`OrctError::LeafNotNormalized`].
pub fn check_params(routing: &RoutingModel, params: &[f64]) -> OrctResult<()> {
    let layout = &routing.layout;
    if params.len() != layout.n_vars() {
        return Err(OrctError::ParamLengthMismatch {
            expected: layout.n_vars(),
            actual: params.len(),
        });
    }
    if let Some((index, &value)) = params.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(OrctError::NonFiniteParam { index, value });
    }
    let in_range = |v: f64| (-LEAF_SUM_TOL..=1.0 + LEAF_SUM_TOL).contains(&v);
    for leaf in routing.topology.leaves() {
        let start = layout.offset(leaf);
        let block = &params[start..start + layout.n_labels];
        if let Some((class, &value)) = block.iter().enumerate().find(|(_, &v)| !in_range(v)) {
            return Err(OrctError::ClassProbOutOfRange { leaf, class, value });
        }
        let sum: f64 = block.iter().sum();
        if (sum - 1.0).abs() > LEAF_SUM_TOL {
            return Err(OrctError::LeafNotNormalized { leaf, sum });
        }
    }
    Ok(())
}

/// Predict class probabilities and labels for every row of `features`.
///
/// # Errors
/// - [`OrctError::FeatureWidthMismatch`] if `features` has the wrong width.
/// - Any error of [`check_params`].
pub fn predict(
    routing: &RoutingModel, params: &[f64], features: ArrayView2<'_, f64>,
) -> OrctResult<Prediction> {
    let layout = &routing.layout;
    if features.ncols() != layout.n_feats {
        return Err(OrctError::FeatureWidthMismatch {
            expected: layout.n_feats,
            actual: features.ncols(),
        });
    }
    check_params(routing, params)?;

    let n_labels = layout.n_labels;
    let mut probabilities = Array2::<f64>::zeros((features.nrows(), n_labels));
    for (row, mut out) in features.outer_iter().zip(probabilities.outer_iter_mut()) {
        let leaf_probs = routing.leaf_probabilities(row, params);
        for (t, leaf) in routing.topology.leaves().enumerate() {
            for k in 0..n_labels {
                out[k] += leaf_probs[t] * params[layout.class_index(leaf, k)];
            }
        }
        debug_assert!(
            (out.sum() - 1.0).abs() <= ROW_SUM_TOL.max(LEAF_SUM_TOL),
            "class probabilities sum to {}",
            out.sum()
        );
    }
    let labels = probabilities.outer_iter().map(|row| argmax(row.iter().copied())).collect();
    Ok(Prediction { probabilities, labels })
}

/// Index of the largest value; the first one wins ties.
fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best = (0, f64::NEG_INFINITY);
    for (k, v) in values.enumerate() {
        if v > best.1 {
            best = (k, v);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::topology::TreeTopology;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Probabilities of a hand-built depth-1 tree and their row sums.
    // - Tie-breaking towards the lowest class.
    // - Rejection of malformed parameter vectors and feature widths.
    // -------------------------------------------------------------------------

    fn stump() -> RoutingModel {
        RoutingModel::new(TreeTopology::new(1).unwrap(), 1, 2, 512.0)
    }

    #[test]
    // Purpose
    // -------
    // A sharp stump routes by threshold and reports the leaf distributions.
    //
    // Given
    // -----
    // - Depth 1, one feature, weight 1, threshold 0.5.
    // - Left leaf (reached when x > 0.5) favours class 1, right leaf class 0.
    //
    // Expect
    // ------
    // - x = 0.9 -> class 1, x = 0.1 -> class 0; rows sum to one.
    fn stump_routes_by_threshold() {
        // Arrange
        let routing = stump();
        let params = [1.0, 0.5, 0.2, 0.8, 0.9, 0.1];
        let x = array![[0.9], [0.1]];

        // Act
        let out = predict(&routing, &params, x.view()).unwrap();

        // Assert
        assert_eq!(out.labels, array![1, 0]);
        assert_relative_eq!(out.probabilities[[0, 1]], 0.8, epsilon = 1e-9);
        assert_relative_eq!(out.probabilities[[1, 0]], 0.9, epsilon = 1e-9);
        for row in out.probabilities.outer_iter() {
            assert_relative_eq!(row.sum(), 1.0, epsilon = ROW_SUM_TOL);
        }
    }

    #[test]
    // Purpose
    // -------
    // Equal class probabilities resolve to the lowest class index.
    fn ties_go_to_lowest_class() {
        let routing = stump();
        let params = [0.3, -0.2, 0.5, 0.5, 0.5, 0.5];

        let out = predict(&routing, &params, array![[0.4], [0.7]].view()).unwrap();

        assert_eq!(out.labels, array![0, 0]);
        assert_eq!(argmax([0.2, 0.4, 0.4].into_iter()), 1);
    }

    #[test]
    // Purpose
    // -------
    // Corrupt parameters and wrong feature widths are rejected up front.
    fn rejects_invalid_inputs() {
        let routing = stump();
        let x = array![[0.5]];

        assert_eq!(
            predict(&routing, &[0.0; 5], x.view()),
            Err(OrctError::ParamLengthMismatch { expected: 6, actual: 5 })
        );
        assert!(matches!(
            predict(&routing, &[0.0, f64::NAN, 0.5, 0.5, 0.5, 0.5], x.view()),
            Err(OrctError::NonFiniteParam { index: 1, .. })
        ));
        assert!(matches!(
            predict(&routing, &[0.0, 0.0, 0.5, 0.5, 0.7, 0.5], x.view()),
            Err(OrctError::LeafNotNormalized { leaf: 2, .. })
        ));
        assert_eq!(
            predict(&routing, &[0.0, 0.0, 0.5, 0.5, 0.5, 0.5], array![[0.5, 0.5]].view()),
            Err(OrctError::FeatureWidthMismatch { expected: 1, actual: 2 })
        );
    }

    #[test]
    // Purpose
    // -------
    // A leaf block that sums to one but holds a negative entry is not a
    // probability vector and is rejected.
    //
    // Given
    // -----
    // - Stump parameters with left leaf [1.5, -0.5] and right leaf [0.5, 0.5].
    //
    // Expect
    // ------
    // - `ClassProbOutOfRange` naming leaf 1, class 0; entries within
    //   `LEAF_SUM_TOL` of the bounds are still accepted.
    fn rejects_class_probabilities_outside_unit_interval() {
        // Arrange
        let routing = stump();
        let x = array![[0.5]];

        // Act
        let err = predict(&routing, &[0.0, 0.0, 1.5, -0.5, 0.5, 0.5], x.view()).unwrap_err();
        let nearly = predict(&routing, &[0.0, 0.0, 1.0 + 1e-6, -1e-6, 0.5, 0.5], x.view());

        // Assert
        assert_eq!(err, OrctError::ClassProbOutOfRange { leaf: 1, class: 0, value: 1.5 });
        assert!(nearly.is_ok());
    }
}
