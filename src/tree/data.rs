//! Training data container for randomized classification trees.
//!
//! Purpose
//! -------
//! Provide a small, validated container for one training set: class labels,
//! a feature matrix, and a pairwise dissimilarity matrix. All data checks
//! happen once, in [`OrctData::new`], before any restart starts.
//!
//! Invariants & assumptions
//! ------------------------
//! - At least one sample; labels, feature rows and dissimilarity rows agree
//!   on the sample count.
//! - Labels lie in `0..n_labels`; features have exactly `n_feats` columns.
//! - Every entry is finite; the dissimilarity matrix is square, symmetric
//!   (up to [`SYMMETRY_TOL`]) and has a zero diagonal.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the happy path and each rejection.
use crate::tree::errors::{OrctError, OrctResult};
use ndarray::{Array1, Array2};

/// Relative tolerance used for the symmetry and zero-diagonal checks.
pub const SYMMETRY_TOL: f64 = 1e-10;

/// Validated training data.
///
/// Fields
/// ------
/// - `labels`: `Array1<usize>`, class of each sample.
/// - `features`: `Array2<f64>`, samples x features.
/// - `dissimilarity`: `Array2<f64>`, samples x samples.
#[derive(Debug, Clone, PartialEq)]
pub struct OrctData {
    pub labels: Array1<usize>,
    pub features: Array2<f64>,
    pub dissimilarity: Array2<f64>,
}

impl OrctData {
    /// Construct validated training data for a tree with `n_feats` features
    /// and `n_labels` classes.
    ///
    /// # Errors
    /// - [`OrctError::EmptyData`] if there are no samples.
    /// - [`OrctError::SampleCountMismatch`] if the inputs disagree on the
    ///   number of samples.
    /// - [`OrctError::FeatureWidthMismatch`] if `features` is not `n_feats` wide.
    /// - [`OrctError::LabelOutOfRange`] for the first label `>= n_labels`.
    /// - [`OrctError::NonFiniteData`] for the first non-finite entry.
    /// - [`OrctError::InvalidDissimilarity`] for a non-square, asymmetric, or
    ///   non-zero-diagonal dissimilarity matrix.
    pub fn new(
        labels: Array1<usize>, features: Array2<f64>, dissimilarity: Array2<f64>, n_feats: usize,
        n_labels: usize,
    ) -> OrctResult<Self> {
        let n_samples = labels.len();
        if n_samples == 0 {
            return Err(OrctError::EmptyData);
        }
        if features.nrows() != n_samples {
            return Err(OrctError::SampleCountMismatch {
                what: "feature rows",
                expected: n_samples,
                actual: features.nrows(),
            });
        }
        if features.ncols() != n_feats {
            return Err(OrctError::FeatureWidthMismatch {
                expected: n_feats,
                actual: features.ncols(),
            });
        }
        if dissimilarity.nrows() != n_samples {
            return Err(OrctError::SampleCountMismatch {
                what: "dissimilarity rows",
                expected: n_samples,
                actual: dissimilarity.nrows(),
            });
        }
        if dissimilarity.ncols() != n_samples {
            return Err(OrctError::InvalidDissimilarity {
                row: 0,
                col: dissimilarity.ncols(),
                reason: "Matrix must be square.",
            });
        }
        for (index, &label) in labels.iter().enumerate() {
            if label >= n_labels {
                return Err(OrctError::LabelOutOfRange { index, label, n_labels });
            }
        }
        check_finite("feature", &features)?;
        check_finite("dissimilarity", &dissimilarity)?;
        check_symmetric(&dissimilarity)?;
        Ok(Self { labels, features, dissimilarity })
    }

    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }
}

/// Reject the first non-finite entry of `m`.
pub(crate) fn check_finite(what: &'static str, m: &Array2<f64>) -> OrctResult<()> {
    for ((row, col), &value) in m.indexed_iter() {
        if !value.is_finite() {
            return Err(OrctError::NonFiniteData { what, row, col, value });
        }
    }
    Ok(())
}

fn check_symmetric(d: &Array2<f64>) -> OrctResult<()> {
    let n = d.nrows();
    for i in 0..n {
        if d[[i, i]].abs() > SYMMETRY_TOL {
            return Err(OrctError::InvalidDissimilarity {
                row: i,
                col: i,
                reason: "Diagonal must be zero.",
            });
        }
        for j in (i + 1)..n {
            let (a, b) = (d[[i, j]], d[[j, i]]);
            if (a - b).abs() > SYMMETRY_TOL * a.abs().max(b.abs()).max(1.0) {
                return Err(OrctError::InvalidDissimilarity {
                    row: i,
                    col: j,
                    reason: "Matrix must be symmetric.",
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn dissim() -> Array2<f64> {
        array![[0.0, 1.0, 4.0], [1.0, 0.0, 9.0], [4.0, 9.0, 0.0]]
    }

    #[test]
    // Purpose
    // -------
    // Well-formed data is accepted unchanged.
    fn accepts_valid_data() {
        let data = OrctData::new(
            array![0, 1, 1],
            array![[0.1, 0.2], [0.3, 0.4], [0.5, 0.6]],
            dissim(),
            2,
            2,
        )
        .unwrap();
        assert_eq!(data.n_samples(), 3);
    }

    #[test]
    // Purpose
    // -------
    // Shape and label violations are reported with the offending sizes.
    fn rejects_shape_and_label_violations() {
        let feats = array![[0.1, 0.2], [0.3, 0.4], [0.5, 0.6]];
        assert_eq!(
            OrctData::new(array![0, 1], feats.clone(), dissim(), 2, 2),
            Err(OrctError::SampleCountMismatch { what: "feature rows", expected: 2, actual: 3 })
        );
        assert_eq!(
            OrctData::new(array![0, 1, 1], feats.clone(), dissim(), 3, 2),
            Err(OrctError::FeatureWidthMismatch { expected: 3, actual: 2 })
        );
        assert_eq!(
            OrctData::new(array![0, 2, 1], feats.clone(), dissim(), 2, 2),
            Err(OrctError::LabelOutOfRange { index: 1, label: 2, n_labels: 2 })
        );
        assert_eq!(
            OrctData::new(Array1::zeros(0), Array2::zeros((0, 2)), Array2::zeros((0, 0)), 2, 2),
            Err(OrctError::EmptyData)
        );
    }

    #[test]
    // Purpose
    // -------
    // Non-finite entries and malformed dissimilarities are rejected.
    fn rejects_bad_values() {
        let labels = array![0, 1, 1];
        let feats = array![[0.1, 0.2], [0.3, f64::INFINITY], [0.5, 0.6]];
        assert!(matches!(
            OrctData::new(labels.clone(), feats, dissim(), 2, 2),
            Err(OrctError::NonFiniteData { what: "feature", row: 1, col: 1, .. })
        ));

        let feats = array![[0.1, 0.2], [0.3, 0.4], [0.5, 0.6]];
        let mut asym = dissim();
        asym[[0, 2]] = 5.0;
        assert!(matches!(
            OrctData::new(labels.clone(), feats.clone(), asym, 2, 2),
            Err(OrctError::InvalidDissimilarity { row: 0, col: 2, .. })
        ));

        let mut diag = dissim();
        diag[[1, 1]] = 0.5;
        assert!(matches!(
            OrctData::new(labels, feats, diag, 2, 2),
            Err(OrctError::InvalidDissimilarity { row: 1, col: 1, .. })
        ));
    }
}
