//! features::extractor: turning raw coefficient rows into model inputs.
//!
//! Purpose
//! -------
//! Define the collaborator that converts one coefficient row per sample into
//! the feature matrix and pairwise dissimilarity matrix consumed by the tree
//! fitter, plus two ready-made implementations.
//!
//! Key behaviors
//! -------------
//! - [`FeatureExtractor`] is the seam: anything that can produce
//!   `n_samples x n_feats` features and an `n_samples x n_samples`
//!   dissimilarity matrix from a coefficient matrix plugs into
//!   [`OrctModel::fit_coefficients`](crate::tree::fit::OrctModel::fit_coefficients).
//! - [`MultivariateExtractor`] treats the coefficients as the features
//!   themselves and measures squared Euclidean distance.
//! - [`ProjectionExtractor`] works in a fixed function basis: features are
//!   `C · B` for a caller-supplied basis-integral matrix `B`, and the
//!   dissimilarity of two curves is `(c_i − c_j)ᵀ G (c_i − c_j)`, the squared
//!   L² distance under the basis Gram matrix `G`. Evaluating the basis and
//!   its integrals is the caller's job.
//!
//! Conventions
//! -----------
//! - Coefficient matrices are row-per-sample: `n_samples x n_coeffs`.
//! - Extractors never scale; scaling is a fit option.
use crate::tree::errors::{OrctError, OrctResult};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Source of features and dissimilarities for a set of samples.
pub trait FeatureExtractor {
    /// `n_samples x n_feats` feature matrix.
    fn compute_features(
        &self, coefficients: ArrayView2<'_, f64>, n_feats: usize,
    ) -> OrctResult<Array2<f64>>;

    /// Symmetric `n_samples x n_samples` dissimilarity matrix with zero
    /// diagonal.
    fn compute_dissimilarity(&self, coefficients: ArrayView2<'_, f64>) -> OrctResult<Array2<f64>>;
}

/// Coefficients are used directly as features.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MultivariateExtractor;

impl FeatureExtractor for MultivariateExtractor {
    fn compute_features(
        &self, coefficients: ArrayView2<'_, f64>, n_feats: usize,
    ) -> OrctResult<Array2<f64>> {
        if coefficients.ncols() != n_feats {
            return Err(OrctError::FeatureWidthMismatch {
                expected: n_feats,
                actual: coefficients.ncols(),
            });
        }
        Ok(coefficients.to_owned())
    }

    fn compute_dissimilarity(&self, coefficients: ArrayView2<'_, f64>) -> OrctResult<Array2<f64>> {
        Ok(pairwise(coefficients, |a, b| {
            a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
        }))
    }
}

/// Features and distances of curves expanded in a fixed basis.
///
/// Fields
/// ------
/// - `integrals`: `n_coeffs x n_feats`; column `j` holds the integral of
///   each basis function over the `j`-th feature window.
/// - `gram`: `n_coeffs x n_coeffs` inner products of the basis functions.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionExtractor {
    integrals: Array2<f64>,
    gram: Array2<f64>,
}

impl ProjectionExtractor {
    /// # Errors
    /// - [`OrctError::ExtractorFailed`] if the matrices disagree on the
    ///   number of basis functions, the Gram matrix is not square, or any
    ///   entry is non-finite.
    pub fn new(integrals: Array2<f64>, gram: Array2<f64>) -> OrctResult<Self> {
        let n_coeffs = integrals.nrows();
        if gram.dim() != (n_coeffs, n_coeffs) {
            return Err(OrctError::ExtractorFailed {
                reason: format!(
                    "Gram matrix must be {n_coeffs} x {n_coeffs}, got {} x {}.",
                    gram.nrows(),
                    gram.ncols()
                ),
            });
        }
        if integrals.iter().chain(gram.iter()).any(|v| !v.is_finite()) {
            return Err(OrctError::ExtractorFailed {
                reason: "Basis matrices must be finite.".to_string(),
            });
        }
        Ok(Self { integrals, gram })
    }

    pub fn n_coeffs(&self) -> usize {
        self.integrals.nrows()
    }

    fn check_width(&self, coefficients: &ArrayView2<'_, f64>) -> OrctResult<()> {
        if coefficients.ncols() != self.n_coeffs() {
            return Err(OrctError::ExtractorFailed {
                reason: format!(
                    "Expected {} coefficients per sample, got {}.",
                    self.n_coeffs(),
                    coefficients.ncols()
                ),
            });
        }
        Ok(())
    }
}

impl FeatureExtractor for ProjectionExtractor {
    fn compute_features(
        &self, coefficients: ArrayView2<'_, f64>, n_feats: usize,
    ) -> OrctResult<Array2<f64>> {
        self.check_width(&coefficients)?;
        if self.integrals.ncols() != n_feats {
            return Err(OrctError::FeatureWidthMismatch {
                expected: n_feats,
                actual: self.integrals.ncols(),
            });
        }
        Ok(coefficients.dot(&self.integrals))
    }

    fn compute_dissimilarity(&self, coefficients: ArrayView2<'_, f64>) -> OrctResult<Array2<f64>> {
        self.check_width(&coefficients)?;
        Ok(pairwise(coefficients, |a, b| {
            let diff: Array1<f64> = &a - &b;
            diff.dot(&self.gram.dot(&diff))
        }))
    }
}

/// Symmetric matrix of `dist(row_i, row_j)` with a zero diagonal; each pair
/// is evaluated once.
fn pairwise<F>(rows: ArrayView2<'_, f64>, dist: F) -> Array2<f64>
where
    F: Fn(ArrayView1<'_, f64>, ArrayView1<'_, f64>) -> f64,
{
    let n = rows.nrows();
    let mut out = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let d = dist(rows.row(i), rows.row(j));
            out[[i, j]] = d;
            out[[j, i]] = d;
        }
    }
    out
}
