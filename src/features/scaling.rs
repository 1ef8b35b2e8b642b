//! features::scaling: per-column min-max scaling.
//!
//! [`MinMaxScaler::fit`] records the minimum and range of every feature
//! column; [`MinMaxScaler::transform`] maps a column to `(x - min) / range`.
//! A constant training column has no range and maps every value to `0`.
//! Values outside the training range are not clipped, so new data can land
//! outside `[0, 1]`.
use crate::tree::errors::{OrctError, OrctResult};
use ndarray::{Array1, Array2, ArrayView2, Axis};

#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    pub min: Array1<f64>,
    pub range: Array1<f64>,
}

impl MinMaxScaler {
    /// Learn column minima and ranges from `features`.
    ///
    /// # Errors
    /// - [`OrctError::EmptyData`] if `features` has no rows.
    /// - [`OrctError::NonFiniteData`] for the first non-finite entry.
    pub fn fit(features: ArrayView2<'_, f64>) -> OrctResult<Self> {
        if features.nrows() == 0 {
            return Err(OrctError::EmptyData);
        }
        for ((row, col), &value) in features.indexed_iter() {
            if !value.is_finite() {
                return Err(OrctError::NonFiniteData { what: "feature", row, col, value });
            }
        }
        let min = features.fold_axis(Axis(0), f64::INFINITY, |acc, &x| acc.min(x));
        let max = features.fold_axis(Axis(0), f64::NEG_INFINITY, |acc, &x| acc.max(x));
        let range = &max - &min;
        Ok(Self { min, range })
    }

    pub fn n_feats(&self) -> usize {
        self.min.len()
    }

    /// Scale `features` with the learned statistics.
    ///
    /// # Errors
    /// - [`OrctError::FeatureWidthMismatch`] if the column count differs from
    ///   the training data.
    pub fn transform(&self, features: ArrayView2<'_, f64>) -> OrctResult<Array2<f64>> {
        if features.ncols() != self.n_feats() {
            return Err(OrctError::FeatureWidthMismatch {
                expected: self.n_feats(),
                actual: features.ncols(),
            });
        }
        let mut scaled = features.to_owned();
        for (j, mut col) in scaled.axis_iter_mut(Axis(1)).enumerate() {
            let (lo, width) = (self.min[j], self.range[j]);
            if width > 0.0 {
                col.mapv_inplace(|x| (x - lo) / width);
            } else {
                col.fill(0.0);
            }
        }
        Ok(scaled)
    }

    /// Fit on `features` and return the scaled copy alongside the scaler.
    pub fn fit_transform(features: ArrayView2<'_, f64>) -> OrctResult<(Self, Array2<f64>)> {
        let scaler = Self::fit(features)?;
        let scaled = scaler.transform(features)?;
        Ok((scaler, scaled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn assert_close(a: &Array2<f64>, b: &Array2<f64>) {
        assert_eq!(a.dim(), b.dim());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_abs_diff_eq!(*x, *y, epsilon = 1e-15);
        }
    }

    #[test]
    // Purpose
    // -------
    // Training columns land exactly on [0, 1]; constant columns map to 0.
    //
    // Given
    // -----
    // - Column 0 spans [2, 6], column 1 is constant 3.
    //
    // Expect
    // ------
    // - Column 0 -> (0, 0.5, 1); column 1 -> zeros.
    fn scales_columns_and_zeroes_constants() {
        // Arrange
        let x = array![[2.0, 3.0], [4.0, 3.0], [6.0, 3.0]];

        // Act
        let (scaler, scaled) = MinMaxScaler::fit_transform(x.view()).unwrap();

        // Assert
        assert_eq!(scaler.min, array![2.0, 3.0]);
        assert_eq!(scaler.range, array![4.0, 0.0]);
        assert_close(&scaled, &array![[0.0, 0.0], [0.5, 0.0], [1.0, 0.0]]);
    }

    #[test]
    // Purpose
    // -------
    // New data reuses the training statistics and is width-checked.
    fn transform_reuses_training_statistics() {
        let scaler = MinMaxScaler::fit(array![[0.0], [10.0]].view()).unwrap();

        let out = scaler.transform(array![[5.0], [20.0]].view()).unwrap();
        assert_close(&out, &array![[0.5], [2.0]]);
        assert_eq!(
            scaler.transform(array![[1.0, 2.0]].view()),
            Err(OrctError::FeatureWidthMismatch { expected: 1, actual: 2 })
        );
        let empty = Array2::<f64>::zeros((0, 3));
        assert_eq!(MinMaxScaler::fit(empty.view()), Err(OrctError::EmptyData));
    }
}
