//! features: from raw per-sample coefficients to tree inputs.
//!
//! Purpose
//! -------
//! Hold the collaborators that sit in front of the tree fitter: feature
//! extractors that turn coefficient rows into a feature matrix and a pairwise
//! dissimilarity matrix, and the min-max scaler applied to features before
//! fitting and again at prediction.
//!
//! Key behaviors
//! -------------
//! - [`extractor`]: the [`FeatureExtractor`] trait, the identity
//!   [`MultivariateExtractor`], and the basis-projection
//!   [`ProjectionExtractor`].
//! - [`scaling`]: [`MinMaxScaler`], fitted on training features and stored in
//!   the fit result.
//!
//! Invariants & assumptions
//! ------------------------
//! - Extractor outputs are validated again by
//!   [`OrctData::new`](crate::tree::data::OrctData::new); extractors only
//!   check what they need to compute.
//!
//! Downstream usage
//! ----------------
//! - `tree::fit` calls an extractor from the coefficient-level entry points
//!   and applies the scaler when `FitOptions::scale_features` is set.

pub mod extractor;
pub mod scaling;

pub use self::extractor::{FeatureExtractor, MultivariateExtractor, ProjectionExtractor};
pub use self::scaling::MinMaxScaler;

pub mod prelude {
    pub use super::extractor::{FeatureExtractor, MultivariateExtractor, ProjectionExtractor};
    pub use super::scaling::MinMaxScaler;
}
