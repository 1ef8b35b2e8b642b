//! Errors for randomized classification trees (hyperparameter checks, data
//! validation, fit/predict state, and optimizer failures).
//!
//! This module defines [`OrctError`], used across configuration, fitting and
//! prediction. It implements `Display`/`Error` and absorbs solver-layer
//! [`OptError`] values through `From`.
//!
//! ## Conventions
//! - **Indices are 0-based**: sample rows, feature columns, class labels and
//!   tree nodes (level order, root = 0).
//! - All precondition violations are reported before any restart runs.
//! - A failure of a single restart is *not* an error of the fit; only
//!   [`OrctError::NoFeasibleRestart`] surfaces when every restart failed.
use crate::optimization::errors::OptError;
use statrs::distribution::ExpError;

/// Crate-wide result alias for tree operations that may produce [`OrctError`].
pub type OrctResult<T> = Result<T, OrctError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OrctError {
    // ---- Hyperparameters ----
    /// Depth beyond the supported maximum.
    DepthTooLarge { depth: usize, max: usize },

    /// At least one feature is required.
    NoFeatures,

    /// At least two classes are required.
    TooFewLabels { n_labels: usize },

    /// A tree needs at least one leaf per class.
    TooFewLeaves { n_leaf_nodes: usize, n_labels: usize },

    /// Penalty weight must be finite and >= 0.
    InvalidAlpha { value: f64 },

    /// Routing temperature must be finite and > 0.
    InvalidGamma { value: f64 },

    /// Misclassification costs must be finite and >= 0, with an
    /// `n_labels x n_labels` matrix.
    InvalidCost { reason: &'static str },

    /// At least one restart is required.
    NoRestarts,

    // ---- Data validation ----
    /// No samples were supplied.
    EmptyData,

    /// Two inputs disagree on the number of samples.
    SampleCountMismatch { what: &'static str, expected: usize, actual: usize },

    /// Feature matrix has the wrong number of columns.
    FeatureWidthMismatch { expected: usize, actual: usize },

    /// A label is outside `0..n_labels`.
    LabelOutOfRange { index: usize, label: usize, n_labels: usize },

    /// A feature or dissimilarity entry is NaN/±inf.
    NonFiniteData { what: &'static str, row: usize, col: usize, value: f64 },

    /// Dissimilarity matrix must be square, symmetric, with a zero diagonal.
    InvalidDissimilarity { row: usize, col: usize, reason: &'static str },

    // ---- Parameters / prediction ----
    /// Parameter vector length does not match the tree layout.
    ParamLengthMismatch { expected: usize, actual: usize },

    /// A leaf's class probabilities do not sum to one.
    LeafNotNormalized { leaf: usize, sum: f64 },

    /// A class probability lies outside `[0, 1]`.
    ClassProbOutOfRange { leaf: usize, class: usize, value: f64 },

    /// A parameter entry is NaN/±inf.
    NonFiniteParam { index: usize, value: f64 },

    // ---- Fit state ----
    /// `fit` was called before `configure`.
    ModelNotConfigured,

    /// Model hasn't been fitted yet.
    ModelNotFitted,

    /// Every restart failed; carries one message per restart.
    NoFeasibleRestart { failures: Vec<String> },

    // ---- Runtime / collaborators ----
    /// Dedicated thread pool could not be created.
    ThreadPool { reason: String },

    /// Sampling distribution for the initial points could not be built.
    InvalidDistribution { reason: String },

    /// Feature extractor rejected its input.
    ExtractorFailed { reason: String },

    /// Optimizer failure outside the per-restart isolation.
    Optimization(OptError),
}

impl std::error::Error for OrctError {}

impl std::fmt::Display for OrctError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Hyperparameters ----
            OrctError::DepthTooLarge { depth, max } => {
                write!(f, "Tree depth {depth} exceeds the supported maximum of {max}.")
            }
            OrctError::NoFeatures => write!(f, "At least one feature is required."),
            OrctError::TooFewLabels { n_labels } => {
                write!(f, "At least two classes are required; got {n_labels}.")
            }
            OrctError::TooFewLeaves { n_leaf_nodes, n_labels } => {
                write!(
                    f,
                    "Tree has {n_leaf_nodes} leaves but {n_labels} classes; increase the depth."
                )
            }
            OrctError::InvalidAlpha { value } => {
                write!(f, "alpha must be finite and >= 0; got: {value}")
            }
            OrctError::InvalidGamma { value } => {
                write!(f, "gamma must be finite and > 0; got: {value}")
            }
            OrctError::InvalidCost { reason } => {
                write!(f, "Invalid misclassification cost: {reason}")
            }
            OrctError::NoRestarts => write!(f, "At least one restart is required."),

            // ---- Data validation ----
            OrctError::EmptyData => write!(f, "No samples were supplied."),
            OrctError::SampleCountMismatch { what, expected, actual } => {
                write!(f, "Sample count mismatch for {what}: expected {expected}, got {actual}")
            }
            OrctError::FeatureWidthMismatch { expected, actual } => {
                write!(f, "Feature matrix must have {expected} columns; got {actual}")
            }
            OrctError::LabelOutOfRange { index, label, n_labels } => {
                write!(f, "Label {label} at index {index} is outside 0..{n_labels}")
            }
            OrctError::NonFiniteData { what, row, col, value } => {
                write!(f, "{what} entry ({row}, {col}) is non-finite: {value}")
            }
            OrctError::InvalidDissimilarity { row, col, reason } => {
                write!(f, "Invalid dissimilarity at ({row}, {col}): {reason}")
            }

            // ---- Parameters / prediction ----
            OrctError::ParamLengthMismatch { expected, actual } => {
                write!(f, "Parameter vector must have length {expected}; got {actual}")
            }
            OrctError::LeafNotNormalized { leaf, sum } => {
                write!(f, "Class probabilities of leaf {leaf} sum to {sum}, not 1")
            }
            OrctError::ClassProbOutOfRange { leaf, class, value } => {
                write!(
                    f,
                    "Probability of class {class} in leaf {leaf} is outside [0, 1]: {value}"
                )
            }
            OrctError::NonFiniteParam { index, value } => {
                write!(f, "Parameter at index {index} is non-finite: {value}")
            }

            // ---- Fit state ----
            OrctError::ModelNotConfigured => write!(f, "Model hasn't been configured yet."),
            OrctError::ModelNotFitted => write!(f, "Model hasn't been fitted yet."),
            OrctError::NoFeasibleRestart { failures } => {
                write!(f, "No solution found: all {} restarts failed", failures.len())?;
                if let Some(first) = failures.first() {
                    write!(f, " (first failure: {first})")?;
                }
                Ok(())
            }

            // ---- Runtime / collaborators ----
            OrctError::ThreadPool { reason } => {
                write!(f, "Failed to build thread pool: {reason}")
            }
            OrctError::InvalidDistribution { reason } => {
                write!(f, "Invalid sampling distribution: {reason}")
            }
            OrctError::ExtractorFailed { reason } => {
                write!(f, "Feature extraction failed: {reason}")
            }
            OrctError::Optimization(err) => write!(f, "Optimizer error: {err}"),
        }
    }
}

impl From<OptError> for OrctError {
    fn from(err: OptError) -> OrctError {
        OrctError::Optimization(err)
    }
}

impl From<ExpError> for OrctError {
    fn from(err: ExpError) -> OrctError {
        OrctError::InvalidDistribution { reason: err.to_string() }
    }
}

impl From<rayon::ThreadPoolBuildError> for OrctError {
    fn from(err: rayon::ThreadPoolBuildError) -> OrctError {
        OrctError::ThreadPool { reason: err.to_string() }
    }
}
