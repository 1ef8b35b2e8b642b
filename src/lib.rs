//! rust_orct: optimal randomized classification trees.
//!
//! Purpose
//! -------
//! Serve as the crate root for fitting classification trees whose splits and
//! leaf assignments are soft and trained jointly as one constrained
//! nonlinear program, with parallel randomized restarts.
//!
//! Key behaviors
//! -------------
//! - [`tree`]: topology, parameter layout, routing, the training program,
//!   the multi-start orchestrator and the predictor.
//! - [`optimization`]: the numeric scalar domain (`f64` and forward-mode
//!   dual numbers), numerically stable transforms, and the constrained
//!   solver layer built on Argmin's L-BFGS.
//! - [`features`]: feature extractors from raw coefficient rows and the
//!   min-max scaler.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are validated once at the boundary (`TreeSpec::new`,
//!   `OrctModel::configure`, `predict`); numeric kernels assume valid shapes.
//! - Fitting is reproducible from the base seed regardless of thread count.
//!
//! Conventions
//! -----------
//! - Errors are surfaced as [`OrctError`](tree::OrctError) at the tree level
//!   and [`OptError`](optimization::errors::OptError) inside the solver
//!   layer; the former absorbs the latter.
//! - Progress is reported with `tracing`; install a subscriber to see it.
//!
//! Downstream usage
//! ----------------
//! ```no_run
//! use ndarray::array;
//! use rust_orct::prelude::*;
//!
//! # fn main() -> Result<(), OrctError> {
//! let spec = TreeSpec::with_defaults(1, 1, 2, 0.0)?;
//! let mut model = OrctModel::new(spec)?;
//! let features = array![[0.1], [0.9], [0.2], [0.8]];
//! let dissimilarity = ndarray::Array2::zeros((4, 4));
//! model.fit_data(
//!     array![0, 1, 0, 1],
//!     features.clone(),
//!     dissimilarity,
//!     &FitOptions::default(),
//!     &AugLagSolver::default(),
//! )?;
//! let prediction = model.predict(features.view())?;
//! # let _ = prediction;
//! # Ok(())
//! # }
//! ```
//!
//! Testing notes
//! -------------
//! - Unit tests live next to every module; end-to-end scenarios are in
//!   `tests/integration_orct_pipeline.rs`.

pub mod features;
pub mod optimization;
pub mod tree;

pub mod prelude {
    pub use crate::features::prelude::*;
    pub use crate::optimization::prelude::*;
    pub use crate::tree::prelude::*;
}
