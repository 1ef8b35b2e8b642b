//! tree::fit: multi-start fitting of a randomized classification tree.
//!
//! Purpose
//! -------
//! Own a tree's hyperparameters and training data, run many independent
//! randomized solves of the training program in parallel, and keep the best
//! one.
//!
//! Key behaviors
//! -------------
//! - [`OrctModel::configure`] validates and binds the training data (and
//!   optionally min-max scales the features); the model moves from
//!   [`FitState::Unconfigured`] to [`FitState::Configured`].
//! - [`OrctModel::fit`] derives one seed per restart from the base seed,
//!   builds every initial point in parallel, runs the solver once per
//!   restart in parallel, then selects the best restart on the calling
//!   thread after all solves have joined. The model ends in
//!   [`FitState::Solved`].
//! - A restart whose solver call errors, or whose end point violates a
//!   constraint or bound by more than the solver's `constraint_tol`, is
//!   logged, recorded in [`FitResult::failures`] and excluded; only when no
//!   feasible restart remains does the fit return
//!   [`OrctError::NoFeasibleRestart`].
//! - Selection uses the objective and violation re-evaluated at each
//!   returned point; the lowest feasible objective wins and ties go to the
//!   lowest restart index.
//!
//! Invariants & assumptions
//! ------------------------
//! - Topology, layout, data and the bound program are shared read-only by
//!   all restarts; each restart owns its initial point and solver state.
//! - Given identical inputs and base seed, initial points and restart order
//!   are identical across calls and thread counts.
//!
//! Downstream usage
//! ----------------
//! - `configure` + `fit`, or [`OrctModel::fit_data`] for both at once, or
//!   [`OrctModel::fit_coefficients`] to run a feature extractor first.
//! - After a fit, [`OrctModel::predict`] applies the stored scaler and the
//!   best parameters.
use crate::{
    features::{FeatureExtractor, MinMaxScaler},
    optimization::nlp_solver::{MathProgram, NonlinearSolver, Theta},
    tree::{
        data::OrctData,
        errors::{OrctError, OrctResult},
        init::{initial_point, restart_seeds},
        objective::OrctProgram,
        options::{FitOptions, TreeSpec},
        predict::{predict, Prediction},
        routing::RoutingModel,
        topology::TreeTopology,
    },
};
use ndarray::{Array1, Array2, ArrayView2};
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Observable lifecycle of an [`OrctModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitState {
    Unconfigured,
    Configured,
    Solved,
}

/// Per-restart record of a feasible solve.
///
/// `objective`, `cost`, `penalty` and `max_violation` are evaluated at
/// `params`.
#[derive(Debug, Clone, PartialEq)]
pub struct RestartDiagnostics {
    pub restart: usize,
    pub seed: u64,
    pub objective: f64,
    pub cost: f64,
    pub penalty: f64,
    pub params: Theta,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub max_violation: f64,
}

/// A restart whose solver call failed or ended infeasible.
#[derive(Debug, Clone, PartialEq)]
pub struct RestartFailure {
    pub restart: usize,
    pub seed: u64,
    pub message: String,
}

/// Outcome of one fit call.
///
/// Fields
/// ------
/// - `spec`: hyperparameters the fit ran with.
/// - `best_restart`: index of the selected restart.
/// - `best_objective` / `best_params`: its objective and parameters.
/// - `restarts`: feasible restarts in restart order.
/// - `failures`: failed or infeasible restarts in restart order.
/// - `scaler`: feature scaler fitted on the training data, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub spec: TreeSpec,
    pub best_restart: usize,
    pub best_objective: f64,
    pub best_params: Theta,
    pub restarts: Vec<RestartDiagnostics>,
    pub failures: Vec<RestartFailure>,
    pub scaler: Option<MinMaxScaler>,
}

impl FitResult {
    /// Objective of every feasible restart, in restart order.
    pub fn objectives(&self) -> Vec<f64> {
        self.restarts.iter().map(|r| r.objective).collect()
    }

    pub fn costs(&self) -> Vec<f64> {
        self.restarts.iter().map(|r| r.cost).collect()
    }

    pub fn penalties(&self) -> Vec<f64> {
        self.restarts.iter().map(|r| r.penalty).collect()
    }

    /// Diagnostics of the selected restart.
    pub fn best(&self) -> Option<&RestartDiagnostics> {
        self.restarts.iter().find(|r| r.restart == self.best_restart)
    }
}

/// Randomized classification tree with its training data and fit results.
#[derive(Debug, Clone, PartialEq)]
pub struct OrctModel {
    pub spec: TreeSpec,
    pub routing: RoutingModel,
    data: Option<OrctData>,
    scaler: Option<MinMaxScaler>,
    /// Fit results (populated after `fit`).
    pub results: Option<FitResult>,
}

impl OrctModel {
    /// Build the topology and routing model for `spec`.
    ///
    /// # Errors
    /// - [`OrctError::DepthTooLarge`] from the topology.
    pub fn new(spec: TreeSpec) -> OrctResult<Self> {
        let topology = TreeTopology::new(spec.depth)?;
        let routing = RoutingModel::new(topology, spec.n_feats, spec.n_labels, spec.gamma);
        Ok(Self { spec, routing, data: None, scaler: None, results: None })
    }

    pub fn state(&self) -> FitState {
        match (&self.data, &self.results) {
            (None, _) => FitState::Unconfigured,
            (Some(_), None) => FitState::Configured,
            (Some(_), Some(_)) => FitState::Solved,
        }
    }

    /// Training data as bound by the last `configure`, after scaling.
    pub fn data(&self) -> Option<&OrctData> {
        self.data.as_ref()
    }

    /// Validate and bind training data; clears any previous fit.
    ///
    /// With `scale_features`, a [`MinMaxScaler`] is fitted on `features` and
    /// the scaled copy is what the program sees.
    ///
    /// # Errors
    /// Any data validation error of [`OrctData::new`] or of the scaler.
    pub fn configure(
        &mut self, labels: Array1<usize>, features: Array2<f64>, dissimilarity: Array2<f64>,
        scale_features: bool,
    ) -> OrctResult<()> {
        let (scaler, features) = if scale_features {
            let (scaler, scaled) = MinMaxScaler::fit_transform(features.view())?;
            (Some(scaler), scaled)
        } else {
            (None, features)
        };
        let data =
            OrctData::new(labels, features, dissimilarity, self.spec.n_feats, self.spec.n_labels)?;
        info!(
            depth = self.spec.depth,
            n_samples = data.n_samples(),
            n_feats = self.spec.n_feats,
            n_labels = self.spec.n_labels,
            n_vars = self.routing.layout.n_vars(),
            scaled = scale_features,
            "configured randomized tree"
        );
        self.data = Some(data);
        self.scaler = scaler;
        self.results = None;
        Ok(())
    }

    /// The training program bound to the configured data.
    ///
    /// # Errors
    /// - [`OrctError::ModelNotConfigured`] before `configure`.
    pub fn program(&self) -> OrctResult<OrctProgram<'_>> {
        let data = self.data.as_ref().ok_or(OrctError::ModelNotConfigured)?;
        Ok(OrctProgram::new(&self.spec, &self.routing, data))
    }

    /// Initial points of the first `n_restarts` restarts, in restart order.
    pub fn initial_points(&self, n_restarts: usize) -> OrctResult<Vec<Theta>> {
        let seeds = restart_seeds(self.spec.seed, n_restarts);
        let layout = self.routing.layout;
        seeds.par_iter().map(|&seed| initial_point(&layout, seed)).collect()
    }

    /// Run `opts.n_restarts` randomized solves and keep the best.
    ///
    /// # Errors
    /// - [`OrctError::ModelNotConfigured`] before `configure`.
    /// - [`OrctError::NoRestarts`] for zero restarts.
    /// - [`OrctError::ThreadPool`] if a dedicated pool cannot be built.
    /// - [`OrctError::NoFeasibleRestart`] if every restart failed or ended
    ///   infeasible.
    pub fn fit<N: NonlinearSolver>(
        &mut self, opts: &FitOptions, solver: &N,
    ) -> OrctResult<&FitResult> {
        if opts.n_restarts == 0 {
            return Err(OrctError::NoRestarts);
        }
        let result = {
            let program = self.program()?;
            let bound = program.math_program()?;
            let seeds = restart_seeds(self.spec.seed, opts.n_restarts);
            info!(
                n_restarts = opts.n_restarts,
                n_threads = opts.n_threads,
                seed = self.spec.seed,
                "starting randomized restarts"
            );
            let outcomes = if opts.n_threads > 0 {
                let pool = rayon::ThreadPoolBuilder::new().num_threads(opts.n_threads).build()?;
                pool.install(|| run_restarts(&program, &bound, &seeds, solver))?
            } else {
                run_restarts(&program, &bound, &seeds, solver)?
            };
            let tol = opts.solver.constraint_tol;
            select_best(&self.spec, outcomes, tol, self.scaler.clone())?
        };
        info!(
            best_restart = result.best_restart,
            best_objective = result.best_objective,
            n_failed = result.failures.len(),
            "selected best restart"
        );
        let result: &FitResult = self.results.insert(result);
        Ok(result)
    }

    /// `configure` followed by `fit`.
    pub fn fit_data<N: NonlinearSolver>(
        &mut self, labels: Array1<usize>, features: Array2<f64>, dissimilarity: Array2<f64>,
        opts: &FitOptions, solver: &N,
    ) -> OrctResult<&FitResult> {
        self.configure(labels, features, dissimilarity, opts.scale_features)?;
        self.fit(opts, solver)
    }

    /// Extract features and dissimilarities from raw coefficient rows, then
    /// configure and fit.
    pub fn fit_coefficients<X: FeatureExtractor, N: NonlinearSolver>(
        &mut self, extractor: &X, labels: Array1<usize>, coefficients: ArrayView2<'_, f64>,
        opts: &FitOptions, solver: &N,
    ) -> OrctResult<&FitResult> {
        let features = extractor.compute_features(coefficients, self.spec.n_feats)?;
        let dissimilarity = extractor.compute_dissimilarity(coefficients)?;
        self.fit_data(labels, features, dissimilarity, opts, solver)
    }

    /// Predict with the best parameters of the last fit.
    ///
    /// The training scaler, if any, is applied to `features` first.
    ///
    /// # Errors
    /// - [`OrctError::ModelNotFitted`] before a successful `fit`.
    /// - Any error of [`predict`].
    pub fn predict(&self, features: ArrayView2<'_, f64>) -> OrctResult<Prediction> {
        let result = self.results.as_ref().ok_or(OrctError::ModelNotFitted)?;
        let params = result.best_params.to_vec();
        match &result.scaler {
            Some(scaler) => predict(&self.routing, &params, scaler.transform(features)?.view()),
            None => predict(&self.routing, &params, features),
        }
    }

    /// Predict from raw coefficient rows through `extractor`.
    pub fn predict_coefficients<X: FeatureExtractor>(
        &self, extractor: &X, coefficients: ArrayView2<'_, f64>,
    ) -> OrctResult<Prediction> {
        let features = extractor.compute_features(coefficients, self.spec.n_feats)?;
        self.predict(features.view())
    }
}

type RestartOutcome = Result<RestartDiagnostics, RestartFailure>;

/// Fan out: initial points, then one solve per restart. Results come back
/// in restart order.
fn run_restarts<N: NonlinearSolver>(
    program: &OrctProgram<'_>, bound: &MathProgram<'_, OrctProgram<'_>>, seeds: &[u64],
    solver: &N,
) -> OrctResult<Vec<RestartOutcome>> {
    let layout = program.routing.layout;
    let starts: Vec<Theta> =
        seeds.par_iter().map(|&seed| initial_point(&layout, seed)).collect::<OrctResult<_>>()?;

    Ok(starts
        .into_par_iter()
        .zip(seeds.par_iter())
        .enumerate()
        .map(|(restart, (x0, &seed))| {
            debug!(restart, seed, "restart started");
            match solver.solve(bound, x0) {
                Ok(outcome) => {
                    let params = outcome.x.to_vec();
                    let terms = program.terms(&params);
                    let max_violation = bound.max_violation(&outcome.x);
                    debug!(
                        restart,
                        objective = terms.objective,
                        converged = outcome.converged,
                        iterations = outcome.iterations,
                        max_violation,
                        "restart finished"
                    );
                    Ok(RestartDiagnostics {
                        restart,
                        seed,
                        objective: terms.objective,
                        cost: terms.cost,
                        penalty: terms.penalty,
                        params: outcome.x,
                        converged: outcome.converged,
                        status: outcome.status,
                        iterations: outcome.iterations,
                        max_violation,
                    })
                }
                Err(err) => {
                    warn!(restart, seed, error = %err, "restart failed; excluded from selection");
                    Err(RestartFailure { restart, seed, message: err.to_string() })
                }
            }
        })
        .collect())
}

/// Fan in: split feasible restarts from failed or infeasible ones and pick
/// the lowest objective.
fn select_best(
    spec: &TreeSpec, outcomes: Vec<RestartOutcome>, constraint_tol: f64,
    scaler: Option<MinMaxScaler>,
) -> OrctResult<FitResult> {
    let mut restarts = Vec::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(diag) if diag.max_violation <= constraint_tol => restarts.push(diag),
            Ok(diag) => {
                warn!(
                    restart = diag.restart,
                    max_violation = diag.max_violation,
                    "restart ended infeasible; excluded from selection"
                );
                failures.push(RestartFailure {
                    restart: diag.restart,
                    seed: diag.seed,
                    message: format!(
                        "infeasible end point: max violation {:.3e} exceeds {constraint_tol:.1e}",
                        diag.max_violation
                    ),
                });
            }
            Err(failure) => failures.push(failure),
        }
    }

    let mut best: Option<&RestartDiagnostics> = None;
    for diag in &restarts {
        if best.map_or(true, |b| diag.objective < b.objective) {
            best = Some(diag);
        }
    }
    let Some(best) = best else {
        return Err(OrctError::NoFeasibleRestart {
            failures: failures
                .iter()
                .map(|f| format!("restart {}: {}", f.restart, f.message))
                .collect(),
        });
    };

    let (best_restart, best_objective, best_params) =
        (best.restart, best.objective, best.params.clone());
    Ok(FitResult {
        spec: spec.clone(),
        best_restart,
        best_objective,
        best_params,
        restarts,
        failures,
        scaler,
    })
}
