//! Execution helper that runs an `argmin` solver on one augmented-Lagrangian
//! subproblem and returns a crate-friendly [`InnerOutcome`].
use crate::optimization::{
    errors::OptResult,
    nlp_solver::{
        adapter::AugLagAdapter,
        traits::{InnerOutcome, ProgramEvaluator, SolverOptions},
        types::{Grad, Theta},
    },
};
#[cfg(feature = "obs_slog")]
use argmin::core::{CostFunction, Gradient};
use argmin::core::{Executor, State};
#[cfg(feature = "obs_slog")]
use argmin_math::ArgminL2Norm;

/// Run an `argmin` optimization for one subproblem.
///
/// Shared runner for both line-search variants. It wires up the
/// [`AugLagAdapter`], the chosen solver, the initial unconstrained point
/// `z0`, optional observers (behind the `obs_slog` feature), and the
/// optional `max_iters`, then converts the final state into an
/// [`InnerOutcome`].
///
/// # Feature flags
/// If the `obs_slog` feature is enabled and `opts.verbose == true`, a terminal
/// slog observer is attached with `ObserverMode::Always` and a one-time
/// pre-iteration line logs the starting cost and gradient norm.
///
/// # Errors
/// - Propagates any `argmin` runtime error (line-search failures, non-finite
///   costs raised by the adapter) via `From<argmin::core::Error>`.
/// - Propagates validation errors raised while building the [`InnerOutcome`].
pub fn run_lbfgs<'p, 'a, E, S>(
    z0: Theta, opts: &SolverOptions, problem: AugLagAdapter<'p, 'a, E>, solver: S,
) -> OptResult<InnerOutcome>
where
    E: ProgramEvaluator,
    S: argmin::core::Solver<
            AugLagAdapter<'p, 'a, E>,
            argmin::core::IterState<Theta, Grad, (), (), (), f64>,
        > + Send
        + 'static,
{
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(&z0, &problem)?;
    }
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(z0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    InnerOutcome::new(
        result.take_best_param(),
        result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        grad,
    )
}

#[cfg(feature = "obs_slog")]
fn log_initial_state<E: ProgramEvaluator>(
    z0: &Theta, problem: &AugLagAdapter<'_, '_, E>,
) -> OptResult<()> {
    let c0 = problem.cost(z0)?;
    let g0n = problem.gradient(z0).ok().map(|g| g.l2_norm());

    eprintln!(
        "init: L(z0) = {:.6}, rho = {:.3e}{}",
        c0,
        problem.rho,
        g0n.map(|n| format!(", ||grad|| = {:.6}", n)).unwrap_or_default()
    );
    Ok(())
}
