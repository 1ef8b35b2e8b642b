//! nlp_solver::builders: L-BFGS solver construction helpers.
//!
//! Purpose
//! -------
//! Provide small, focused builders for the L-BFGS solvers that minimize
//! each augmented-Lagrangian subproblem. These helpers hide Argmin’s
//! generic wiring and apply crate-level options (tolerances, memory size)
//! so the outer loop can request a configured solver without touching
//! Argmin-specific types.
//!
//! Key behaviors
//! -------------
//! - Construct L-BFGS solvers with either Hager–Zhang or More–Thuente
//!   line search based on crate-level aliases.
//! - Apply optional gradient and cost-change tolerances from
//!   [`SolverOptions`] via a shared configuration helper.
//! - Leave the initial point and maximum iterations to the runner.
//!
//! Invariants & assumptions
//! ------------------------
//! - All solvers operate on [`Theta`], [`Grad`], and [`Cost`].
//! - The L-BFGS memory (`m`) is `opts.lbfgs_mem` or [`DEFAULT_LBFGS_MEM`].
//! - Any tolerance rejected by Argmin surfaces as an [`OptError`] via the
//!   crate’s `From<Error>` implementation.
//!
//! Testing notes
//! -------------
//! - Unit tests verify that both builders succeed with explicit and default
//!   memory and that `configure_lbfgs` tolerates absent tolerances.
//!
//! [`OptError`]: crate::optimization::errors::OptError
//! [`DEFAULT_LBFGS_MEM`]: crate::optimization::nlp_solver::types::DEFAULT_LBFGS_MEM
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    nlp_solver::{
        traits::SolverOptions,
        types::{
            Cost, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente, MoreThuenteLS, Theta,
        },
    },
};

/// Build an [`LbfgsHagerZhang`] solver with the configured memory and
/// tolerances.
///
/// # Errors
/// Returns an `OptError` if Argmin rejects a tolerance.
pub fn build_optimizer_hager_zhang(opts: &SolverOptions) -> OptResult<LbfgsHagerZhang> {
    let lbfgs = LbfgsHagerZhang::new(HagerZhangLS::new(), opts.memory());
    configure_lbfgs(lbfgs, opts)
}

/// Build an [`LbfgsMoreThuente`] solver with the configured memory and
/// tolerances.
///
/// # Errors
/// Returns an `OptError` if Argmin rejects a tolerance.
pub fn build_optimizer_more_thuente(opts: &SolverOptions) -> OptResult<LbfgsMoreThuente> {
    let lbfgs = LbfgsMoreThuente::new(MoreThuenteLS::new(), opts.memory());
    configure_lbfgs(lbfgs, opts)
}

/// Apply optional gradient and cost tolerances to an L-BFGS solver,
/// regardless of its line-search type.
///
/// When a tolerance is `None` the corresponding `with_tolerance_*` method is
/// not called and Argmin’s default stays in effect.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &SolverOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::nlp_solver::{
        traits::{LineSearcher, Tolerances},
        types::DEFAULT_LBFGS_MEM,
    };

    fn options(tols: Tolerances, line_searcher: LineSearcher, mem: Option<usize>) -> SolverOptions {
        SolverOptions { tols, line_searcher, lbfgs_mem: mem, ..SolverOptions::default() }
    }

    #[test]
    // Purpose
    // -------
    // Both builders succeed with the default and an explicit L-BFGS memory.
    //
    // Given
    // -----
    // - Valid tolerances; `lbfgs_mem` = None and Some(11).
    //
    // Expect
    // ------
    // - Every builder call returns `Ok(_)`.
    fn builders_accept_default_and_explicit_memory() {
        // Arrange
        let tols = Tolerances::new(Some(1e-6), Some(1e-8), Some(50)).unwrap();

        for mem in [None, Some(11)] {
            // Act
            let hz = build_optimizer_hager_zhang(&options(tols, LineSearcher::HagerZhang, mem));
            let mt = build_optimizer_more_thuente(&options(tols, LineSearcher::MoreThuente, mem));

            // Assert
            assert!(hz.is_ok(), "Hager–Zhang builder should succeed for mem {mem:?}");
            assert!(mt.is_ok(), "More–Thuente builder should succeed for mem {mem:?}");
        }
    }

    #[test]
    // Purpose
    // -------
    // `configure_lbfgs` relies on Argmin defaults when both tolerances are
    // absent.
    fn configure_lbfgs_respects_absent_tolerances() {
        let raw = LBFGS::new(MoreThuenteLS::new(), DEFAULT_LBFGS_MEM);
        let tols = Tolerances::new(None, None, Some(50)).unwrap();

        let configured = configure_lbfgs(raw, &options(tols, LineSearcher::MoreThuente, None));

        assert!(configured.is_ok());
    }
}
