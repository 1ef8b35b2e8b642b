//! tree::init: reproducible restart seeds and initial points.
//!
//! Purpose
//! -------
//! Derive one seed per restart from a single base seed and turn each seed
//! into a starting parameter vector for the solver.
//!
//! Key behaviors
//! -------------
//! - [`restart_seeds`] expands the base seed through a `Xoshiro256PlusPlus`
//!   stream, so the whole restart schedule is a pure function of
//!   `(base, n_restarts)`.
//! - [`initial_point`] draws every leaf block from a symmetric Dirichlet
//!   with concentration 1, sampled as normalized `Exp(1)` draws, and every
//!   interior weight and intercept from `U[0, 1]`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Each leaf block of an initial point sums to one (up to rounding) before
//!   any optimization step.
//! - Leaf blocks are drawn first, in leaf order, then the interior block; the
//!   draw order is part of the reproducibility contract.
use crate::{
    optimization::nlp_solver::Theta,
    tree::{errors::OrctResult, layout::VariableLayout},
};
use rand::{distributions::Distribution, Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use statrs::distribution::Exp;

/// Expand `base` into `n` restart seeds.
pub fn restart_seeds(base: u64, n: usize) -> Vec<u64> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(base);
    (0..n).map(|_| rng.gen::<u64>()).collect()
}

/// Random starting point for one restart.
///
/// Leaf blocks are Dirichlet(1) draws taken as normalized `Exp(1)` samples,
/// since `statrs::distribution::Dirichlet` samples into nalgebra vectors.
///
/// # Errors
/// - [`OrctError::InvalidDistribution`](crate::tree::errors::OrctError::InvalidDistribution)
///   if the sampling distribution cannot be built.
pub fn initial_point(layout: &VariableLayout, seed: u64) -> OrctResult<Theta> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let unit_exp = Exp::new(1.0)?;
    let mut values = vec![0.0; layout.n_vars()];
    let (interior, leaves) = values.split_at_mut(layout.interior_block_len());

    for block in leaves.chunks_mut(layout.n_labels) {
        let mut total = 0.0;
        for slot in block.iter_mut() {
            *slot = unit_exp.sample(&mut rng);
            total += *slot;
        }
        for slot in block.iter_mut() {
            *slot /= total;
        }
    }
    for slot in interior.iter_mut() {
        *slot = rng.gen::<f64>();
    }
    Ok(Theta::from_vec(values))
}
