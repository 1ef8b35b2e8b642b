//! tree::objective: the ORCT nonlinear program.
//!
//! Purpose
//! -------
//! Express training of a randomized classification tree as one nonlinear
//! program over the flat parameter vector:
//!
//! ```text
//! minimize   C(θ) + α · P(θ)
//! subject to Σ_k θ[τ,k] = 1          for every leaf τ
//!            Σ_τ θ[τ,k] ≥ 1          for every class k
//!            θ_interior ∈ [-1, 1],  θ_leaf ∈ [0, 1]
//! ```
//!
//! with the expected misclassification cost
//! `C = (1/N) Σ_i Σ_τ Σ_k P_iτ · cost(y_i, k) · θ[τ,k]` and the expected
//! within-leaf dissimilarity `P = (1/L) Σ_τ Σ_{i<j} P_iτ · P_jτ · d_ij`,
//! where `P_iτ` is the probability that sample `i` reaches leaf `τ`.
//!
//! Key behaviors
//! -------------
//! - [`OrctProgram`] implements
//!   [`ProgramEvaluator`](crate::optimization::nlp_solver::ProgramEvaluator),
//!   so it is evaluated in `f64` for diagnostics and in `Dual` for exact
//!   solver gradients.
//! - Leaf probabilities are computed once per sample per evaluation and
//!   shared by the cost, the penalty, and nothing else; constraints depend
//!   only on the leaf blocks.
//! - The penalty is skipped inside the solver objective when `α == 0`,
//!   but [`OrctProgram::terms`] always reports it.
//!
//! Invariants & assumptions
//! ------------------------
//! - The data was validated against the same `n_feats` and `n_labels` as the
//!   routing model.
//! - Constraint order: one normalization per leaf (leaf order), then one
//!   coverage constraint per class (class order).
//!
//! Performance
//! -----------
//! - The penalty costs `O(L · N²)` plain operations per evaluation and
//!   dominates for large training sets; only `O(L · N)` of its terms carry
//!   derivatives.
use crate::{
    optimization::{
        errors::OptResult,
        nlp_solver::{MathProgram, ProgramEvaluator, Theta, UNBOUNDED},
        scalar::Scalar,
    },
    tree::{data::OrctData, options::TreeSpec, routing::RoutingModel},
};

/// Objective decomposition at one parameter vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveTerms {
    pub objective: f64,
    pub cost: f64,
    pub penalty: f64,
}

/// The training program of one configured tree.
#[derive(Debug, Clone, Copy)]
pub struct OrctProgram<'m> {
    pub spec: &'m TreeSpec,
    pub routing: &'m RoutingModel,
    pub data: &'m OrctData,
}

impl<'m> OrctProgram<'m> {
    pub fn new(spec: &'m TreeSpec, routing: &'m RoutingModel, data: &'m OrctData) -> Self {
        Self { spec, routing, data }
    }

    /// Leaf probabilities of every sample, `[sample][leaf]`.
    pub fn leaf_matrix<S: Scalar>(&self, params: &[S]) -> Vec<Vec<S>> {
        self.data
            .features
            .outer_iter()
            .map(|row| self.routing.leaf_probabilities(row, params))
            .collect()
    }

    /// Expected misclassification cost.
    pub fn expected_cost<S: Scalar>(&self, params: &[S], leaf_probs: &[Vec<S>]) -> S {
        let layout = &self.routing.layout;
        let n_labels = self.spec.n_labels;
        let mut total = S::zero();
        for (probs, &label) in leaf_probs.iter().zip(self.data.labels.iter()) {
            for (t, leaf) in self.routing.topology.leaves().enumerate() {
                let mut expected = S::zero();
                for k in 0..n_labels {
                    let c = self.spec.cost.cost(label, k);
                    if c != 0.0 {
                        expected += params[layout.class_index(leaf, k)].clone() * c;
                    }
                }
                total += probs[t].clone() * expected;
            }
        }
        total / leaf_probs.len() as f64
    }

    /// Expected within-leaf dissimilarity.
    ///
    /// The value is accumulated in `f64`. The derivative of
    /// `Σ_{i<j} p_i p_j d_ij` with respect to `p_i` is `Σ_{j≠i} p_j d_ij`, so
    /// the differentiable part is `Σ_i p_i · w_i` with those weights frozen.
    pub fn expected_penalty<S: Scalar>(&self, leaf_probs: &[Vec<S>]) -> S {
        let d = &self.data.dissimilarity;
        let n_samples = leaf_probs.len();
        let n_leaf = self.routing.topology.n_leaf_nodes;
        let mut value = 0.0;
        let mut linear = S::zero();
        let mut weights = vec![0.0; n_samples];
        for t in 0..n_leaf {
            weights.iter_mut().for_each(|w| *w = 0.0);
            for i in 0..n_samples {
                let p_i = leaf_probs[i][t].value();
                let mut upper = 0.0;
                for j in (i + 1)..n_samples {
                    let dij = d[[i, j]];
                    if dij != 0.0 {
                        upper += leaf_probs[j][t].value() * dij;
                        weights[j] += p_i * dij;
                    }
                }
                weights[i] += upper;
                value += p_i * upper;
            }
            for (probs, &w) in leaf_probs.iter().zip(weights.iter()) {
                if w != 0.0 {
                    linear += probs[t].clone() * w;
                }
            }
        }
        linear.with_value(value) / n_leaf as f64
    }

    /// Leaf normalization sums followed by class coverage sums.
    pub fn constraints<S: Scalar>(&self, params: &[S], out: &mut [S]) {
        let layout = &self.routing.layout;
        let n_labels = self.spec.n_labels;
        let n_leaf = self.routing.topology.n_leaf_nodes;
        debug_assert_eq!(out.len(), n_leaf + n_labels);

        for slot in out.iter_mut() {
            *slot = S::zero();
        }
        for (t, leaf) in self.routing.topology.leaves().enumerate() {
            for k in 0..n_labels {
                let p = params[layout.class_index(leaf, k)].clone();
                out[t] += p.clone();
                out[n_leaf + k] += p;
            }
        }
    }

    /// Cost, penalty and weighted objective in plain arithmetic.
    pub fn terms(&self, params: &[f64]) -> ObjectiveTerms {
        let leaf_probs = self.leaf_matrix(params);
        let cost = self.expected_cost(params, &leaf_probs);
        let penalty = self.expected_penalty(&leaf_probs);
        ObjectiveTerms { objective: cost + self.spec.alpha * penalty, cost, penalty }
    }

    /// Variable bounds: `[-1, 1]` for interior blocks, `[0, 1]` for leaves.
    pub fn variable_bounds(&self) -> (Theta, Theta) {
        let layout = &self.routing.layout;
        let n_vars = layout.n_vars();
        let split = layout.interior_block_len();
        let lower = Theta::from_shape_fn(n_vars, |i| if i < split { -1.0 } else { 0.0 });
        let upper = Theta::ones(n_vars);
        (lower, upper)
    }

    /// Constraint bounds: `[1, 1]` per leaf, `[1, +∞)` per class.
    pub fn constraint_bounds(&self) -> (Theta, Theta) {
        let n_leaf = self.routing.topology.n_leaf_nodes;
        let n = n_leaf + self.spec.n_labels;
        let lower = Theta::ones(n);
        let upper = Theta::from_shape_fn(n, |i| if i < n_leaf { 1.0 } else { UNBOUNDED });
        (lower, upper)
    }

    /// Bind the program to its bounds.
    ///
    /// # Errors
    /// Propagates bound validation errors (not expected for a valid spec).
    pub fn math_program(&self) -> OptResult<MathProgram<'_, Self>> {
        let (xl, xu) = self.variable_bounds();
        let (gl, gu) = self.constraint_bounds();
        MathProgram::new(self, xl, xu, gl, gu)
    }
}

impl ProgramEvaluator for OrctProgram<'_> {
    fn n_vars(&self) -> usize {
        self.routing.layout.n_vars()
    }

    fn n_constraints(&self) -> usize {
        self.routing.topology.n_leaf_nodes + self.spec.n_labels
    }

    fn eval<S: Scalar>(&self, x: &[S], fg: &mut [S]) {
        let leaf_probs = self.leaf_matrix(x);
        let mut objective = self.expected_cost(x, &leaf_probs);
        if self.spec.alpha > 0.0 {
            objective += self.expected_penalty(&leaf_probs) * self.spec.alpha;
        }
        fg[0] = objective;
        self.constraints(x, &mut fg[1..]);
    }
}
