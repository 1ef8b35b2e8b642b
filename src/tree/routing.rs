//! tree::routing: soft routing of a sample through the tree.
//!
//! Purpose
//! -------
//! Turn a feature row and a flat parameter vector into routing
//! probabilities. At interior node `t` the probability of going left is
//!
//! ```text
//! p_t(x) = σ(γ · (⟨w_t, x⟩ / n_feats − b_t))
//! ```
//!
//! and the probability of reaching leaf `τ` is the product of `p_t` over the
//! ancestors left of which `τ` lies, times `1 − p_t` over the ancestors
//! right of which it lies.
//!
//! Key behaviors
//! -------------
//! - Every formula is generic over [`Scalar`], so prediction (`f64`) and
//!   training ([`Dual`](crate::optimization::scalar::Dual)) share one
//!   implementation.
//! - [`RoutingModel::leaf_probabilities`] evaluates each interior node once
//!   per sample and reuses it for every leaf below it.
//! - The sigmoid goes through
//!   [`safe_logistic`](crate::optimization::numerical_stability::safe_logistic),
//!   so a large `γ` saturates cleanly instead of overflowing.
//!
//! Invariants & assumptions
//! ------------------------
//! - Feature rows have exactly `n_feats` entries and `params` has
//!   `layout.n_vars()` entries; both are validated before fitting or
//!   predicting and only debug-asserted here.
//! - Leaf probabilities lie in `[0, 1]` and sum to one over the leaves.
use crate::{
    optimization::{numerical_stability::safe_logistic, scalar::Scalar},
    tree::{layout::VariableLayout, topology::TreeTopology},
};
use ndarray::ArrayView1;

#[derive(Debug, Clone, PartialEq)]
pub struct RoutingModel {
    pub topology: TreeTopology,
    pub layout: VariableLayout,
    pub gamma: f64,
}

impl RoutingModel {
    pub fn new(topology: TreeTopology, n_feats: usize, n_labels: usize, gamma: f64) -> Self {
        let layout = VariableLayout::new(&topology, n_feats, n_labels);
        Self { topology, layout, gamma }
    }

    /// Probability of branching left at interior node `node`.
    pub fn prob_left<S: Scalar>(&self, feats: ArrayView1<'_, f64>, params: &[S], node: usize) -> S {
        debug_assert!(node < self.topology.n_int_nodes, "node {node} is not interior");
        let n_feats = self.layout.n_feats;
        debug_assert_eq!(feats.len(), n_feats);
        let offset = self.layout.offset(node);

        let mut dot = S::zero();
        for (j, &x) in feats.iter().enumerate() {
            dot += params[offset + j].clone() * x;
        }
        let score = dot / n_feats as f64 - params[offset + n_feats].clone();
        safe_logistic(score * self.gamma)
    }

    /// Probability of reaching leaf `leaf`.
    pub fn prob_leaf<S: Scalar>(&self, feats: ArrayView1<'_, f64>, params: &[S], leaf: usize) -> S {
        debug_assert!(self.topology.is_leaf(leaf), "node {leaf} is not a leaf");
        let record = self.topology.ancestors(leaf);
        let mut prob = S::one();
        for &a in &record.left {
            prob = prob * self.prob_left(feats, params, a);
        }
        for &a in &record.right {
            prob = prob * (-self.prob_left(feats, params, a) + 1.0);
        }
        prob
    }

    /// Probabilities of reaching every leaf, in leaf order.
    pub fn leaf_probabilities<S: Scalar>(
        &self, feats: ArrayView1<'_, f64>, params: &[S],
    ) -> Vec<S> {
        let left: Vec<S> =
            (0..self.topology.n_int_nodes).map(|t| self.prob_left(feats, params, t)).collect();
        self.topology
            .leaves()
            .map(|leaf| {
                let record = self.topology.ancestors(leaf);
                let mut prob = S::one();
                for &a in &record.left {
                    prob = prob * left[a].clone();
                }
                for &a in &record.right {
                    prob = prob * (-left[a].clone() + 1.0);
                }
                prob
            })
            .collect()
    }
}
