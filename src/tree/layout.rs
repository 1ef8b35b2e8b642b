//! tree::layout: flat parameter-vector layout of a randomized tree.
//!
//! Every interior node owns `n_feats` weights followed by one intercept;
//! every leaf owns `n_labels` class probabilities. Interior blocks come
//! first, in node order, then leaf blocks, in node order:
//!
//! ```text
//! [ w_0 (n_feats) | b_0 | w_1 | b_1 | ... | p_leaf0 (n_labels) | p_leaf1 | ... ]
//! ```
//!
//! [`VariableLayout::offset`] is a pure function of the node index and the
//! layout dimensions; the variable bounds in `tree::objective` are declared
//! with the same strides.
use crate::tree::topology::TreeTopology;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableLayout {
    pub n_feats: usize,
    pub n_labels: usize,
    pub n_int_nodes: usize,
    pub n_leaf_nodes: usize,
}

impl VariableLayout {
    pub fn new(topology: &TreeTopology, n_feats: usize, n_labels: usize) -> Self {
        Self {
            n_feats,
            n_labels,
            n_int_nodes: topology.n_int_nodes,
            n_leaf_nodes: topology.n_leaf_nodes,
        }
    }

    /// Offset of the first variable owned by `node`.
    #[inline]
    pub fn offset(&self, node: usize) -> usize {
        if node < self.n_int_nodes {
            (self.n_feats + 1) * node
        } else {
            self.interior_block_len() + self.n_labels * (node - self.n_int_nodes)
        }
    }

    /// Number of interior-node variables (weights and intercepts).
    #[inline]
    pub fn interior_block_len(&self) -> usize {
        (self.n_feats + 1) * self.n_int_nodes
    }

    /// Total number of variables.
    pub fn n_vars(&self) -> usize {
        self.interior_block_len() + self.n_labels * self.n_leaf_nodes
    }

    /// Index of the probability of class `k` at leaf `leaf`.
    #[inline]
    pub fn class_index(&self, leaf: usize, k: usize) -> usize {
        self.offset(leaf) + k
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Offsets tile the parameter vector without gaps or overlaps.
    //
    // Given
    // -----
    // - Depth 2 (3 interior nodes, 4 leaves), 3 features, 2 labels.
    //
    // Expect
    // ------
    // - Interior offsets 0, 4, 8; leaf offsets 12, 14, 16, 18; n_vars 20.
    fn offsets_tile_the_vector() {
        // Arrange
        let topo = TreeTopology::new(2).unwrap();

        // Act
        let layout = VariableLayout::new(&topo, 3, 2);

        // Assert
        let offsets: Vec<usize> = (0..topo.n_nodes).map(|n| layout.offset(n)).collect();
        assert_eq!(offsets, vec![0, 4, 8, 12, 14, 16, 18]);
        assert_eq!(layout.interior_block_len(), 12);
        assert_eq!(layout.n_vars(), 20);
        assert_eq!(layout.class_index(6, 1), 19);
    }

    #[test]
    // Purpose
    // -------
    // A root-only tree has no interior block; its single leaf starts at 0.
    fn root_only_tree_starts_with_leaf_block() {
        let topo = TreeTopology::new(0).unwrap();
        let layout = VariableLayout::new(&topo, 5, 3);

        assert_eq!(layout.offset(0), 0);
        assert_eq!(layout.n_vars(), 3);
    }
}
