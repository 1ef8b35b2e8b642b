//! tree::topology: structure of a complete binary tree of fixed depth.
//!
//! Purpose
//! -------
//! Compute node counts and, for every node, the interior ancestors from
//! which it is reached through a left branch and through a right branch.
//! Routing composes probabilities along exactly these chains.
//!
//! Key behaviors
//! -------------
//! - Nodes are numbered in level order: the children of node `j` are
//!   `2j + 1` (left) and `2j + 2` (right).
//! - Interior nodes are `0..n_int_nodes`, leaves are `n_int_nodes..n_nodes`.
//! - Ancestor records are built once by breadth-first expansion, each child
//!   copying its parent's record and appending the parent to one side.
//!
//! Invariants & assumptions
//! ------------------------
//! - `n_nodes = 2^(D+1) - 1`, `n_int_nodes = 2^D - 1`, `n_leaf_nodes = 2^D`.
//! - For every node the left and right sets are disjoint and together have
//!   as many elements as the node's depth; the root has none.
//! - Depth is capped at [`MAX_DEPTH`] so node counts stay addressable and
//!   the dense leaf-probability caches stay small.
use crate::tree::errors::{OrctError, OrctResult};

/// Deepest supported tree.
pub const MAX_DEPTH: usize = 16;

/// Interior ancestors of one node, split by the branch taken out of them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AncestorRecord {
    /// Ancestors whose left branch leads towards the node.
    pub left: Vec<usize>,
    /// Ancestors whose right branch leads towards the node.
    pub right: Vec<usize>,
}

impl AncestorRecord {
    pub fn len(&self) -> usize {
        self.left.len() + self.right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeTopology {
    pub depth: usize,
    pub n_nodes: usize,
    pub n_int_nodes: usize,
    pub n_leaf_nodes: usize,
    ancestors: Vec<AncestorRecord>,
}

impl TreeTopology {
    /// Build the topology of a complete tree of the given depth.
    ///
    /// # Errors
    /// - [`OrctError::DepthTooLarge`] if `depth > MAX_DEPTH`.
    pub fn new(depth: usize) -> OrctResult<Self> {
        if depth > MAX_DEPTH {
            return Err(OrctError::DepthTooLarge { depth, max: MAX_DEPTH });
        }
        let n_leaf_nodes = 1usize << depth;
        let n_int_nodes = n_leaf_nodes - 1;
        let n_nodes = n_int_nodes + n_leaf_nodes;

        let mut ancestors = Vec::with_capacity(n_nodes);
        ancestors.push(AncestorRecord::default());
        for parent in 0..n_int_nodes {
            let mut left = ancestors[parent].clone();
            left.left.push(parent);
            let mut right = ancestors[parent].clone();
            right.right.push(parent);
            ancestors.push(left);
            ancestors.push(right);
        }
        debug_assert_eq!(ancestors.len(), n_nodes);

        Ok(Self { depth, n_nodes, n_int_nodes, n_leaf_nodes, ancestors })
    }

    pub fn ancestors(&self, node: usize) -> &AncestorRecord {
        &self.ancestors[node]
    }

    pub fn is_leaf(&self, node: usize) -> bool {
        node >= self.n_int_nodes && node < self.n_nodes
    }

    /// Leaf node indices in ascending order.
    pub fn leaves(&self) -> std::ops::Range<usize> {
        self.n_int_nodes..self.n_nodes
    }

    /// Depth of `node` (root = 0).
    pub fn node_depth(node: usize) -> usize {
        (usize::BITS - 1 - (node + 1).leading_zeros()) as usize
    }
}
