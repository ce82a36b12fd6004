use thiserror::Error;

use crate::node::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("key not found")]
    KeyNotFound,
}

/// First broken invariant found by `AvlTree::check_invariants`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("node {node} breaks search order")]
    Unordered { node: NodeId },
    #[error("node {node} has height difference {diff}")]
    Unbalanced { node: NodeId, diff: i32 },
    #[error("node {node} stores balance {stored} but its height difference is {actual}")]
    BalanceDrift {
        node: NodeId,
        stored: i8,
        actual: i32,
    },
    #[error("node {node} does not point back to its parent")]
    BrokenParentLink { node: NodeId },
    #[error("tree reports {reported} entries but holds {reachable}")]
    LenMismatch { reported: usize, reachable: usize },
}
