use thiserror::Error;

use crate::NodeId;

pub type Result<T> = std::result::Result<T, TreeError>;

/// Misuse and resource errors reported by [`SplayTree`](crate::SplayTree).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    #[error("duplicate key: an equal key is already linked as {existing:?}")]
    DuplicateKey { existing: NodeId },

    #[error("node {0:?} has no key")]
    MissingKey(NodeId),

    #[error("node {0:?} is already linked into the tree")]
    AlreadyLinked(NodeId),

    #[error("node {0:?} is not linked into the tree")]
    NotLinked(NodeId),

    #[error("node {0:?} must be removed before it is freed")]
    StillLinked(NodeId),

    #[error("stale node handle {0:?}")]
    StaleHandle(NodeId),

    #[error("node allocation failed")]
    AllocationFailed,
}
