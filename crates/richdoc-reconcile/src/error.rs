use richdoc_outline::NodeKey;
use thiserror::Error;

use crate::ops::DiffMode;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// Malformed diff input, raised only in strict mode.
    #[error(
        "invalid paragraphs for section {section_id} ({mode}, old={old_len}, new={new_len}): {reason}"
    )]
    Validation {
        section_id: String,
        old_len: usize,
        new_len: usize,
        mode: DiffMode,
        reason: String,
    },

    #[error("unknown diff mode '{0}'")]
    UnknownMode(String),

    #[error("unknown intent '{0}'")]
    UnknownIntent(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdaptError {
    #[error("{} node key(s) have no matching block", .0.len())]
    UnresolvedKeys(Vec<NodeKey>),
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;
