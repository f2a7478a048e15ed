use richdoc_model::{BlockId, BlockKind};
use thiserror::Error;

/// Reason a single operation was skipped. The rest of the batch still runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OpFailure {
    #[error("block not found: {0}")]
    BlockNotFound(BlockId),

    #[error("block {id} is a {kind} and has no character offsets")]
    UnsupportedBlock { id: BlockId, kind: BlockKind },

    #[error("block id already in use: {0}")]
    DuplicateBlock(BlockId),
}
