use thiserror::Error;

use crate::id::BlockId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("block already exists: {0}")]
    DuplicateBlock(BlockId),

    #[error("block not found: {0}")]
    BlockNotFound(BlockId),

    #[error("heading {id} has level {level}, expected 1..=6")]
    InvalidHeadingLevel { id: BlockId, level: u8 },

    #[error("unknown mark '{0}'")]
    UnknownMark(String),
}

/// Failure raised by a document-format converter.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("{format} input is not valid UTF-8")]
    InvalidEncoding { format: &'static str },

    #[error("malformed {format} document: {message}")]
    Malformed {
        format: &'static str,
        message: String,
    },

    #[error("{format} conversion does not support {what}")]
    Unsupported { format: &'static str, what: String },
}
