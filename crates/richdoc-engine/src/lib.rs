//! Operation engine for richdoc documents.
//!
//! [`apply_ops`] is a pure function from a snapshot and an operation batch to
//! the next snapshot; [`History`] layers snapshot undo/redo on top of it.

pub mod diff;
pub mod engine;
pub mod error;
pub mod history;
mod inline;
pub mod ops;

pub use diff::{build_unified_diff, preview_diff};
pub use engine::{apply_ops, ApplyOutcome, SkippedOp};
pub use error::OpFailure;
pub use history::History;
pub use ops::{BlockType, DocOp, DocOpKind, OpMeta, OpSource};
