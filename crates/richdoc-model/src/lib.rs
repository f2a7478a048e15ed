//! Document model for the richdoc structured editor.
//!
//! A document is stored as an arena: a flat `BlockId → BlockNode` map plus an
//! explicit ordering vector. Blocks own their inline content directly, so the
//! tree is never deeper than block → inline → (link) inline.

pub mod block;
pub mod convert;
pub mod document;
pub mod error;
pub mod id;
pub mod inline;
pub mod marks;
pub mod selection;

pub use block::{BlockBody, BlockKind, BlockNode, ListItem, MAX_HEADING_LEVEL};
pub use convert::{DocumentConverter, JsonConverter};
pub use document::{DocumentAst, DocumentMetadata};
pub use error::{ConversionError, ModelError};
pub use id::{BlockId, OpId};
pub use inline::{inline_len, inline_text, InlineNode, TextRun};
pub use marks::{Mark, MarkSet};
pub use selection::{Position, Selection};
