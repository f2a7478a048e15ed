//! Closed set of engine operations.
//!
//! On the wire an operation is `{"type": ..., "payload": {...}, "meta": {...}}`.
//! `meta` may be omitted, in which case it is filled with a fresh user-sourced
//! id and the current time.

use chrono::{DateTime, Utc};
use richdoc_model::{BlockId, Mark, OpId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpSource {
    #[default]
    User,
    Ai,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpMeta {
    pub source: OpSource,
    pub op_id: OpId,
    pub timestamp: DateTime<Utc>,
}

impl OpMeta {
    pub fn new(source: OpSource) -> Self {
        Self {
            source,
            op_id: OpId::new(),
            timestamp: Utc::now(),
        }
    }
}

impl Default for OpMeta {
    fn default() -> Self {
        Self::new(OpSource::User)
    }
}

/// Target type for [`DocOpKind::SetBlockType`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockType {
    Paragraph,
    Heading { level: u8 },
}

fn default_preserve_style() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum DocOpKind {
    InsertText {
        node_id: BlockId,
        offset: usize,
        text: String,
    },
    DeleteRange {
        start_node_id: BlockId,
        start_offset: usize,
        end_node_id: BlockId,
        end_offset: usize,
    },
    InsertParagraph {
        #[serde(default)]
        after: Option<BlockId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        /// Caller-chosen id for the new block.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<BlockId>,
    },
    SplitBlock {
        node_id: BlockId,
        offset: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_block_id: Option<BlockId>,
    },
    InsertLineBreak {
        node_id: BlockId,
        offset: usize,
    },
    ToggleMark {
        node_id: BlockId,
        start_offset: usize,
        end_offset: usize,
        mark: Mark,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        force: Option<bool>,
    },
    SetBlockType {
        node_id: BlockId,
        block_type: BlockType,
    },
    ReplaceBlockText {
        node_id: BlockId,
        text: String,
        #[serde(default = "default_preserve_style")]
        preserve_style: bool,
    },
    DeleteBlock {
        node_id: BlockId,
    },
}

impl DocOpKind {
    pub fn name(&self) -> &'static str {
        match self {
            DocOpKind::InsertText { .. } => "insert_text",
            DocOpKind::DeleteRange { .. } => "delete_range",
            DocOpKind::InsertParagraph { .. } => "insert_paragraph",
            DocOpKind::SplitBlock { .. } => "split_block",
            DocOpKind::InsertLineBreak { .. } => "insert_line_break",
            DocOpKind::ToggleMark { .. } => "toggle_mark",
            DocOpKind::SetBlockType { .. } => "set_block_type",
            DocOpKind::ReplaceBlockText { .. } => "replace_block_text",
            DocOpKind::DeleteBlock { .. } => "delete_block",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocOp {
    #[serde(flatten)]
    pub kind: DocOpKind,
    #[serde(default)]
    pub meta: OpMeta,
}

impl DocOp {
    pub fn new(kind: DocOpKind, source: OpSource) -> Self {
        Self {
            kind,
            meta: OpMeta::new(source),
        }
    }

    pub fn user(kind: DocOpKind) -> Self {
        Self::new(kind, OpSource::User)
    }

    pub fn ai(kind: DocOpKind) -> Self {
        Self::new(kind, OpSource::Ai)
    }
}
