use std::fmt;
use std::str::FromStr;

use richdoc_outline::NodeKey;
use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffMode {
    #[default]
    Rewrite,
    Summarize,
    Expand,
}

impl DiffMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiffMode::Rewrite => "rewrite",
            DiffMode::Summarize => "summarize",
            DiffMode::Expand => "expand",
        }
    }
}

impl fmt::Display for DiffMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiffMode {
    type Err = ReconcileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rewrite" => Ok(DiffMode::Rewrite),
            "summarize" => Ok(DiffMode::Summarize),
            "expand" => Ok(DiffMode::Expand),
            _ => Err(ReconcileError::UnknownMode(value.to_string())),
        }
    }
}

/// Paragraph-level edit addressed by section-extractor node keys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionDocOp {
    ReplaceParagraph {
        target_key: NodeKey,
        new_text: String,
        preserve_style: bool,
        index: usize,
    },
    InsertParagraphAfter {
        reference_key: NodeKey,
        new_text: String,
        index: usize,
    },
    DeleteParagraph {
        target_key: NodeKey,
        index: usize,
    },
}

impl SectionDocOp {
    pub fn index(&self) -> usize {
        match self {
            SectionDocOp::ReplaceParagraph { index, .. }
            | SectionDocOp::InsertParagraphAfter { index, .. }
            | SectionDocOp::DeleteParagraph { index, .. } => *index,
        }
    }

    /// Key of the paragraph the op targets or anchors on.
    pub fn key(&self) -> &NodeKey {
        match self {
            SectionDocOp::ReplaceParagraph { target_key, .. }
            | SectionDocOp::DeleteParagraph { target_key, .. } => target_key,
            SectionDocOp::InsertParagraphAfter { reference_key, .. } => reference_key,
        }
    }

    pub fn is_replace(&self) -> bool {
        matches!(self, SectionDocOp::ReplaceParagraph { .. })
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, SectionDocOp::InsertParagraphAfter { .. })
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, SectionDocOp::DeleteParagraph { .. })
    }

    /// Apply order: replaces, then inserts, then deletes.
    fn phase(&self) -> u8 {
        match self {
            SectionDocOp::ReplaceParagraph { .. } => 0,
            SectionDocOp::InsertParagraphAfter { .. } => 1,
            SectionDocOp::DeleteParagraph { .. } => 2,
        }
    }
}

/// Sort into safe application order: replaces and inserts ascending by
/// index, deletes descending so earlier deletes never shift later targets.
pub fn sort_for_application(ops: &mut [SectionDocOp]) {
    ops.sort_by(|a, b| {
        a.phase().cmp(&b.phase()).then_with(|| {
            if a.is_delete() {
                b.index().cmp(&a.index())
            } else {
                a.index().cmp(&b.index())
            }
        })
    });
}
