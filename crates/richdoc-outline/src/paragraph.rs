use std::fmt;

use richdoc_model::{BlockId, BlockNode, DocumentAst};
use serde::{Deserialize, Serialize};

/// Key the section extractor hands out for a paragraph.
///
/// Keys produced by [`project`] are the block id in string form, but callers
/// may build flat paragraph lists from other sources with their own keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(String);

impl NodeKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<BlockId> for NodeKey {
    fn from(id: BlockId) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for NodeKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParagraphType {
    Normal,
    #[serde(rename = "heading-1")]
    Heading1,
    #[serde(rename = "heading-2")]
    Heading2,
    #[serde(rename = "heading-3")]
    Heading3,
}

impl ParagraphType {
    /// Levels deeper than 3 fold into `Heading3`.
    pub fn from_heading_level(level: u8) -> Self {
        match level {
            0 => ParagraphType::Normal,
            1 => ParagraphType::Heading1,
            2 => ParagraphType::Heading2,
            _ => ParagraphType::Heading3,
        }
    }

    pub fn is_heading(self) -> bool {
        !matches!(self, ParagraphType::Normal)
    }
}

/// One entry of the flat paragraph projection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatParagraph {
    pub key: NodeKey,
    pub kind: ParagraphType,
    /// True heading level (1..=6); `None` for body paragraphs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    pub text: String,
    pub index: usize,
}

impl FlatParagraph {
    pub fn normal(key: impl Into<NodeKey>, text: impl Into<String>, index: usize) -> Self {
        Self {
            key: key.into(),
            kind: ParagraphType::Normal,
            level: None,
            text: text.into(),
            index,
        }
    }

    pub fn heading(
        key: impl Into<NodeKey>,
        level: u8,
        text: impl Into<String>,
        index: usize,
    ) -> Self {
        Self {
            key: key.into(),
            kind: ParagraphType::from_heading_level(level),
            level: Some(level),
            text: text.into(),
            index,
        }
    }

    pub fn is_heading(&self) -> bool {
        self.kind.is_heading()
    }

    /// Level used for section boundaries.
    pub fn heading_level(&self) -> Option<u8> {
        if !self.is_heading() {
            return None;
        }
        self.level.or(match self.kind {
            ParagraphType::Heading1 => Some(1),
            ParagraphType::Heading2 => Some(2),
            ParagraphType::Heading3 => Some(3),
            ParagraphType::Normal => None,
        })
    }
}

/// Flatten a document into one paragraph per block, in document order.
pub fn project(doc: &DocumentAst) -> Vec<FlatParagraph> {
    doc.blocks()
        .enumerate()
        .map(|(index, block)| project_block(block, index))
        .collect()
}

fn project_block(block: &BlockNode, index: usize) -> FlatParagraph {
    match block.heading_level() {
        Some(level) => FlatParagraph::heading(block.id, level, block.text(), index),
        None => FlatParagraph::normal(block.id, block.text(), index),
    }
}
