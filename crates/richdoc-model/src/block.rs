use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::BlockId;
use crate::inline::{inline_len, inline_text, InlineNode};

pub const MAX_HEADING_LEVEL: u8 = 6;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    #[serde(default)]
    pub children: Vec<InlineNode>,
}

impl ListItem {
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        let children = if text.is_empty() {
            Vec::new()
        } else {
            vec![InlineNode::plain(text)]
        };
        Self { children }
    }

    pub fn text(&self) -> String {
        inline_text(&self.children)
    }
}

/// Variant payload of a block, discriminated by `kind`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockBody {
    Paragraph {
        #[serde(default)]
        children: Vec<InlineNode>,
    },
    Heading {
        level: u8,
        #[serde(default)]
        children: Vec<InlineNode>,
    },
    List {
        #[serde(default)]
        ordered: bool,
        #[serde(default)]
        items: Vec<ListItem>,
    },
    Placeholder,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Paragraph,
    Heading,
    List,
    Placeholder,
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::Heading => "heading",
            BlockKind::List => "list",
            BlockKind::Placeholder => "placeholder",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockNode {
    pub id: BlockId,
    #[serde(flatten)]
    pub body: BlockBody,
}

impl BlockNode {
    pub fn new(body: BlockBody) -> Self {
        Self {
            id: BlockId::new(),
            body,
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(BlockBody::Paragraph {
            children: plain_children(text.into()),
        })
    }

    /// Heading with `level` clamped into `1..=6`.
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::new(BlockBody::Heading {
            level: level.clamp(1, MAX_HEADING_LEVEL),
            children: plain_children(text.into()),
        })
    }

    pub fn list<I, S>(ordered: bool, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(BlockBody::List {
            ordered,
            items: items.into_iter().map(ListItem::plain).collect(),
        })
    }

    pub fn placeholder() -> Self {
        Self::new(BlockBody::Placeholder)
    }

    pub fn with_id(mut self, id: BlockId) -> Self {
        self.id = id;
        self
    }

    pub fn with_children(mut self, nodes: Vec<InlineNode>) -> Self {
        if let Some(children) = self.children_mut() {
            *children = nodes;
        }
        self
    }

    pub fn kind(&self) -> BlockKind {
        match self.body {
            BlockBody::Paragraph { .. } => BlockKind::Paragraph,
            BlockBody::Heading { .. } => BlockKind::Heading,
            BlockBody::List { .. } => BlockKind::List,
            BlockBody::Placeholder => BlockKind::Placeholder,
        }
    }

    pub fn heading_level(&self) -> Option<u8> {
        match self.body {
            BlockBody::Heading { level, .. } => Some(level),
            _ => None,
        }
    }

    /// Paragraphs and headings carry addressable inline text.
    pub fn is_text_block(&self) -> bool {
        self.children().is_some()
    }

    pub fn children(&self) -> Option<&[InlineNode]> {
        match &self.body {
            BlockBody::Paragraph { children } | BlockBody::Heading { children, .. } => {
                Some(children.as_slice())
            }
            BlockBody::List { .. } | BlockBody::Placeholder => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<InlineNode>> {
        match &mut self.body {
            BlockBody::Paragraph { children } | BlockBody::Heading { children, .. } => {
                Some(children)
            }
            BlockBody::List { .. } | BlockBody::Placeholder => None,
        }
    }

    /// Plain text of the block. List items are joined with `\n`.
    pub fn text(&self) -> String {
        match &self.body {
            BlockBody::Paragraph { children } | BlockBody::Heading { children, .. } => {
                inline_text(children)
            }
            BlockBody::List { items, .. } => items
                .iter()
                .map(ListItem::text)
                .collect::<Vec<_>>()
                .join("\n"),
            BlockBody::Placeholder => String::new(),
        }
    }

    /// Offset space of the block; zero for non-text blocks.
    pub fn text_len(&self) -> usize {
        self.children().map(inline_len).unwrap_or(0)
    }
}

fn plain_children(text: String) -> Vec<InlineNode> {
    if text.is_empty() {
        Vec::new()
    } else {
        vec![InlineNode::plain(text)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_level_is_clamped() {
        assert_eq!(BlockNode::heading(9, "deep").heading_level(), Some(6));
        assert_eq!(BlockNode::heading(0, "top").heading_level(), Some(1));
    }

    #[test]
    fn list_text_joins_items() {
        let list = BlockNode::list(false, ["one", "two"]);
        assert_eq!(list.text(), "one\ntwo");
        assert_eq!(list.text_len(), 0);
        assert!(!list.is_text_block());
    }

    #[test]
    fn serialises_kind_inline_with_id() {
        let block = BlockNode::heading(2, "Intro");
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["kind"], "heading");
        assert_eq!(json["level"], 2);
        assert_eq!(json["id"], block.id.to_string());
        let back: BlockNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, block);
    }
}
