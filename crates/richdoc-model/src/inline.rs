use serde::{Deserialize, Serialize};

use crate::marks::MarkSet;

/// Contiguous span of text carrying a uniform mark set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default, skip_serializing_if = "MarkSet::is_empty")]
    pub marks: MarkSet,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: MarkSet::EMPTY,
        }
    }

    pub fn marked(text: impl Into<String>, marks: MarkSet) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InlineNode {
    Text(TextRun),
    LineBreak,
    Link {
        href: String,
        #[serde(default)]
        children: Vec<InlineNode>,
    },
}

impl InlineNode {
    pub fn plain(text: impl Into<String>) -> Self {
        InlineNode::Text(TextRun::plain(text))
    }

    pub fn marked(text: impl Into<String>, marks: MarkSet) -> Self {
        InlineNode::Text(TextRun::marked(text, marks))
    }

    /// Length in characters; a line break counts as one.
    pub fn char_len(&self) -> usize {
        match self {
            InlineNode::Text(run) => run.char_len(),
            InlineNode::LineBreak => 1,
            InlineNode::Link { children, .. } => inline_len(children),
        }
    }

    fn write_text(&self, out: &mut String) {
        match self {
            InlineNode::Text(run) => out.push_str(&run.text),
            InlineNode::LineBreak => out.push('\n'),
            InlineNode::Link { children, .. } => {
                for child in children {
                    child.write_text(out);
                }
            }
        }
    }
}

/// Concatenated text of an inline sequence, line breaks rendered as `\n`.
pub fn inline_text(nodes: &[InlineNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.write_text(&mut out);
    }
    out
}

pub fn inline_len(nodes: &[InlineNode]) -> usize {
    nodes.iter().map(InlineNode::char_len).sum()
}
