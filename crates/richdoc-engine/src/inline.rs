//! Character-offset editing over a block's inline content.
//!
//! Inline trees are flattened into a list of pieces, each a run of text or a
//! line break tagged with the link it sits in. Edits split and splice pieces;
//! `rebuild` merges neighbours with identical marks and link, drops empty
//! text, and regroups linked pieces into `Link` nodes. Link identity is the
//! href alone, so two adjacent links with the same href come out of any edit
//! as a single `Link`.

use richdoc_model::{InlineNode, Mark, MarkSet, TextRun};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Piece {
    Text {
        text: String,
        marks: MarkSet,
        href: Option<String>,
    },
    Break {
        href: Option<String>,
    },
}

impl Piece {
    fn len(&self) -> usize {
        match self {
            Piece::Text { text, .. } => text.chars().count(),
            Piece::Break { .. } => 1,
        }
    }

    fn href(&self) -> Option<&str> {
        match self {
            Piece::Text { href, .. } | Piece::Break { href } => href.as_deref(),
        }
    }
}

pub(crate) fn flatten(nodes: &[InlineNode]) -> Vec<Piece> {
    let mut pieces = Vec::new();
    flatten_into(nodes, None, &mut pieces);
    pieces
}

fn flatten_into(nodes: &[InlineNode], href: Option<&str>, out: &mut Vec<Piece>) {
    for node in nodes {
        match node {
            InlineNode::Text(run) => out.push(Piece::Text {
                text: run.text.clone(),
                marks: run.marks,
                href: href.map(str::to_string),
            }),
            InlineNode::LineBreak => out.push(Piece::Break {
                href: href.map(str::to_string),
            }),
            InlineNode::Link { href, children } => flatten_into(children, Some(href), out),
        }
    }
}

pub(crate) fn total_len(pieces: &[Piece]) -> usize {
    pieces.iter().map(Piece::len).sum()
}

/// Normalise pieces and convert them back into inline nodes.
pub(crate) fn rebuild(pieces: Vec<Piece>) -> Vec<InlineNode> {
    let mut merged: Vec<Piece> = Vec::with_capacity(pieces.len());
    for piece in pieces {
        if let Piece::Text { text, .. } = &piece {
            if text.is_empty() {
                continue;
            }
        }
        if let (
            Some(Piece::Text {
                text: prev,
                marks: prev_marks,
                href: prev_href,
            }),
            Piece::Text { text, marks, href },
        ) = (merged.last_mut(), &piece)
        {
            if prev_marks == marks && prev_href == href {
                prev.push_str(text);
                continue;
            }
        }
        merged.push(piece);
    }

    let mut nodes = Vec::new();
    let mut link: Option<(String, Vec<InlineNode>)> = None;
    for piece in merged {
        let href = piece.href().map(str::to_string);
        let node = match piece {
            Piece::Text { text, marks, .. } => InlineNode::Text(TextRun::marked(text, marks)),
            Piece::Break { .. } => InlineNode::LineBreak,
        };
        let same_link = matches!((&link, &href), (Some((open, _)), Some(h)) if open == h);
        if !same_link {
            if let Some((open, children)) = link.take() {
                nodes.push(InlineNode::Link {
                    href: open,
                    children,
                });
            }
        }
        match href {
            Some(h) => link.get_or_insert_with(|| (h, Vec::new())).1.push(node),
            None => nodes.push(node),
        }
    }
    if let Some((href, children)) = link {
        nodes.push(InlineNode::Link { href, children });
    }
    nodes
}

/// Split at a character offset (clamped), returning `(before, after)`.
pub(crate) fn split_at(pieces: Vec<Piece>, offset: usize) -> (Vec<Piece>, Vec<Piece>) {
    let mut before = Vec::new();
    let mut after = Vec::new();
    let mut pos = 0;
    for piece in pieces {
        let len = piece.len();
        if pos + len <= offset {
            before.push(piece);
        } else if pos >= offset {
            after.push(piece);
        } else if let Piece::Text { text, marks, href } = piece {
            let cut = byte_index(&text, offset - pos);
            let (head, tail) = text.split_at(cut);
            before.push(Piece::Text {
                text: head.to_string(),
                marks,
                href: href.clone(),
            });
            after.push(Piece::Text {
                text: tail.to_string(),
                marks,
                href,
            });
        }
        pos += len;
    }
    (before, after)
}

fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

/// Pieces for inserted text: `\n` becomes a line break.
pub(crate) fn text_pieces(text: &str, marks: MarkSet, href: Option<String>) -> Vec<Piece> {
    let mut pieces = Vec::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            pieces.push(Piece::Break { href: href.clone() });
        }
        pieces.push(Piece::Text {
            text: line.to_string(),
            marks,
            href: href.clone(),
        });
    }
    pieces
}

/// Marks and link an insertion at `offset` inherits.
///
/// Strictly inside a text piece the piece's style carries over. At a piece
/// boundary the insertion is unmarked and only stays inside a link when both
/// neighbours belong to it.
fn inherited_style(pieces: &[Piece], offset: usize) -> (MarkSet, Option<String>) {
    let mut pos = 0;
    let mut left: Option<&Piece> = None;
    let mut right: Option<&Piece> = None;
    for piece in pieces {
        let len = piece.len();
        if pos < offset && offset < pos + len {
            if let Piece::Text { marks, href, .. } = piece {
                return (*marks, href.clone());
            }
        }
        if pos + len == offset {
            left = Some(piece);
        }
        if pos == offset && right.is_none() {
            right = Some(piece);
        }
        pos += len;
    }
    let href = match (left.and_then(Piece::href), right.and_then(Piece::href)) {
        (Some(a), Some(b)) if a == b => Some(a.to_string()),
        _ => None,
    };
    (MarkSet::EMPTY, href)
}

pub(crate) fn insert_text(pieces: Vec<Piece>, offset: usize, text: &str) -> Vec<Piece> {
    let offset = offset.min(total_len(&pieces));
    let (marks, href) = inherited_style(&pieces, offset);
    let (mut out, after) = split_at(pieces, offset);
    out.extend(text_pieces(text, marks, href));
    out.extend(after);
    out
}

pub(crate) fn delete_range(pieces: Vec<Piece>, start: usize, end: usize) -> Vec<Piece> {
    let (mut out, rest) = split_at(pieces, start);
    let (_, tail) = split_at(rest, end.saturating_sub(start));
    out.extend(tail);
    out
}

/// Set or clear `mark` over `[start, end)`.
///
/// Without `force`, the mark is cleared only when every text character in the
/// range already carries it. Line breaks do not take part in the check.
pub(crate) fn toggle_mark(
    pieces: Vec<Piece>,
    start: usize,
    end: usize,
    mark: Mark,
    force: Option<bool>,
) -> Vec<Piece> {
    let (mut out, rest) = split_at(pieces, start);
    let (middle, tail) = split_at(rest, end.saturating_sub(start));
    let enable = force.unwrap_or_else(|| {
        !middle.iter().all(|piece| match piece {
            Piece::Text { marks, .. } => marks.contains(mark),
            Piece::Break { .. } => true,
        })
    });
    out.extend(middle.into_iter().map(|piece| match piece {
        Piece::Text { text, marks, href } => Piece::Text {
            text,
            marks: marks.set(mark, enable),
            href,
        },
        other => other,
    }));
    out.extend(tail);
    out
}

/// Marks of the first text piece, used when restyling replaced text.
pub(crate) fn leading_marks(pieces: &[Piece]) -> MarkSet {
    pieces
        .iter()
        .find_map(|piece| match piece {
            Piece::Text { text, marks, .. } if !text.is_empty() => Some(*marks),
            _ => None,
        })
        .unwrap_or(MarkSet::EMPTY)
}
