use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::document::DocumentAst;
use crate::id::BlockId;

/// Character position inside a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub block: BlockId,
    pub offset: usize,
}

impl Position {
    pub fn new(block: BlockId, offset: usize) -> Self {
        Self { block, offset }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Position,
    pub focus: Position,
}

impl Selection {
    pub fn new(anchor: Position, focus: Position) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(at: Position) -> Self {
        Self::new(at, at)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_same_block(&self) -> bool {
        self.anchor.block == self.focus.block
    }

    pub fn is_cross_block(&self) -> bool {
        !self.is_same_block()
    }

    /// Start and end in document order with offsets clamped to their blocks.
    ///
    /// Returns `None` when either endpoint names a block that is not in `doc`.
    pub fn ordered(&self, doc: &DocumentAst) -> Option<(Position, Position)> {
        let anchor = clamp(doc, self.anchor)?;
        let focus = clamp(doc, self.focus)?;
        let order = match doc.compare_order(&anchor.block, &focus.block)? {
            Ordering::Equal => anchor.offset.cmp(&focus.offset),
            other => other,
        };
        if order == Ordering::Greater {
            Some((focus, anchor))
        } else {
            Some((anchor, focus))
        }
    }
}

fn clamp(doc: &DocumentAst, position: Position) -> Option<Position> {
    let block = doc.get(&position.block)?;
    Some(Position::new(
        position.block,
        position.offset.min(block.text_len()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockNode;

    #[test]
    fn reversed_cross_block_selection_is_swapped() {
        let first = BlockNode::paragraph("First");
        let second = BlockNode::paragraph("Second");
        let (a, b) = (first.id, second.id);
        let doc = DocumentAst::from_blocks([first, second]).unwrap();

        let selection = Selection::new(Position::new(b, 99), Position::new(a, 2));
        assert!(selection.is_cross_block());
        let (start, end) = selection.ordered(&doc).unwrap();
        assert_eq!(start, Position::new(a, 2));
        assert_eq!(end, Position::new(b, 6));
    }

    #[test]
    fn collapsed_selection_is_same_block() {
        let at = Position::new(BlockId::new(), 3);
        let selection = Selection::collapsed(at);
        assert!(selection.is_collapsed());
        assert!(selection.is_same_block());
        assert_eq!(selection.ordered(&DocumentAst::new()), None);
    }
}
