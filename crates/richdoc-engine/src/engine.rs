use std::sync::Arc;

use richdoc_model::{
    BlockBody, BlockId, BlockNode, DocumentAst, InlineNode, ListItem, MarkSet, ModelError, OpId,
    Position, Selection, MAX_HEADING_LEVEL,
};
use tracing::{debug, warn};

use crate::error::OpFailure;
use crate::inline::{self, Piece};
use crate::ops::{BlockType, DocOp, DocOpKind};

/// Operation that was skipped while applying a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedOp {
    /// Position of the operation inside the batch.
    pub index: usize,
    pub op_id: OpId,
    pub op: &'static str,
    pub reason: OpFailure,
}

#[derive(Clone, Debug)]
pub struct ApplyOutcome {
    pub next: Arc<DocumentAst>,
    pub changed: bool,
    pub skipped: Vec<SkippedOp>,
}

/// Apply `ops` in order to a snapshot, returning the next snapshot.
///
/// The input is never mutated. When the batch leaves the document unchanged
/// the returned snapshot is the same `Arc` as the input and `changed` is
/// false. Otherwise the version is bumped exactly once. An operation that
/// names a missing block, or a block it cannot edit, is skipped and logged.
pub fn apply_ops(ast: &Arc<DocumentAst>, ops: &[DocOp]) -> ApplyOutcome {
    let mut next = DocumentAst::clone(ast);
    let mut skipped = Vec::new();

    for (index, op) in ops.iter().enumerate() {
        if let Err(reason) = apply_op(&mut next, &op.kind) {
            warn!(
                op = op.kind.name(),
                op_id = %op.meta.op_id,
                index,
                error = %reason,
                "skipping operation"
            );
            skipped.push(SkippedOp {
                index,
                op_id: op.meta.op_id,
                op: op.kind.name(),
                reason,
            });
        }
    }

    let changed = next != **ast;
    debug!(
        ops = ops.len(),
        skipped = skipped.len(),
        changed,
        version = ast.version(),
        "applied operation batch"
    );

    if !changed {
        return ApplyOutcome {
            next: Arc::clone(ast),
            changed,
            skipped,
        };
    }

    next.bump_version();
    ApplyOutcome {
        next: Arc::new(next),
        changed,
        skipped,
    }
}

fn apply_op(doc: &mut DocumentAst, op: &DocOpKind) -> Result<(), OpFailure> {
    match op {
        DocOpKind::InsertText {
            node_id,
            offset,
            text,
        } => {
            if text.is_empty() {
                return Ok(());
            }
            edit_pieces(doc, node_id, |pieces| {
                inline::insert_text(pieces, *offset, text)
            })
        }
        DocOpKind::DeleteRange {
            start_node_id,
            start_offset,
            end_node_id,
            end_offset,
        } => delete_range(
            doc,
            Position::new(*start_node_id, *start_offset),
            Position::new(*end_node_id, *end_offset),
        ),
        DocOpKind::InsertParagraph { after, text, id } => {
            let id = id.unwrap_or_default();
            let children = text
                .as_deref()
                .map(|text| inline::rebuild(inline::text_pieces(text, MarkSet::EMPTY, None)))
                .unwrap_or_default();
            let block = BlockNode::paragraph("").with_id(id).with_children(children);
            insert_block(doc, after.as_ref(), block)
        }
        DocOpKind::SplitBlock {
            node_id,
            offset,
            new_block_id,
        } => split_block(doc, node_id, *offset, new_block_id.unwrap_or_default()),
        DocOpKind::InsertLineBreak { node_id, offset } => edit_pieces(doc, node_id, |pieces| {
            inline::insert_text(pieces, *offset, "\n")
        }),
        DocOpKind::ToggleMark {
            node_id,
            start_offset,
            end_offset,
            mark,
            force,
        } => {
            let (start, end) = if start_offset <= end_offset {
                (*start_offset, *end_offset)
            } else {
                (*end_offset, *start_offset)
            };
            edit_pieces(doc, node_id, |pieces| {
                let len = inline::total_len(&pieces);
                let (start, end) = (start.min(len), end.min(len));
                if start == end {
                    return pieces;
                }
                inline::toggle_mark(pieces, start, end, *mark, *force)
            })
        }
        DocOpKind::SetBlockType {
            node_id,
            block_type,
        } => set_block_type(doc, node_id, *block_type),
        DocOpKind::ReplaceBlockText {
            node_id,
            text,
            preserve_style,
        } => replace_block_text(doc, node_id, text, *preserve_style),
        DocOpKind::DeleteBlock { node_id } => doc
            .remove(node_id)
            .map(|_| ())
            .ok_or(OpFailure::BlockNotFound(*node_id)),
    }
}

fn text_children<'a>(
    doc: &'a mut DocumentAst,
    id: &BlockId,
) -> Result<&'a mut Vec<InlineNode>, OpFailure> {
    let block = doc.get_mut(id).ok_or(OpFailure::BlockNotFound(*id))?;
    let kind = block.kind();
    block
        .children_mut()
        .ok_or(OpFailure::UnsupportedBlock { id: *id, kind })
}

fn edit_pieces<F>(doc: &mut DocumentAst, id: &BlockId, edit: F) -> Result<(), OpFailure>
where
    F: FnOnce(Vec<Piece>) -> Vec<Piece>,
{
    let children = text_children(doc, id)?;
    let pieces = edit(inline::flatten(children));
    *children = inline::rebuild(pieces);
    Ok(())
}

fn require_text_block(doc: &DocumentAst, id: &BlockId) -> Result<(), OpFailure> {
    let block = doc.get(id).ok_or(OpFailure::BlockNotFound(*id))?;
    if block.is_text_block() {
        Ok(())
    } else {
        Err(OpFailure::UnsupportedBlock {
            id: *id,
            kind: block.kind(),
        })
    }
}

fn insert_block(
    doc: &mut DocumentAst,
    after: Option<&BlockId>,
    block: BlockNode,
) -> Result<(), OpFailure> {
    let id = block.id;
    doc.insert_after(after, block)
        .map(|_| ())
        .map_err(|err| match err {
            ModelError::BlockNotFound(anchor) => OpFailure::BlockNotFound(anchor),
            _ => OpFailure::DuplicateBlock(id),
        })
}

fn delete_range(doc: &mut DocumentAst, start: Position, end: Position) -> Result<(), OpFailure> {
    require_text_block(doc, &start.block)?;
    require_text_block(doc, &end.block)?;
    let (start, end) = Selection::new(start, end)
        .ordered(doc)
        .ok_or(OpFailure::BlockNotFound(start.block))?;

    if start.block == end.block {
        return edit_pieces(doc, &start.block, |pieces| {
            inline::delete_range(pieces, start.offset, end.offset)
        });
    }

    let tail = match doc.get(&end.block).and_then(BlockNode::children) {
        Some(children) => inline::split_at(inline::flatten(children), end.offset).1,
        None => return Err(OpFailure::BlockNotFound(end.block)),
    };

    let (first, last) = match (doc.index_of(&start.block), doc.index_of(&end.block)) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(OpFailure::BlockNotFound(end.block)),
    };
    let doomed: Vec<BlockId> = doc.block_ids()[first + 1..=last].to_vec();
    for id in &doomed {
        doc.remove(id);
    }

    edit_pieces(doc, &start.block, |pieces| {
        let (mut head, _) = inline::split_at(pieces, start.offset);
        head.extend(tail);
        head
    })
}

fn split_block(
    doc: &mut DocumentAst,
    id: &BlockId,
    offset: usize,
    new_id: BlockId,
) -> Result<(), OpFailure> {
    if doc.is_taken(&new_id) {
        return Err(OpFailure::DuplicateBlock(new_id));
    }
    let original = doc.get(id).ok_or(OpFailure::BlockNotFound(*id))?.clone();
    let children = original.children().ok_or(OpFailure::UnsupportedBlock {
        id: *id,
        kind: original.kind(),
    })?;

    let (head, tail) = inline::split_at(inline::flatten(children), offset);
    let successor = original
        .clone()
        .with_id(new_id)
        .with_children(inline::rebuild(tail));
    *text_children(doc, id)? = inline::rebuild(head);
    insert_block(doc, Some(id), successor)
}

fn set_block_type(
    doc: &mut DocumentAst,
    id: &BlockId,
    block_type: BlockType,
) -> Result<(), OpFailure> {
    let children = text_children(doc, id)?;
    let children = std::mem::take(children);
    let body = match block_type {
        BlockType::Paragraph => BlockBody::Paragraph { children },
        BlockType::Heading { level } => BlockBody::Heading {
            level: level.clamp(1, MAX_HEADING_LEVEL),
            children,
        },
    };
    if let Some(block) = doc.get_mut(id) {
        block.body = body;
    }
    Ok(())
}

fn replace_block_text(
    doc: &mut DocumentAst,
    id: &BlockId,
    text: &str,
    preserve_style: bool,
) -> Result<(), OpFailure> {
    let block = doc.get_mut(id).ok_or(OpFailure::BlockNotFound(*id))?;
    if let BlockBody::Placeholder = block.body {
        block.body = BlockBody::Paragraph {
            children: Vec::new(),
        };
    }
    match &mut block.body {
        BlockBody::Paragraph { children } | BlockBody::Heading { children, .. } => {
            let marks = if preserve_style {
                inline::leading_marks(&inline::flatten(children))
            } else {
                MarkSet::EMPTY
            };
            *children = inline::rebuild(inline::text_pieces(text, marks, None));
        }
        BlockBody::List { items, .. } => {
            *items = text.lines().map(ListItem::plain).collect();
        }
        BlockBody::Placeholder => {}
    }
    Ok(())
}
