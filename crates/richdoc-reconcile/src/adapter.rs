//! Translate node-key addressed [`SectionDocOp`]s into engine [`DocOp`]s.
//!
//! Node keys and block ids are separate identifier spaces; a [`KeyResolver`]
//! bridges them. When the section context was produced by
//! `richdoc_outline::project`, keys are block ids and [`DirectKeys`] is enough.

use std::collections::HashMap;

use richdoc_engine::{DocOp, DocOpKind, OpSource};
use richdoc_model::BlockId;
use richdoc_outline::NodeKey;
use tracing::warn;

use crate::error::AdaptError;
use crate::ops::SectionDocOp;

pub trait KeyResolver {
    fn resolve(&self, key: &NodeKey) -> Option<BlockId>;
}

/// Keys are block ids in string form.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectKeys;

impl KeyResolver for DirectKeys {
    fn resolve(&self, key: &NodeKey) -> Option<BlockId> {
        key.as_str().parse().ok()
    }
}

impl KeyResolver for HashMap<NodeKey, BlockId> {
    fn resolve(&self, key: &NodeKey) -> Option<BlockId> {
        self.get(key).copied()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdaptedOps {
    pub ops: Vec<DocOp>,
    /// Keys the resolver could not map; their ops were dropped.
    pub unresolved: Vec<NodeKey>,
}

impl AdaptedOps {
    pub fn require_resolved(self) -> Result<Vec<DocOp>, AdaptError> {
        if self.unresolved.is_empty() {
            Ok(self.ops)
        } else {
            Err(AdaptError::UnresolvedKeys(self.unresolved))
        }
    }
}

/// Convert ops in order. Consecutive inserts after the same anchor are
/// chained so they land in ascending order.
pub fn adapt_section_ops<R>(ops: &[SectionDocOp], resolver: &R, source: OpSource) -> AdaptedOps
where
    R: KeyResolver + ?Sized,
{
    let mut adapted = AdaptedOps::default();
    let mut last_inserted: HashMap<BlockId, BlockId> = HashMap::new();

    for op in ops {
        let Some(node_id) = resolver.resolve(op.key()) else {
            warn!(key = %op.key(), index = op.index(), "dropping op with unresolved node key");
            adapted.unresolved.push(op.key().clone());
            continue;
        };

        let kind = match op {
            SectionDocOp::ReplaceParagraph {
                new_text,
                preserve_style,
                ..
            } => DocOpKind::ReplaceBlockText {
                node_id,
                text: new_text.clone(),
                preserve_style: *preserve_style,
            },
            SectionDocOp::InsertParagraphAfter { new_text, .. } => {
                let id = BlockId::new();
                let after = last_inserted.insert(node_id, id).unwrap_or(node_id);
                DocOpKind::InsertParagraph {
                    after: Some(after),
                    text: Some(new_text.clone()),
                    id: Some(id),
                }
            }
            SectionDocOp::DeleteParagraph { .. } => DocOpKind::DeleteBlock { node_id },
        };
        adapted.ops.push(DocOp::new(kind, source));
    }

    adapted
}
