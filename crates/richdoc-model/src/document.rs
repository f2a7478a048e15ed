//! Arena-backed document snapshot.
//!
//! Blocks live in an id-indexed map; document order is an explicit vector of
//! ids. Lookups by id are O(1); positional queries walk the order vector.
//! Snapshots are plain values: the engine clones, mutates the clone, and hands
//! back a new snapshot, so nothing here needs interior mutability.
//!
//! Removed block ids are kept in a retired set and can never be inserted
//! again, in this snapshot or any snapshot derived from it.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::block::{BlockBody, BlockNode, MAX_HEADING_LEVEL};
use crate::error::ModelError;
use crate::id::BlockId;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DocumentRepr", into = "DocumentRepr")]
pub struct DocumentAst {
    version: u64,
    order: Vec<BlockId>,
    blocks: HashMap<BlockId, BlockNode>,
    retired: HashSet<BlockId>,
    metadata: DocumentMetadata,
}

impl DocumentAst {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a version-0 document from blocks in order.
    pub fn from_blocks<I>(blocks: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = BlockNode>,
    {
        let mut document = Self::new();
        for block in blocks {
            validate_block(&block)?;
            let index = document.len();
            document.insert_at(index, block)?;
        }
        Ok(document)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn bump_version(&mut self) {
        self.version += 1;
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut DocumentMetadata {
        &mut self.metadata
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn block_ids(&self) -> &[BlockId] {
        &self.order
    }

    /// Blocks in document order.
    pub fn blocks(&self) -> impl Iterator<Item = &BlockNode> + '_ {
        self.order.iter().filter_map(|id| self.blocks.get(id))
    }

    pub fn contains(&self, id: &BlockId) -> bool {
        self.blocks.contains_key(id)
    }

    /// Whether `id` was ever used by this document, live or removed.
    pub fn is_taken(&self, id: &BlockId) -> bool {
        self.blocks.contains_key(id) || self.retired.contains(id)
    }

    pub fn get(&self, id: &BlockId) -> Option<&BlockNode> {
        self.blocks.get(id)
    }

    pub fn get_mut(&mut self, id: &BlockId) -> Option<&mut BlockNode> {
        self.blocks.get_mut(id)
    }

    pub fn block_at(&self, index: usize) -> Option<&BlockNode> {
        self.order.get(index).and_then(|id| self.blocks.get(id))
    }

    pub fn index_of(&self, id: &BlockId) -> Option<usize> {
        if !self.blocks.contains_key(id) {
            return None;
        }
        self.order.iter().position(|candidate| candidate == id)
    }

    /// Relative document order of two blocks, `None` if either is missing.
    pub fn compare_order(&self, a: &BlockId, b: &BlockId) -> Option<Ordering> {
        Some(self.index_of(a)?.cmp(&self.index_of(b)?))
    }

    /// Insert `block` at `index` (clamped to the document length).
    pub fn insert_at(&mut self, index: usize, block: BlockNode) -> Result<usize, ModelError> {
        if self.is_taken(&block.id) {
            return Err(ModelError::DuplicateBlock(block.id));
        }
        let index = index.min(self.order.len());
        self.order.insert(index, block.id);
        self.blocks.insert(block.id, block);
        Ok(index)
    }

    /// Insert after `after`, or at the head when `after` is `None`.
    pub fn insert_after(
        &mut self,
        after: Option<&BlockId>,
        block: BlockNode,
    ) -> Result<usize, ModelError> {
        let index = match after {
            None => 0,
            Some(anchor) => {
                self.index_of(anchor)
                    .ok_or(ModelError::BlockNotFound(*anchor))?
                    + 1
            }
        };
        self.insert_at(index, block)
    }

    pub fn remove(&mut self, id: &BlockId) -> Option<BlockNode> {
        let removed = self.blocks.remove(id)?;
        self.order.retain(|candidate| candidate != id);
        self.retired.insert(*id);
        Some(removed)
    }

    /// Plain text of the whole document, one line per block.
    pub fn text(&self) -> String {
        self.blocks()
            .map(BlockNode::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn validate_block(block: &BlockNode) -> Result<(), ModelError> {
    if let BlockBody::Heading { level, .. } = block.body {
        if level == 0 || level > MAX_HEADING_LEVEL {
            return Err(ModelError::InvalidHeadingLevel {
                id: block.id,
                level,
            });
        }
    }
    Ok(())
}

/// Wire form: blocks as an ordered array instead of map + order vector.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct DocumentRepr {
    #[serde(default)]
    version: u64,
    #[serde(default)]
    blocks: Vec<BlockNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    retired: Vec<BlockId>,
    #[serde(default)]
    metadata: DocumentMetadata,
}

impl TryFrom<DocumentRepr> for DocumentAst {
    type Error = ModelError;

    fn try_from(repr: DocumentRepr) -> Result<Self, Self::Error> {
        let mut document = DocumentAst::from_blocks(repr.blocks)?;
        if let Some(live) = repr.retired.iter().find(|id| document.contains(*id)) {
            return Err(ModelError::DuplicateBlock(*live));
        }
        document.retired = repr.retired.into_iter().collect();
        document.version = repr.version;
        document.metadata = repr.metadata;
        Ok(document)
    }
}

impl From<DocumentAst> for DocumentRepr {
    fn from(mut document: DocumentAst) -> Self {
        let blocks = document
            .order
            .iter()
            .filter_map(|id| document.blocks.remove(id))
            .collect();
        let mut retired: Vec<BlockId> = document.retired.into_iter().collect();
        retired.sort();
        DocumentRepr {
            version: document.version,
            blocks,
            retired,
            metadata: document.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> (DocumentAst, Vec<BlockId>) {
        let blocks = vec![
            BlockNode::heading(1, "Title"),
            BlockNode::paragraph("First"),
            BlockNode::paragraph("Second"),
        ];
        let ids = blocks.iter().map(|block| block.id).collect();
        (DocumentAst::from_blocks(blocks).unwrap(), ids)
    }

    #[test]
    fn insert_after_and_remove_keep_order() {
        let (mut doc, ids) = sample();
        let extra = BlockNode::paragraph("Inserted");
        let extra_id = extra.id;

        let index = doc.insert_after(Some(&ids[1]), extra).unwrap();
        assert_eq!(index, 2);
        assert_eq!(doc.text(), "Title\nFirst\nInserted\nSecond");

        doc.remove(&ids[1]);
        assert_eq!(doc.index_of(&extra_id), Some(1));
        assert_eq!(doc.index_of(&ids[1]), None);
    }

    #[test]
    fn head_insert_when_anchor_is_none() {
        let (mut doc, _) = sample();
        doc.insert_after(None, BlockNode::paragraph("Lead")).unwrap();
        assert_eq!(doc.block_at(0).unwrap().text(), "Lead");
    }

    #[test]
    fn rejects_duplicate_ids() {
        let (mut doc, ids) = sample();
        let dup = BlockNode::paragraph("dup").with_id(ids[0]);
        assert_eq!(doc.insert_at(0, dup), Err(ModelError::DuplicateBlock(ids[0])));
    }

    #[test]
    fn removed_ids_stay_retired() {
        let (mut doc, ids) = sample();
        doc.remove(&ids[2]).unwrap();
        assert!(!doc.contains(&ids[2]));
        assert!(doc.is_taken(&ids[2]));

        let revived = BlockNode::paragraph("again").with_id(ids[2]);
        assert_eq!(doc.insert_at(1, revived), Err(ModelError::DuplicateBlock(ids[2])));

        let json = serde_json::to_string(&doc).unwrap();
        let back: DocumentAst = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
        assert!(back.is_taken(&ids[2]));
    }

    #[test]
    fn compare_order_reports_document_position() {
        let (doc, ids) = sample();
        assert_eq!(doc.compare_order(&ids[2], &ids[0]), Some(Ordering::Greater));
        assert_eq!(doc.compare_order(&ids[0], &BlockId::new()), None);
    }

    #[test]
    fn json_round_trip_preserves_order_and_version() {
        let (mut doc, _) = sample();
        doc.bump_version();
        doc.metadata_mut().title = Some("Notes".into());

        let json = serde_json::to_string(&doc).unwrap();
        let back: DocumentAst = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
        assert_eq!(back.version(), 1);
    }

    #[test]
    fn deserialising_rejects_bad_heading_level() {
        let json = serde_json::json!({
            "blocks": [{ "id": BlockId::new(), "kind": "heading", "level": 7 }]
        });
        let err = serde_json::from_value::<DocumentAst>(json).unwrap_err();
        assert!(err.to_string().contains("expected 1..=6"));
    }
}
