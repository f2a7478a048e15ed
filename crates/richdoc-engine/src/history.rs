//! Snapshot-based undo/redo.
//!
//! Every batch that changes the document pushes the previous snapshot onto the
//! undo stack and clears the redo stack. Batches with `changed == false` never
//! touch either stack. Snapshots are shared `Arc`s, so undoing hands back the
//! exact snapshot that was current before the batch.

use std::collections::VecDeque;
use std::sync::Arc;

use richdoc_model::DocumentAst;

use crate::engine::{apply_ops, ApplyOutcome};
use crate::ops::DocOp;

#[derive(Debug)]
pub struct History {
    current: Arc<DocumentAst>,
    undo_stack: VecDeque<Arc<DocumentAst>>,
    redo_stack: Vec<Arc<DocumentAst>>,
    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,
}

impl History {
    pub fn new(document: DocumentAst) -> Self {
        Self::with_max_levels(document, 0)
    }

    pub fn with_max_levels(document: DocumentAst, max_levels: usize) -> Self {
        Self::from_snapshot(Arc::new(document), max_levels)
    }

    pub fn from_snapshot(current: Arc<DocumentAst>, max_levels: usize) -> Self {
        Self {
            current,
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_levels,
        }
    }

    pub fn current(&self) -> &Arc<DocumentAst> {
        &self.current
    }

    /// Apply a batch to the current snapshot and record it when it changed.
    pub fn apply(&mut self, ops: &[DocOp]) -> ApplyOutcome {
        let outcome = apply_ops(&self.current, ops);
        if outcome.changed {
            self.record(Arc::clone(&outcome.next));
        }
        outcome
    }

    /// Make `next` current, pushing the previous snapshot for undo.
    pub fn record(&mut self, next: Arc<DocumentAst>) {
        let previous = std::mem::replace(&mut self.current, next);
        self.undo_stack.push_back(previous);
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.pop_front();
        }
        self.redo_stack.clear();
    }

    /// Step back one batch. Returns `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<Arc<DocumentAst>> {
        let previous = self.undo_stack.pop_back()?;
        let undone = std::mem::replace(&mut self.current, previous);
        self.redo_stack.push(undone);
        Some(Arc::clone(&self.current))
    }

    pub fn redo(&mut self) -> Option<Arc<DocumentAst>> {
        let next = self.redo_stack.pop()?;
        let redone = std::mem::replace(&mut self.current, next);
        self.undo_stack.push_back(redone);
        Some(Arc::clone(&self.current))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Drop all undo/redo history, keeping the current snapshot.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
