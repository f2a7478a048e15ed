//! Serial document-level runner applying model edits section by section.
//!
//! Sections run strictly one at a time against the history's current
//! snapshot, so each section sees the edits of the ones before it.
//! Cancellation is checked before each section starts. A failing section is
//! recorded and the run moves on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use richdoc_engine::{History, OpSource};
use richdoc_outline::{NodeKey, SectionContext, SectionSource};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::adapter::{adapt_section_ops, DirectKeys};
use crate::diff::{build_section_doc_ops_diff, build_section_doc_ops_diff_from_value, DiffOptions};
use crate::error::{AdaptError, ReconcileError};
use crate::ops::DiffMode;
use crate::repair::repair;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared flag a caller flips to stop a running batch.
#[derive(Clone, Debug, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Produces raw paragraph output for one section (typically a model call).
pub trait SectionHandler {
    fn handle(&mut self, context: &SectionContext) -> Result<Value, BoxError>;
}

impl<F> SectionHandler for F
where
    F: FnMut(&SectionContext) -> Result<Value, BoxError>,
{
    fn handle(&mut self, context: &SectionContext) -> Result<Value, BoxError> {
        self(context)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BatchOptions {
    pub mode: DiffMode,
    pub strict: bool,
    /// Run the repair layer before rewrite diffs.
    pub repair: bool,
    pub source: OpSource,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            mode: DiffMode::Rewrite,
            strict: false,
            repair: true,
            source: OpSource::Ai,
        }
    }
}

#[derive(Debug, Error)]
pub enum StepError {
    #[error("no section headed by {0}")]
    SectionNotFound(NodeKey),

    #[error("section handler failed: {0}")]
    Handler(String),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Adapt(#[from] AdaptError),
}

#[derive(Debug)]
pub enum StepStatus {
    Applied {
        ops: usize,
        changed: bool,
        skipped: usize,
    },
    Failed(StepError),
    Cancelled,
}

#[derive(Debug)]
pub struct StepReport {
    pub heading: NodeKey,
    pub status: StepStatus,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub steps: Vec<StepReport>,
}

impl BatchReport {
    pub fn applied(&self) -> usize {
        self.count(|status| matches!(status, StepStatus::Applied { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, StepStatus::Failed(_)))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|status| matches!(status, StepStatus::Cancelled))
    }

    fn count(&self, predicate: impl Fn(&StepStatus) -> bool) -> usize {
        self.steps
            .iter()
            .filter(|step| predicate(&step.status))
            .count()
    }
}

/// Run `handler` over each heading's section and apply the resulting edits.
pub fn run_sections<H>(
    history: &mut History,
    headings: &[NodeKey],
    handler: &mut H,
    options: &BatchOptions,
    cancel: &CancellationFlag,
) -> BatchReport
where
    H: SectionHandler + ?Sized,
{
    let mut report = BatchReport::default();

    for (position, heading) in headings.iter().enumerate() {
        if cancel.is_cancelled() {
            info!(
                remaining = headings.len() - position,
                "batch cancelled before section {heading}"
            );
            report
                .steps
                .extend(headings[position..].iter().map(|heading| StepReport {
                    heading: heading.clone(),
                    status: StepStatus::Cancelled,
                }));
            break;
        }

        info!(section = %heading, step = position + 1, total = headings.len(), "processing section");
        let status = match run_step(history, heading, handler, options) {
            Ok(status) => status,
            Err(err) => {
                warn!(section = %heading, error = %err, "section step failed");
                StepStatus::Failed(err)
            }
        };
        report.steps.push(StepReport {
            heading: heading.clone(),
            status,
        });
    }

    info!(
        applied = report.applied(),
        failed = report.failed(),
        cancelled = report.cancelled(),
        "batch finished"
    );
    report
}

fn run_step<H>(
    history: &mut History,
    heading: &NodeKey,
    handler: &mut H,
    options: &BatchOptions,
) -> Result<StepStatus, StepError>
where
    H: SectionHandler + ?Sized,
{
    let context = history
        .current()
        .section_context(heading)
        .ok_or_else(|| StepError::SectionNotFound(heading.clone()))?;

    let raw = handler
        .handle(&context)
        .map_err(|err| StepError::Handler(err.to_string()))?;

    let diff_options = DiffOptions {
        mode: options.mode,
        strict: options.strict,
    };
    let section_ops = if options.repair && options.mode == DiffMode::Rewrite {
        let repaired = repair(&context, Some(&raw));
        build_section_doc_ops_diff(&context, &repaired, diff_options)?
    } else {
        build_section_doc_ops_diff_from_value(&context, &raw, diff_options)?
    };

    let adapted = adapt_section_ops(&section_ops, &DirectKeys, options.source);
    let ops = if options.strict {
        adapted.require_resolved()?
    } else {
        adapted.ops
    };

    let outcome = history.apply(&ops);
    Ok(StepStatus::Applied {
        ops: ops.len(),
        changed: outcome.changed,
        skipped: outcome.skipped.len(),
    })
}
