//! Reconcile language-model paragraph output into document edits.
//!
//! The pipeline for one section is: repair (rewrite mode) → diff against the
//! section's current paragraphs → adapt node keys to block ids → apply through
//! the engine. [`run_sections`] drives that pipeline across a document.

pub mod adapter;
pub mod batch;
pub mod diff;
pub mod error;
pub mod intent;
pub mod ops;
pub mod repair;

pub use adapter::{adapt_section_ops, AdaptedOps, DirectKeys, KeyResolver};
pub use batch::{
    run_sections, BatchOptions, BatchReport, BoxError, CancellationFlag, SectionHandler,
    StepError, StepReport, StepStatus,
};
pub use diff::{
    build_section_doc_ops_diff, build_section_doc_ops_diff_from_intent,
    build_section_doc_ops_diff_from_value, is_unchanged, DiffOptions, NewParagraph,
};
pub use error::{AdaptError, ReconcileError, ReconcileResult};
pub use intent::IntentKind;
pub use ops::{sort_for_application, DiffMode, SectionDocOp};
pub use repair::{needs_repair, repair, repair_with_details, RepairInputType, RepairReport};
