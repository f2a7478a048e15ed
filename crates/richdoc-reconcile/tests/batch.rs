use pretty_assertions::assert_eq;
use richdoc_engine::{apply_ops, History, OpSource};
use richdoc_model::{BlockNode, DocumentAst};
use richdoc_outline::{NodeKey, SectionContext, SectionSource};
use richdoc_reconcile::{
    adapt_section_ops, build_section_doc_ops_diff, run_sections, BatchOptions, BoxError,
    CancellationFlag, DiffMode, DiffOptions, DirectKeys, NewParagraph, StepError, StepStatus,
};
use serde_json::{json, Value};

fn document() -> DocumentAst {
    DocumentAst::from_blocks([
        BlockNode::heading(1, "One"),
        BlockNode::paragraph("alpha"),
        BlockNode::paragraph("beta"),
        BlockNode::heading(1, "Two"),
        BlockNode::paragraph("gamma"),
    ])
    .unwrap()
}

fn heading_keys(doc: &DocumentAst) -> Vec<NodeKey> {
    doc.outline().into_iter().map(|item| item.id).collect()
}

fn uppercase(context: &SectionContext) -> Result<Value, BoxError> {
    let items: Vec<Value> = context
        .paragraphs
        .iter()
        .enumerate()
        .map(|(index, p)| json!({ "index": index, "text": p.text.to_uppercase() }))
        .collect();
    Ok(Value::Array(items))
}

#[test]
fn diff_adapt_apply_round_trip() {
    let doc = std::sync::Arc::new(document());
    let heading = heading_keys(&doc)[0].clone();
    let context = doc.section_context(&heading).unwrap();

    let section_ops = build_section_doc_ops_diff(
        &context,
        &NewParagraph::from_texts(["alpha", "BETA", "extra"]),
        DiffOptions::new(DiffMode::Expand),
    )
    .unwrap();
    let adapted = adapt_section_ops(&section_ops, &DirectKeys, OpSource::Ai);
    assert!(adapted.unresolved.is_empty());

    let outcome = apply_ops(&doc, &adapted.ops);
    assert_eq!(outcome.next.text(), "One\nalpha\nBETA\nextra\nTwo\ngamma");

    let refreshed = outcome.next.section_context(&heading).unwrap();
    let again = build_section_doc_ops_diff(
        &refreshed,
        &NewParagraph::from_texts(["alpha", "BETA", "extra"]),
        DiffOptions::new(DiffMode::Expand),
    )
    .unwrap();
    assert!(again.is_empty());
}

#[test]
fn batch_applies_each_section_and_records_history() {
    let doc = document();
    let headings = heading_keys(&doc);
    let mut history = History::new(doc);

    let mut handler = uppercase;
    let report = run_sections(
        &mut history,
        &headings,
        &mut handler,
        &BatchOptions::default(),
        &CancellationFlag::new(),
    );

    assert_eq!(report.applied(), 2);
    assert_eq!(history.undo_levels(), 2);
    assert_eq!(history.current().text(), "One\nALPHA\nBETA\nTwo\nGAMMA");
}

#[test]
fn failing_section_does_not_stop_the_batch() {
    let doc = document();
    let mut headings = heading_keys(&doc);
    headings.insert(0, NodeKey::new("missing"));
    let mut history = History::new(doc);

    let mut calls = 0;
    let mut handler = |context: &SectionContext| -> Result<Value, BoxError> {
        calls += 1;
        if context.paragraphs[0].text == "alpha" {
            return Err("model timed out".into());
        }
        uppercase(context)
    };
    let report = run_sections(
        &mut history,
        &headings,
        &mut handler,
        &BatchOptions::default(),
        &CancellationFlag::new(),
    );

    assert_eq!(calls, 2);
    assert!(matches!(
        report.steps[0].status,
        StepStatus::Failed(StepError::SectionNotFound(_))
    ));
    assert!(matches!(
        report.steps[1].status,
        StepStatus::Failed(StepError::Handler(_))
    ));
    assert_eq!(report.applied(), 1);
    assert_eq!(history.current().text(), "One\nalpha\nbeta\nTwo\nGAMMA");
}

#[test]
fn cancellation_is_checked_before_each_section() {
    let doc = document();
    let headings = heading_keys(&doc);
    let mut history = History::new(doc);
    let cancel = CancellationFlag::new();

    let flag = cancel.clone();
    let mut handler = move |context: &SectionContext| -> Result<Value, BoxError> {
        flag.cancel();
        uppercase(context)
    };
    let report = run_sections(
        &mut history,
        &headings,
        &mut handler,
        &BatchOptions::default(),
        &cancel,
    );

    assert_eq!(report.applied(), 1);
    assert_eq!(report.cancelled(), 1);
    assert_eq!(history.current().text(), "One\nALPHA\nBETA\nTwo\ngamma");
}

#[test]
fn strict_batch_reports_validation_failure() {
    let doc = document();
    let headings = heading_keys(&doc);
    let mut history = History::new(doc);

    let mut handler =
        |_: &SectionContext| -> Result<Value, BoxError> { Ok(json!([{ "index": 0, "text": "x" }])) };
    let options = BatchOptions {
        mode: DiffMode::Rewrite,
        strict: true,
        repair: false,
        source: OpSource::Ai,
    };
    let report = run_sections(
        &mut history,
        &headings[..1],
        &mut handler,
        &options,
        &CancellationFlag::new(),
    );

    assert!(matches!(
        report.steps[0].status,
        StepStatus::Failed(StepError::Reconcile(_))
    ));
    assert!(!history.can_undo());
}
