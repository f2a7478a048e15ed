use pretty_assertions::assert_eq;
use richdoc_outline::{NodeKey, SectionContext};
use richdoc_reconcile::{
    build_section_doc_ops_diff, build_section_doc_ops_diff_from_intent,
    build_section_doc_ops_diff_from_value, repair, DiffMode, DiffOptions, IntentKind,
    NewParagraph, ReconcileError, SectionDocOp,
};
use serde_json::json;

fn context(texts: &[&str]) -> SectionContext {
    SectionContext::from_texts("section-1", texts.iter().copied())
}

fn diff(old: &[&str], new: &[&str], mode: DiffMode) -> Vec<SectionDocOp> {
    build_section_doc_ops_diff(
        &context(old),
        &NewParagraph::from_texts(new.iter().copied()),
        DiffOptions::strict(mode),
    )
    .unwrap()
}

#[test]
fn identical_rewrite_produces_no_ops() {
    let ops = diff(&["第一段", "第二段"], &["第一段", "第二段"], DiffMode::Rewrite);
    assert!(ops.is_empty());
}

#[test]
fn summary_replaces_head_and_deletes_back_to_front() {
    let ops = diff(&["第一段", "第二段", "第三段"], &["总结内容"], DiffMode::Summarize);
    assert_eq!(
        ops,
        vec![
            SectionDocOp::ReplaceParagraph {
                target_key: NodeKey::new("p0"),
                new_text: "总结内容".into(),
                preserve_style: true,
                index: 0,
            },
            SectionDocOp::DeleteParagraph {
                target_key: NodeKey::new("p2"),
                index: 2,
            },
            SectionDocOp::DeleteParagraph {
                target_key: NodeKey::new("p1"),
                index: 1,
            },
        ]
    );
}

#[test]
fn expansion_inserts_after_last_old_paragraph() {
    let ops = diff(&["第一段"], &["新第一段", "新增段落"], DiffMode::Expand);
    assert_eq!(
        ops,
        vec![
            SectionDocOp::ReplaceParagraph {
                target_key: NodeKey::new("p0"),
                new_text: "新第一段".into(),
                preserve_style: true,
                index: 0,
            },
            SectionDocOp::InsertParagraphAfter {
                reference_key: NodeKey::new("p0"),
                new_text: "新增段落".into(),
                index: 1,
            },
        ]
    );
}

#[test]
fn rewrite_never_inserts_or_deletes() {
    let old = ["a", "b", "c", "d"];
    let cases: [[&str; 4]; 3] = [
        ["a", "b", "c", "d"],
        ["A", "b", "C", "d"],
        ["w", "x", "y", "z"],
    ];
    for new in cases {
        let ops = diff(&old, &new, DiffMode::Rewrite);
        assert!(ops.len() <= old.len());
        assert!(ops.iter().all(SectionDocOp::is_replace));
    }
}

#[test]
fn summary_delete_count_and_order() {
    let old = ["1", "2", "3", "4", "5"];
    for keep in 0..=old.len() {
        let new: Vec<&str> = old[..keep].to_vec();
        let ops = diff(&old, &new, DiffMode::Summarize);
        let deletes: Vec<usize> = ops
            .iter()
            .filter(|op| op.is_delete())
            .map(SectionDocOp::index)
            .collect();
        assert_eq!(deletes.len(), old.len() - keep);
        assert!(deletes.windows(2).all(|pair| pair[0] > pair[1]));
    }
}

#[test]
fn expansion_insert_count_and_anchor() {
    let old = ["a", "b"];
    let new = ["a", "b", "c", "d", "e"];
    let ops = diff(&old, &new, DiffMode::Expand);
    let inserts: Vec<&SectionDocOp> = ops.iter().filter(|op| op.is_insert()).collect();
    assert_eq!(inserts.len(), 3);
    assert!(inserts.windows(2).all(|pair| pair[0].index() < pair[1].index()));
    assert!(inserts.iter().all(|op| op.key() == &NodeKey::new("p1")));
}

#[test]
fn rerunning_against_updated_section_is_idempotent() {
    let new = ["rewritten one", "two", "rewritten three"];
    let ops = diff(&["one", "two", "three"], &new, DiffMode::Rewrite);
    assert_eq!(ops.len(), 2);

    let again = diff(&new, &new, DiffMode::Rewrite);
    assert!(again.is_empty());
}

#[test]
fn strict_mode_rejects_non_string_text() {
    let ctx = context(&["第一段", "第二段"]);
    let raw = json!([{ "index": 0, "text": 42 }, { "index": 1, "text": "新第二段" }]);

    let err = build_section_doc_ops_diff_from_value(&ctx, &raw, DiffOptions::strict(DiffMode::Rewrite))
        .unwrap_err();
    match err {
        ReconcileError::Validation { reason, mode, .. } => {
            assert_eq!(mode, DiffMode::Rewrite);
            assert_eq!(reason, "entry 0 has no string text");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn intent_wrapper_selects_mode() {
    let ops = build_section_doc_ops_diff_from_intent(
        &context(&["a", "b"]),
        &NewParagraph::from_texts(["short"]),
        IntentKind::SummarizeSection,
    )
    .unwrap();
    assert_eq!(ops.iter().filter(|op| op.is_delete()).count(), 1);
}

#[test]
fn repair_output_always_matches_section_length() {
    let ctx = context(&["a", "b", "c"]);
    let inputs = [
        None,
        Some(json!(null)),
        Some(json!("a string")),
        Some(json!(12)),
        Some(json!([{ "index": 0, "text": "A" }, { "index": 1, "text": "B" }, { "index": 2, "text": "C" }])),
        Some(json!([
            { "index": 0, "text": "A" }, { "index": 1, "text": "B" },
            { "index": 2, "text": "C" }, { "index": 3, "text": "D" }
        ])),
        Some(json!([1, true, null])),
    ];
    for raw in inputs {
        let repaired = repair(&ctx, raw.as_ref());
        assert_eq!(repaired.len(), 3);
        assert_eq!(
            repaired.iter().map(|p| p.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        let ops = build_section_doc_ops_diff(&ctx, &repaired, DiffOptions::strict(DiffMode::Rewrite));
        assert!(ops.is_ok());
    }
}
