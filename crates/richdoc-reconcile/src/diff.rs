//! Align a language-model paragraph array against a section's existing
//! paragraphs and emit the smallest ordered edit set.
//!
//! Input comes either typed (`&[NewParagraph]`) or as raw JSON, since model
//! output may not even be an array. In strict mode every shape or length
//! problem is a [`ReconcileError::Validation`]; otherwise the problem is
//! logged and the diff degrades:
//!
//! - a non-array input yields no ops;
//! - a misaligned `index` is replaced by the entry's array position;
//! - a non-string `text` leaves that paragraph untouched (or is not inserted);
//! - a length mismatch diffs over the common prefix.

use richdoc_outline::{ContextParagraph, SectionContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{ReconcileError, ReconcileResult};
use crate::intent::IntentKind;
use crate::ops::{sort_for_application, DiffMode, SectionDocOp};

/// One paragraph of model output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewParagraph {
    pub index: usize,
    pub text: String,
}

impl NewParagraph {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// Number a list of texts from zero.
    pub fn from_texts<I, S>(texts: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Self::new(index, text))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiffOptions {
    pub mode: DiffMode,
    pub strict: bool,
}

impl DiffOptions {
    pub fn new(mode: DiffMode) -> Self {
        Self { mode, strict: false }
    }

    pub fn strict(mode: DiffMode) -> Self {
        Self { mode, strict: true }
    }
}

/// Texts compare equal when they match after trimming outer whitespace.
pub fn is_unchanged(old: &str, new: &str) -> bool {
    old.trim() == new.trim()
}

pub fn build_section_doc_ops_diff(
    context: &SectionContext,
    new_paragraphs: &[NewParagraph],
    options: DiffOptions,
) -> ReconcileResult<Vec<SectionDocOp>> {
    if context.is_empty() {
        return Ok(nothing_to_anchor(context, new_paragraphs.len()));
    }
    let validator = Validator::new(context, new_paragraphs.len(), options);
    let mut entries = Vec::with_capacity(new_paragraphs.len());
    for (position, paragraph) in new_paragraphs.iter().enumerate() {
        if paragraph.index != position {
            validator.degrade(format!(
                "entry {position} has index {}, expected {position}",
                paragraph.index
            ))?;
        }
        entries.push(Some(paragraph.text.as_str()));
    }
    build(context, &entries, &validator)
}

/// Like [`build_section_doc_ops_diff`] but over unvalidated JSON.
pub fn build_section_doc_ops_diff_from_value(
    context: &SectionContext,
    raw: &Value,
    options: DiffOptions,
) -> ReconcileResult<Vec<SectionDocOp>> {
    if context.is_empty() {
        let new_len = raw.as_array().map_or(0, Vec::len);
        return Ok(nothing_to_anchor(context, new_len));
    }
    let Some(items) = raw.as_array() else {
        let validator = Validator::new(context, 0, options);
        validator.degrade("new paragraphs must be an array".to_string())?;
        return Ok(Vec::new());
    };

    let validator = Validator::new(context, items.len(), options);
    let mut entries = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        match item.get("index").and_then(json_index) {
            Some(index) if index == position => {}
            other => validator.degrade(format!(
                "entry {position} has index {}, expected {position}",
                other.map_or_else(|| "<missing>".to_string(), |i| i.to_string())
            ))?,
        }
        let text = item.get("text").and_then(Value::as_str);
        if text.is_none() {
            validator.degrade(format!("entry {position} has no string text"))?;
        }
        entries.push(text);
    }
    build(context, &entries, &validator)
}

/// Map an intent to its diff mode and diff non-strictly.
pub fn build_section_doc_ops_diff_from_intent(
    context: &SectionContext,
    new_paragraphs: &[NewParagraph],
    intent: IntentKind,
) -> ReconcileResult<Vec<SectionDocOp>> {
    build_section_doc_ops_diff(context, new_paragraphs, DiffOptions::new(intent.diff_mode()))
}

/// JSON index as an integer position; `1.0` counts as `1`.
pub(crate) fn json_index(value: &Value) -> Option<usize> {
    if let Some(index) = value.as_u64() {
        return usize::try_from(index).ok();
    }
    value
        .as_f64()
        .filter(|f| f.fract() == 0.0 && *f >= 0.0)
        .map(|f| f as usize)
}

struct Validator<'a> {
    context: &'a SectionContext,
    new_len: usize,
    options: DiffOptions,
}

impl<'a> Validator<'a> {
    fn new(context: &'a SectionContext, new_len: usize, options: DiffOptions) -> Self {
        Self {
            context,
            new_len,
            options,
        }
    }

    fn error(&self, reason: String) -> ReconcileError {
        ReconcileError::Validation {
            section_id: self.context.section_id.clone(),
            old_len: self.context.len(),
            new_len: self.new_len,
            mode: self.options.mode,
            reason,
        }
    }

    /// Fail in strict mode, warn otherwise.
    fn degrade(&self, reason: String) -> ReconcileResult<()> {
        if self.options.strict {
            return Err(self.error(reason));
        }
        warn!(
            section = %self.context.section_id,
            mode = %self.options.mode,
            old_len = self.context.len(),
            new_len = self.new_len,
            "{reason}"
        );
        Ok(())
    }
}

fn build(
    context: &SectionContext,
    entries: &[Option<&str>],
    validator: &Validator<'_>,
) -> ReconcileResult<Vec<SectionDocOp>> {
    let old = &context.paragraphs;
    let (old_len, new_len) = (old.len(), entries.len());
    if old_len == 0 {
        return Ok(nothing_to_anchor(context, new_len));
    }

    let mode = validator.options.mode;
    match mode {
        DiffMode::Rewrite if old_len != new_len => {
            validator.degrade(format!(
                "rewrite needs {old_len} paragraphs, got {new_len}"
            ))?;
        }
        DiffMode::Summarize if new_len > old_len => {
            validator.degrade(format!(
                "summary has {new_len} paragraphs, more than the original {old_len}"
            ))?;
        }
        _ => {}
    }

    let mut ops = Vec::new();
    let replace_upto = match mode {
        DiffMode::Expand => old_len,
        DiffMode::Rewrite | DiffMode::Summarize => old_len.min(new_len),
    };
    for (index, previous) in old.iter().enumerate().take(replace_upto) {
        match entries.get(index) {
            Some(Some(text)) => {
                if let Some(op) = replace_if_changed(previous, text, index) {
                    ops.push(op);
                }
            }
            Some(None) => {}
            None => warn!(
                section = %context.section_id,
                index,
                "no new paragraph for existing paragraph; keeping it"
            ),
        }
    }

    if mode == DiffMode::Summarize {
        for (index, previous) in old.iter().enumerate().skip(new_len) {
            ops.push(SectionDocOp::DeleteParagraph {
                target_key: previous.node_key.clone(),
                index,
            });
        }
    }

    if mode == DiffMode::Expand {
        let anchor = &old[old_len - 1].node_key;
        for (index, entry) in entries.iter().enumerate().skip(old_len) {
            match entry {
                Some(text) => ops.push(SectionDocOp::InsertParagraphAfter {
                    reference_key: anchor.clone(),
                    new_text: (*text).to_string(),
                    index,
                }),
                None => warn!(
                    section = %context.section_id,
                    index,
                    "skipping insert without text"
                ),
            }
        }
    }

    sort_for_application(&mut ops);
    Ok(ops)
}

/// A section without paragraphs has nothing to replace or anchor on.
fn nothing_to_anchor(context: &SectionContext, new_len: usize) -> Vec<SectionDocOp> {
    if new_len > 0 {
        warn!(
            section = %context.section_id,
            new_len,
            "section has no paragraphs to anchor new content; nothing to do"
        );
    }
    Vec::new()
}

fn replace_if_changed(previous: &ContextParagraph, text: &str, index: usize) -> Option<SectionDocOp> {
    if is_unchanged(&previous.text, text) {
        return None;
    }
    Some(SectionDocOp::ReplaceParagraph {
        target_key: previous.node_key.clone(),
        new_text: text.to_string(),
        preserve_style: true,
        index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn context(texts: &[&str]) -> SectionContext {
        SectionContext::from_texts("sec", texts.iter().copied())
    }

    #[test]
    fn whitespace_only_differences_are_unchanged() {
        let ctx = context(&["  same text "]);
        let ops = build_section_doc_ops_diff(
            &ctx,
            &NewParagraph::from_texts(["same text"]),
            DiffOptions::new(DiffMode::Rewrite),
        )
        .unwrap();
        assert!(ops.is_empty());
    }

    #[test]
    fn internal_whitespace_counts_as_change() {
        let ctx = context(&["a b"]);
        let ops = build_section_doc_ops_diff(
            &ctx,
            &NewParagraph::from_texts(["a  b"]),
            DiffOptions::new(DiffMode::Rewrite),
        )
        .unwrap();
        assert_eq!(ops.len(), 1);
    }

    #[test]
    fn strict_rewrite_rejects_length_mismatch() {
        let ctx = context(&["a", "b"]);
        let err = build_section_doc_ops_diff(
            &ctx,
            &NewParagraph::from_texts(["x"]),
            DiffOptions::strict(DiffMode::Rewrite),
        )
        .unwrap_err();
        match err {
            ReconcileError::Validation {
                section_id,
                old_len,
                new_len,
                mode,
                ..
            } => {
                assert_eq!(section_id, "sec");
                assert_eq!((old_len, new_len), (2, 1));
                assert_eq!(mode, DiffMode::Rewrite);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn lenient_rewrite_diffs_common_prefix() {
        let ctx = context(&["a", "b"]);
        let ops = build_section_doc_ops_diff(
            &ctx,
            &NewParagraph::from_texts(["x"]),
            DiffOptions::new(DiffMode::Rewrite),
        )
        .unwrap();
        assert_eq!(ops.len(), 1);
        assert!(ops[0].is_replace());
    }

    #[test]
    fn strict_summary_rejects_growth() {
        let ctx = context(&["a"]);
        let result = build_section_doc_ops_diff(
            &ctx,
            &NewParagraph::from_texts(["x", "y"]),
            DiffOptions::strict(DiffMode::Summarize),
        );
        assert!(result.is_err());
    }

    #[test]
    fn non_array_json_is_rejected_or_ignored() {
        let ctx = context(&["a"]);
        let raw = json!({ "index": 0, "text": "x" });
        assert!(build_section_doc_ops_diff_from_value(&ctx, &raw, DiffOptions::strict(DiffMode::Rewrite)).is_err());
        let ops =
            build_section_doc_ops_diff_from_value(&ctx, &raw, DiffOptions::new(DiffMode::Rewrite))
                .unwrap();
        assert!(ops.is_empty());
    }

    #[test]
    fn misaligned_index_falls_back_to_position() {
        let ctx = context(&["a", "b"]);
        let raw = json!([{ "index": 5, "text": "a" }, { "index": 0, "text": "B" }]);
        let ops =
            build_section_doc_ops_diff_from_value(&ctx, &raw, DiffOptions::new(DiffMode::Rewrite))
                .unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].index(), 1);

        let strict =
            build_section_doc_ops_diff_from_value(&ctx, &raw, DiffOptions::strict(DiffMode::Rewrite));
        assert!(strict.is_err());
    }

    #[test]
    fn non_string_text_keeps_paragraph() {
        let ctx = context(&["a", "b"]);
        let raw = json!([{ "index": 0, "text": 42 }, { "index": 1, "text": "B" }]);
        let ops =
            build_section_doc_ops_diff_from_value(&ctx, &raw, DiffOptions::new(DiffMode::Rewrite))
                .unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].index(), 1);
    }

    #[test]
    fn float_indexes_are_accepted() {
        let ctx = context(&["a"]);
        let raw = json!([{ "index": 0.0, "text": "a" }]);
        let ops = build_section_doc_ops_diff_from_value(
            &ctx,
            &raw,
            DiffOptions::strict(DiffMode::Rewrite),
        )
        .unwrap();
        assert!(ops.is_empty());
    }

    #[test]
    fn empty_section_yields_nothing() {
        let ctx = context(&[]);
        for mode in [DiffMode::Rewrite, DiffMode::Summarize, DiffMode::Expand] {
            let none = build_section_doc_ops_diff(&ctx, &[], DiffOptions::strict(mode)).unwrap();
            assert!(none.is_empty());
            let some = build_section_doc_ops_diff(
                &ctx,
                &NewParagraph::from_texts(["new"]),
                DiffOptions::new(mode),
            )
            .unwrap();
            assert!(some.is_empty());
        }
    }

    #[test]
    fn expand_with_fewer_entries_keeps_unmatched_paragraphs() {
        let ctx = context(&["a", "b", "c"]);
        let ops = build_section_doc_ops_diff(
            &ctx,
            &NewParagraph::from_texts(["A"]),
            DiffOptions::new(DiffMode::Expand),
        )
        .unwrap();
        assert_eq!(ops.len(), 1);
        assert!(ops[0].is_replace());
    }
}
