//! Normalise unreliable model output before a rewrite diff.
//!
//! The repaired array always has exactly one entry per existing paragraph,
//! ordered by index. An entry is taken from the model output when an item
//! with that `index` carries non-blank text; otherwise the old paragraph's
//! text is kept. Items past the end of the section are dropped.

use richdoc_outline::SectionContext;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::diff::{json_index, NewParagraph};

/// JSON type of the raw model output; `Undefined` means no output at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairInputType {
    Undefined,
    Null,
    Array,
    String,
    Number,
    Bool,
    Object,
}

impl RepairInputType {
    pub fn of(raw: Option<&Value>) -> Self {
        match raw {
            None => RepairInputType::Undefined,
            Some(Value::Null) => RepairInputType::Null,
            Some(Value::Array(_)) => RepairInputType::Array,
            Some(Value::String(_)) => RepairInputType::String,
            Some(Value::Number(_)) => RepairInputType::Number,
            Some(Value::Bool(_)) => RepairInputType::Bool,
            Some(Value::Object(_)) => RepairInputType::Object,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
    pub input_type: RepairInputType,
    /// Items in the raw array; zero for anything that is not an array.
    pub original_count: usize,
    pub target_count: usize,
    /// Entries taken from the model output.
    pub valid_new_count: usize,
    /// Indexes that fell back to the old paragraph text.
    pub fallback_indices: Vec<usize>,
}

pub fn repair(context: &SectionContext, raw: Option<&Value>) -> Vec<NewParagraph> {
    repair_with_details(context, raw).0
}

pub fn repair_with_details(
    context: &SectionContext,
    raw: Option<&Value>,
) -> (Vec<NewParagraph>, RepairReport) {
    let items: &[Value] = raw
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let mut repaired = Vec::with_capacity(context.len());
    let mut fallback_indices = Vec::new();

    for (index, old) in context.paragraphs.iter().enumerate() {
        match usable_text(items, index) {
            Some(text) => repaired.push(NewParagraph::new(index, text)),
            None => {
                fallback_indices.push(index);
                repaired.push(NewParagraph::new(index, old.text.clone()));
            }
        }
    }

    let report = RepairReport {
        input_type: RepairInputType::of(raw),
        original_count: items.len(),
        target_count: context.len(),
        valid_new_count: context.len() - fallback_indices.len(),
        fallback_indices,
    };
    if !report.fallback_indices.is_empty() {
        warn!(
            section = %context.section_id,
            input = ?report.input_type,
            fallbacks = ?report.fallback_indices,
            "kept original text for paragraphs missing from model output"
        );
    }
    (repaired, report)
}

/// True when `raw` is not already a clean, length-matched paragraph array.
pub fn needs_repair(context: &SectionContext, raw: Option<&Value>) -> bool {
    let Some(items) = raw.and_then(Value::as_array) else {
        return true;
    };
    if items.len() != context.len() {
        return true;
    }
    items.iter().enumerate().any(|(position, item)| {
        item.get("index").and_then(json_index) != Some(position)
            || item
                .get("text")
                .and_then(Value::as_str)
                .map_or(true, |text| text.trim().is_empty())
    })
}

fn usable_text(items: &[Value], index: usize) -> Option<String> {
    let item = items
        .iter()
        .find(|item| item.get("index").and_then(json_index) == Some(index))?;
    item.get("text")
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}
