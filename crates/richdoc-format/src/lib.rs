//! Output renderers for richdoc commands.
//!
//! Every command result can be rendered as plain text for terminals or as a
//! pretty-printed JSON envelope `{ command, generated_at, ... }` for tools.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use richdoc_config::{Config, OutputFormat};
use richdoc_engine::SkippedOp;
use richdoc_outline::{OutlineItem, SectionContext};
use richdoc_reconcile::{DiffMode, NewParagraph, RepairReport, SectionDocOp};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to encode JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

pub type RenderResult = Result<String, RenderError>;

/// Result of applying a batch of edits to a document file.
#[derive(Clone, Copy, Debug)]
pub struct ApplySummary<'a> {
    pub ops: usize,
    pub changed: bool,
    pub version: u64,
    pub skipped: &'a [SkippedOp],
    /// Unified diff of the document text, when previewing.
    pub diff: Option<&'a str>,
    pub written: Option<&'a Path>,
}

#[derive(Serialize)]
struct Envelope<'a> {
    command: &'a str,
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    body: Value,
}

#[derive(Clone, Copy, Debug)]
pub struct Renderer {
    format: OutputFormat,
}

impl Renderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Build a renderer from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.output.format)
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn outline(&self, items: &[OutlineItem]) -> RenderResult {
        match self.format {
            OutputFormat::Json => envelope("outline", json!({ "headings": items })),
            OutputFormat::Plain => {
                if items.is_empty() {
                    return Ok("No headings found.\n".to_string());
                }
                let mut out = String::new();
                for item in items {
                    let indent = "  ".repeat(usize::from(item.level.saturating_sub(1)));
                    let marker = "#".repeat(usize::from(item.level));
                    let _ = writeln!(out, "{indent}{marker} {}", item.text);
                }
                Ok(out)
            }
        }
    }

    /// Every section matched by a heading pattern, in document order.
    pub fn sections(&self, sections: &[(OutlineItem, SectionContext)]) -> RenderResult {
        match self.format {
            OutputFormat::Json => {
                let entries: Vec<Value> = sections
                    .iter()
                    .map(|(heading, context)| json!({ "heading": heading, "context": context }))
                    .collect();
                envelope("section", json!({ "sections": entries }))
            }
            OutputFormat::Plain => {
                let rendered: Vec<String> = sections
                    .iter()
                    .map(|(heading, context)| {
                        let mut out = heading_line(heading);
                        for (index, paragraph) in context.paragraphs.iter().enumerate() {
                            let _ = writeln!(out, "[{index}] {}", paragraph.text);
                        }
                        out
                    })
                    .collect();
                Ok(rendered.join("\n"))
            }
        }
    }

    pub fn apply(&self, summary: &ApplySummary<'_>) -> RenderResult {
        match self.format {
            OutputFormat::Json => envelope("apply", apply_value(summary)),
            OutputFormat::Plain => Ok(apply_plain(summary)),
        }
    }

    /// Section ops computed by a reconcile run, with the apply result when the
    /// run went on to edit the document.
    pub fn reconcile(
        &self,
        heading: &OutlineItem,
        mode: DiffMode,
        ops: &[SectionDocOp],
        applied: Option<&ApplySummary<'_>>,
    ) -> RenderResult {
        match self.format {
            OutputFormat::Json => envelope(
                "reconcile",
                json!({
                    "heading": heading,
                    "mode": mode,
                    "ops": ops,
                    "applied": applied.map(apply_value),
                }),
            ),
            OutputFormat::Plain => {
                let mut out = heading_line(heading);
                if ops.is_empty() {
                    out.push_str("No changes.\n");
                } else {
                    let _ = writeln!(out, "{} op(s) ({mode}):", ops.len());
                    for op in ops {
                        let _ = writeln!(out, "  {}", describe_op(op));
                    }
                }
                if let Some(summary) = applied {
                    out.push_str(&apply_plain(summary));
                }
                Ok(out)
            }
        }
    }

    pub fn repair(&self, report: &RepairReport, paragraphs: &[NewParagraph]) -> RenderResult {
        match self.format {
            OutputFormat::Json => envelope(
                "repair",
                json!({ "report": report, "paragraphs": paragraphs }),
            ),
            OutputFormat::Plain => {
                let mut out = String::new();
                let _ = writeln!(
                    out,
                    "input {:?}: {} item(s), {} usable, {} expected",
                    report.input_type,
                    report.original_count,
                    report.valid_new_count,
                    report.target_count
                );
                if !report.fallback_indices.is_empty() {
                    let indices: Vec<String> = report
                        .fallback_indices
                        .iter()
                        .map(usize::to_string)
                        .collect();
                    let _ = writeln!(out, "kept original text at {}", indices.join(", "));
                }
                for paragraph in paragraphs {
                    let _ = writeln!(out, "[{}] {}", paragraph.index, paragraph.text);
                }
                Ok(out)
            }
        }
    }
}

fn envelope(command: &str, body: Value) -> RenderResult {
    let payload = Envelope {
        command,
        generated_at: Utc::now(),
        body,
    };
    let mut rendered = serde_json::to_string_pretty(&payload)?;
    rendered.push('\n');
    Ok(rendered)
}

fn heading_line(heading: &OutlineItem) -> String {
    format!("{} {}\n", "#".repeat(usize::from(heading.level)), heading.text)
}

fn describe_op(op: &SectionDocOp) -> String {
    match op {
        SectionDocOp::ReplaceParagraph {
            index, new_text, ..
        } => format!("replace [{index}] {new_text}"),
        SectionDocOp::InsertParagraphAfter {
            index, new_text, ..
        } => format!("insert  [{index}] {new_text}"),
        SectionDocOp::DeleteParagraph { index, .. } => format!("delete  [{index}]"),
    }
}

fn skipped_value(skipped: &SkippedOp) -> Value {
    json!({
        "index": skipped.index,
        "op_id": skipped.op_id.to_string(),
        "op": skipped.op,
        "reason": skipped.reason.to_string(),
    })
}

fn apply_value(summary: &ApplySummary<'_>) -> Value {
    json!({
        "ops": summary.ops,
        "changed": summary.changed,
        "version": summary.version,
        "skipped": summary.skipped.iter().map(skipped_value).collect::<Vec<_>>(),
        "diff": summary.diff,
        "written": summary.written,
    })
}

fn apply_plain(summary: &ApplySummary<'_>) -> String {
    let mut out = String::new();
    if summary.changed {
        let _ = writeln!(
            out,
            "Applied {} op(s); document is now at version {}.",
            summary.ops, summary.version
        );
    } else {
        out.push_str("Document unchanged.\n");
    }
    for skipped in summary.skipped {
        let _ = writeln!(
            out,
            "skipped op #{} ({}): {}",
            skipped.index, skipped.op, skipped.reason
        );
    }
    if let Some(diff) = summary.diff {
        out.push_str(diff);
        if !diff.ends_with('\n') {
            out.push('\n');
        }
    }
    if let Some(path) = summary.written {
        let _ = writeln!(out, "Wrote {}", path.display());
    }
    out
}
