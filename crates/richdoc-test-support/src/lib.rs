//! Shared test harness utilities for richdoc crates.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use richdoc_config::Config;
use richdoc_model::{BlockNode, DocumentAst};
use richdoc_outline::SectionContext;

/// Markdown fixture with two top-level sections and a nested one.
pub const SAMPLE_MARKDOWN: &str = "\
# Overview

The editor keeps documents as blocks.

Each block has a stable id.

## Details

Undo restores whole snapshots.

# Usage

Run the outline command first.
";

/// Returns a baseline configuration for tests.
pub fn test_config() -> Config {
    Config::builtin(".")
}

/// Block-level equivalent of [`SAMPLE_MARKDOWN`].
pub fn sample_document() -> DocumentAst {
    DocumentAst::from_blocks([
        BlockNode::heading(1, "Overview"),
        BlockNode::paragraph("The editor keeps documents as blocks."),
        BlockNode::paragraph("Each block has a stable id."),
        BlockNode::heading(2, "Details"),
        BlockNode::paragraph("Undo restores whole snapshots."),
        BlockNode::heading(1, "Usage"),
        BlockNode::paragraph("Run the outline command first."),
    ])
    .unwrap_or_default()
}

pub fn section_context<I, S>(texts: I) -> SectionContext
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    SectionContext::from_texts("section-1", texts)
}

/// Serialise `document` as JSON into `dir/name` and return the path.
pub fn write_document(dir: &Path, name: &str, document: &DocumentAst) -> io::Result<PathBuf> {
    let path = dir.join(name);
    let json = serde_json::to_vec_pretty(document)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    fs::write(&path, json)?;
    Ok(path)
}
