//! Reading and writing document files and payloads.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use richdoc_markdown::MarkdownConverter;
use richdoc_model::{DocumentAst, DocumentConverter, JsonConverter};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{CliError, CliResult};

/// On-disk document encoding, chosen by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Markdown,
}

impl DocumentFormat {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown") => {
                DocumentFormat::Markdown
            }
            _ => DocumentFormat::Json,
        }
    }

    pub fn converter(self) -> Box<dyn DocumentConverter> {
        match self {
            DocumentFormat::Json => Box::new(JsonConverter::pretty()),
            DocumentFormat::Markdown => Box::new(MarkdownConverter),
        }
    }
}

pub fn read_document(path: &Path) -> CliResult<DocumentAst> {
    let bytes = fs::read(path).map_err(|err| CliError::io(path, err))?;
    let format = DocumentFormat::for_path(path);
    debug!(path = %path.display(), ?format, "reading document");
    format
        .converter()
        .import(&bytes)
        .map_err(|err| CliError::InvalidContent(format!("{}: {err}", path.display())))
}

pub fn encode_document(document: &DocumentAst, format: DocumentFormat) -> CliResult<Vec<u8>> {
    let mut bytes = format
        .converter()
        .export(document)
        .map_err(|err| CliError::InvalidContent(err.to_string()))?;
    if format == DocumentFormat::Json {
        bytes.push(b'\n');
    }
    Ok(bytes)
}

/// Encode `document` for `path` and replace the file atomically.
pub fn write_document(path: &Path, document: &DocumentAst, backup: bool) -> CliResult<()> {
    let bytes = encode_document(document, DocumentFormat::for_path(path))?;
    write_atomic(path, &bytes, backup)
}

/// Write through a sibling temp file, then rename over `path`. With `backup`
/// the previous contents are kept next to it as `<name>.bak`.
pub fn write_atomic(path: &Path, content: &[u8], backup: bool) -> CliResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|err| CliError::io(dir, err))?;
    tmp.write_all(content)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|err| CliError::io(tmp.path(), err))?;

    if backup && path.exists() {
        let backup_path = backup_path(path);
        fs::copy(path, &backup_path).map_err(|err| CliError::io(&backup_path, err))?;
    }

    tmp.persist(path)
        .map_err(|err| CliError::io(path, err.error))?;
    Ok(())
}

pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".bak");
    path.with_file_name(name)
}

/// Read a payload from a file, or from stdin when `path` is `-`.
pub fn read_payload(path: &Path) -> CliResult<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|err| CliError::InvalidContent(format!("failed to read stdin payload: {err}")))?;
        return Ok(buffer);
    }
    fs::read_to_string(path).map_err(|err| CliError::io(path, err))
}

pub fn read_json_payload(path: &Path) -> CliResult<serde_json::Value> {
    let raw = read_payload(path)?;
    serde_json::from_str(&raw).map_err(|err| {
        CliError::InvalidContent(format!("payload {} is not valid JSON: {err}", path.display()))
    })
}
