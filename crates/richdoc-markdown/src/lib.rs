//! Markdown conversion for richdoc documents, built on `pulldown-cmark`.

pub mod export;
pub mod import;

use richdoc_model::{ConversionError, DocumentAst, DocumentConverter};

pub use export::render_markdown;
pub use import::parse_markdown;

#[derive(Clone, Copy, Debug, Default)]
pub struct MarkdownConverter;

impl DocumentConverter for MarkdownConverter {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn import(&self, input: &[u8]) -> Result<DocumentAst, ConversionError> {
        let text = std::str::from_utf8(input).map_err(|_| ConversionError::InvalidEncoding {
            format: self.name(),
        })?;
        parse_markdown(text).map_err(|err| ConversionError::Malformed {
            format: self.name(),
            message: err.to_string(),
        })
    }

    fn export(&self, document: &DocumentAst) -> Result<Vec<u8>, ConversionError> {
        Ok(render_markdown(document).into_bytes())
    }
}
