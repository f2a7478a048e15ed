//! Seam for moving documents in and out of external formats.

use crate::document::DocumentAst;
use crate::error::ConversionError;

/// Bidirectional converter between a byte format and [`DocumentAst`].
pub trait DocumentConverter {
    /// Short format name used in error messages.
    fn name(&self) -> &'static str;

    fn import(&self, input: &[u8]) -> Result<DocumentAst, ConversionError>;

    fn export(&self, document: &DocumentAst) -> Result<Vec<u8>, ConversionError>;
}

/// Native JSON form of a document.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonConverter {
    pub pretty: bool,
}

impl JsonConverter {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl DocumentConverter for JsonConverter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn import(&self, input: &[u8]) -> Result<DocumentAst, ConversionError> {
        let text = std::str::from_utf8(input).map_err(|_| ConversionError::InvalidEncoding {
            format: self.name(),
        })?;
        serde_json::from_str(text).map_err(|err| ConversionError::Malformed {
            format: self.name(),
            message: err.to_string(),
        })
    }

    fn export(&self, document: &DocumentAst) -> Result<Vec<u8>, ConversionError> {
        let result = if self.pretty {
            serde_json::to_vec_pretty(document)
        } else {
            serde_json::to_vec(document)
        };
        result.map_err(|err| ConversionError::Malformed {
            format: self.name(),
            message: err.to_string(),
        })
    }
}
