use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;
use crate::ops::DiffMode;

/// Section-level intents a caller may request from the language model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    RewriteSection,
    PolishSection,
    TranslateSection,
    SummarizeSection,
    ExpandSection,
}

impl IntentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IntentKind::RewriteSection => "rewrite_section",
            IntentKind::PolishSection => "polish_section",
            IntentKind::TranslateSection => "translate_section",
            IntentKind::SummarizeSection => "summarize_section",
            IntentKind::ExpandSection => "expand_section",
        }
    }

    /// Paragraph-count contract the intent implies.
    pub fn diff_mode(self) -> DiffMode {
        match self {
            IntentKind::RewriteSection | IntentKind::PolishSection | IntentKind::TranslateSection => {
                DiffMode::Rewrite
            }
            IntentKind::SummarizeSection => DiffMode::Summarize,
            IntentKind::ExpandSection => DiffMode::Expand,
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentKind {
    type Err = ReconcileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "rewrite_section" => Ok(IntentKind::RewriteSection),
            "polish_section" => Ok(IntentKind::PolishSection),
            "translate_section" => Ok(IntentKind::TranslateSection),
            "summarize_section" => Ok(IntentKind::SummarizeSection),
            "expand_section" => Ok(IntentKind::ExpandSection),
            _ => Err(ReconcileError::UnknownIntent(value.to_string())),
        }
    }
}
