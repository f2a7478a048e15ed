use regex::{Regex, RegexBuilder};

use crate::outline::{build_outline, OutlineItem};
use crate::paragraph::FlatParagraph;

/// Compile a heading pattern: case-insensitive unless asked otherwise.
pub fn build_heading_regex(pattern: &str, case_sensitive: bool) -> Result<Regex, regex::Error> {
    let mut builder = RegexBuilder::new(pattern);
    builder.case_insensitive(!case_sensitive);
    builder.size_limit(1024 * 100);
    builder.build()
}

/// Headings whose text matches `pattern`, in document order.
pub fn find_headings(paragraphs: &[FlatParagraph], pattern: &Regex) -> Vec<OutlineItem> {
    build_outline(paragraphs)
        .into_iter()
        .filter(|item| pattern.is_match(item.text.trim()))
        .collect()
}
