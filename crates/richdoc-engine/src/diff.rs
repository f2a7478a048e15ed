use richdoc_model::DocumentAst;
use similar::TextDiff;

pub fn build_unified_diff(original: &str, modified: &str, path: &str) -> Option<String> {
    if original == modified {
        return None;
    }

    let diff = TextDiff::from_lines(original, modified);
    let header_old = format!("a/{path}");
    let header_new = format!("b/{path}");

    Some(
        diff.unified_diff()
            .header(&header_old, &header_new)
            .to_string(),
    )
}

/// Line diff of two snapshots' plain text, one line per block.
pub fn preview_diff(before: &DocumentAst, after: &DocumentAst, path: &str) -> Option<String> {
    let mut original = before.text();
    let mut modified = after.text();
    original.push('\n');
    modified.push('\n');
    build_unified_diff(&original, &modified, path)
}
