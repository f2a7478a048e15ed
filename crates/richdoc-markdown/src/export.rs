//! [`DocumentAst`] → CommonMark.
//!
//! Underline has no markdown syntax and is written as `<u>…</u>`. Placeholder
//! blocks are skipped. Adjacent lists of the same kind are kept apart with an
//! empty HTML comment so they do not merge when read back.

use richdoc_model::{BlockBody, DocumentAst, InlineNode, ListItem, Mark, TextRun};

pub fn render_markdown(document: &DocumentAst) -> String {
    let mut chunks: Vec<String> = Vec::new();
    let mut previous_list: Option<bool> = None;

    for block in document.blocks() {
        match &block.body {
            BlockBody::Paragraph { children } => {
                chunks.push(escape_block_start(render_inline(children, "\\\n")));
                previous_list = None;
            }
            BlockBody::Heading { level, children } => {
                let text = escape_block_start(render_inline(children, " "));
                let marker = "#".repeat(usize::from(*level));
                chunks.push(format!("{marker} {text}").trim_end().to_string());
                previous_list = None;
            }
            BlockBody::List { ordered, items } => {
                if items.is_empty() {
                    continue;
                }
                if previous_list == Some(*ordered) {
                    chunks.push("<!-- -->".to_string());
                }
                chunks.push(render_list(*ordered, items));
                previous_list = Some(*ordered);
            }
            BlockBody::Placeholder => {}
        }
    }

    if chunks.is_empty() {
        return String::new();
    }
    let mut out = chunks.join("\n\n");
    out.push('\n');
    out
}

fn render_list(ordered: bool, items: &[ListItem]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let marker = if ordered {
                format!("{}.", index + 1)
            } else {
                "-".to_string()
            };
            let indent = " ".repeat(marker.len() + 1);
            let text = escape_block_start(render_inline(&item.children, &format!("\\\n{indent}")));
            if text.is_empty() {
                marker
            } else {
                format!("{marker} {text}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Trailing breaks cannot be expressed and are dropped.
fn render_inline(nodes: &[InlineNode], line_break: &str) -> String {
    let end = nodes
        .iter()
        .rposition(|node| !matches!(node, InlineNode::LineBreak))
        .map_or(0, |last| last + 1);
    let mut out = String::new();
    write_inline(&nodes[..end], line_break, &mut out);
    out
}

fn write_inline(nodes: &[InlineNode], line_break: &str, out: &mut String) {
    for node in nodes {
        match node {
            InlineNode::Text(run) => write_run(run, out),
            InlineNode::LineBreak => out.push_str(line_break),
            InlineNode::Link { href, children } => {
                out.push('[');
                write_inline(children, line_break, out);
                out.push_str("](");
                write_destination(href, out);
                out.push(')');
            }
        }
    }
}

fn write_run(run: &TextRun, out: &mut String) {
    if run.text.is_empty() {
        return;
    }
    let body = if run.marks.contains(Mark::Code) {
        code_span(&run.text)
    } else {
        escape_text(&run.text)
    };

    let delimiters: Vec<&str> = [
        (Mark::Underline, "<u>"),
        (Mark::Strikethrough, "~~"),
        (Mark::Bold, "**"),
        (Mark::Italic, "*"),
    ]
    .into_iter()
    .filter(|(mark, _)| run.marks.contains(*mark))
    .map(|(_, delimiter)| delimiter)
    .collect();

    if delimiters.is_empty() {
        out.push_str(&body);
        return;
    }

    // Emphasis delimiters must hug non-whitespace.
    let core = body.trim();
    if core.is_empty() {
        out.push_str(&body);
        return;
    }
    let leading = &body[..body.len() - body.trim_start().len()];
    let trailing = &body[body.trim_end().len()..];

    out.push_str(leading);
    for delimiter in &delimiters {
        out.push_str(delimiter);
    }
    out.push_str(core);
    for delimiter in delimiters.iter().rev() {
        out.push_str(if *delimiter == "<u>" { "</u>" } else { delimiter });
    }
    out.push_str(trailing);
}

fn code_span(text: &str) -> String {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    let fence = "`".repeat(longest + 1);
    if text.starts_with('`') || text.ends_with('`') {
        format!("{fence} {text} {fence}")
    } else {
        format!("{fence}{text}{fence}")
    }
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' | '`' | '*' | '_' | '[' | ']' | '<' | '>' | '~' | '&' => {
                out.push('\\');
                out.push(ch);
            }
            '\n' => out.push(' '),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape text that would otherwise open a heading, list or block quote.
fn escape_block_start(text: String) -> String {
    if text.starts_with(&['#', '-', '+', '='][..]) {
        return format!("\\{text}");
    }
    let digits = text.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 && text[digits..].starts_with(&['.', ')'][..]) {
        return format!("{}\\{}", &text[..digits], &text[digits..]);
    }
    text
}

fn write_destination(href: &str, out: &mut String) {
    if href.contains(&[' ', '(', ')', '<', '>'][..]) {
        out.push('<');
        out.push_str(&href.replace('<', "%3C").replace('>', "%3E"));
        out.push('>');
    } else {
        out.push_str(href);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use richdoc_model::{BlockNode, MarkSet};

    #[test]
    fn marks_hug_text_and_nest() {
        let run = TextRun::marked(" loud ", MarkSet::EMPTY.with(Mark::Bold).with(Mark::Underline));
        let mut out = String::new();
        write_run(&run, &mut out);
        assert_eq!(out, " <u>**loud**</u> ");
    }

    #[test]
    fn code_span_grows_fence_around_backticks() {
        assert_eq!(code_span("a`b"), "``a`b``");
        assert_eq!(code_span("`x"), "`` `x ``");
    }

    #[test]
    fn block_start_markers_are_escaped() {
        assert_eq!(escape_block_start("# not a heading".into()), "\\# not a heading");
        assert_eq!(escape_block_start("1. not a list".into()), "1\\. not a list");
        assert_eq!(escape_block_start("plain".into()), "plain");
    }

    #[test]
    fn renders_blocks_separated_by_blank_lines() {
        let document = DocumentAst::from_blocks([
            BlockNode::heading(2, "Title"),
            BlockNode::paragraph("a_b * c"),
            BlockNode::list(true, ["one", "two"]),
            BlockNode::list(true, ["three"]),
            BlockNode::placeholder(),
        ])
        .unwrap();
        assert_eq!(
            render_markdown(&document),
            "## Title\n\na\\_b \\* c\n\n1. one\n2. two\n\n<!-- -->\n\n1. three\n"
        );
    }

    #[test]
    fn line_breaks_are_indented_inside_list_items() {
        let item = ListItem {
            children: vec![
                InlineNode::plain("first"),
                InlineNode::LineBreak,
                InlineNode::plain("second"),
                InlineNode::LineBreak,
            ],
        };
        assert_eq!(render_list(false, &[item]), "- first\\\n  second");
    }
}
