//! CommonMark → [`DocumentAst`].
//!
//! Headings and paragraphs map one to one. Lists become a single list block
//! whose items carry inline content; nested lists are flattened into the
//! outermost list. Code blocks import as paragraphs of code-marked text, block
//! quotes are unwrapped, and raw HTML is dropped except for `<u>`/`</u>`,
//! which toggle the underline mark.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag};
use richdoc_model::{
    BlockBody, BlockNode, DocumentAst, InlineNode, ListItem, Mark, MarkSet, ModelError, TextRun,
};
use tracing::debug;

pub fn parse_markdown(input: &str) -> Result<DocumentAst, ModelError> {
    let parser = Parser::new_ext(input, Options::ENABLE_STRIKETHROUGH);
    let mut importer = Importer::default();
    for event in parser {
        importer.event(event);
    }
    let blocks = importer.finish();

    let title = blocks
        .iter()
        .find(|block| block.heading_level() == Some(1))
        .map(BlockNode::text);
    let mut document = DocumentAst::from_blocks(blocks)?;
    document.metadata_mut().title = title;
    Ok(document)
}

enum OpenKind {
    Paragraph,
    Heading(u8),
}

struct OpenBlock {
    kind: OpenKind,
    children: Vec<InlineNode>,
}

struct OpenList {
    ordered: bool,
    items: Vec<ListItem>,
    item: Option<Vec<InlineNode>>,
}

#[derive(Default)]
struct Importer {
    blocks: Vec<BlockNode>,
    block: Option<OpenBlock>,
    list: Option<OpenList>,
    list_depth: usize,
    marks: Vec<Mark>,
    links: Vec<(String, Vec<InlineNode>)>,
    code: Option<String>,
}

impl Importer {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if let Some(code) = self.code.as_mut() {
                    code.push_str(&text);
                } else {
                    self.push_text(&text, self.current_marks());
                }
            }
            Event::Code(text) => self.push_text(&text, self.current_marks().with(Mark::Code)),
            Event::Html(html) => match html.trim() {
                "<u>" => self.marks.push(Mark::Underline),
                "</u>" => self.pop_mark(Mark::Underline),
                other => debug!(html = other, "dropping raw html"),
            },
            Event::SoftBreak => self.push_text(" ", self.current_marks()),
            Event::HardBreak => self.push_node(InlineNode::LineBreak),
            Event::FootnoteReference(name) => self.push_text(&name, self.current_marks()),
            Event::Rule => self.close_block(),
            Event::TaskListMarker(_) => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if self.list_depth > 0 {
                    self.separate_item_paragraph();
                } else {
                    self.open_block(OpenKind::Paragraph);
                }
            }
            Tag::Heading(level, _, _) => {
                if self.list_depth > 0 {
                    self.separate_item_paragraph();
                } else {
                    self.open_block(OpenKind::Heading(heading_level(level)));
                }
            }
            Tag::CodeBlock(_) => {
                self.code = Some(String::new());
                if self.list_depth > 0 {
                    self.separate_item_paragraph();
                } else {
                    self.open_block(OpenKind::Paragraph);
                }
            }
            Tag::List(start) => {
                self.list_depth += 1;
                if self.list_depth == 1 {
                    self.close_block();
                    self.list = Some(OpenList {
                        ordered: start.is_some(),
                        items: Vec::new(),
                        item: None,
                    });
                }
            }
            Tag::Item => {
                if let Some(list) = self.list.as_mut() {
                    if let Some(children) = list.item.take() {
                        list.items.push(ListItem { children });
                    }
                    list.item = Some(Vec::new());
                }
            }
            Tag::Emphasis => self.marks.push(Mark::Italic),
            Tag::Strong => self.marks.push(Mark::Bold),
            Tag::Strikethrough => self.marks.push(Mark::Strikethrough),
            Tag::Link(_, destination, _) => self.links.push((destination.to_string(), Vec::new())),
            Tag::BlockQuote
            | Tag::Image(..)
            | Tag::FootnoteDefinition(_)
            | Tag::Table(_)
            | Tag::TableHead
            | Tag::TableRow
            | Tag::TableCell => {}
        }
    }

    fn end(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph | Tag::Heading(..) => {
                if self.list_depth == 0 {
                    self.close_block();
                }
            }
            Tag::CodeBlock(_) => {
                if let Some(code) = self.code.take() {
                    self.code_text(&code);
                }
                if self.list_depth == 0 {
                    self.close_block();
                }
            }
            Tag::List(_) => {
                self.list_depth = self.list_depth.saturating_sub(1);
                if self.list_depth == 0 {
                    self.close_list();
                }
            }
            Tag::Item => {
                if let Some(list) = self.list.as_mut() {
                    if let Some(children) = list.item.take() {
                        list.items.push(ListItem { children });
                    }
                }
            }
            Tag::Emphasis => self.pop_mark(Mark::Italic),
            Tag::Strong => self.pop_mark(Mark::Bold),
            Tag::Strikethrough => self.pop_mark(Mark::Strikethrough),
            Tag::Link(..) => {
                if let Some((href, children)) = self.links.pop() {
                    self.push_node(InlineNode::Link { href, children });
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<BlockNode> {
        self.close_block();
        self.close_list();
        self.blocks
    }

    fn current_marks(&self) -> MarkSet {
        self.marks.iter().copied().collect()
    }

    fn pop_mark(&mut self, mark: Mark) {
        if let Some(position) = self.marks.iter().rposition(|open| *open == mark) {
            self.marks.remove(position);
        }
    }

    fn open_block(&mut self, kind: OpenKind) {
        self.close_block();
        self.block = Some(OpenBlock {
            kind,
            children: Vec::new(),
        });
    }

    fn close_block(&mut self) {
        let Some(open) = self.block.take() else {
            return;
        };
        let body = match open.kind {
            OpenKind::Paragraph => BlockBody::Paragraph {
                children: open.children,
            },
            OpenKind::Heading(level) => BlockBody::Heading {
                level,
                children: open.children,
            },
        };
        self.blocks.push(BlockNode::new(body));
    }

    fn close_list(&mut self) {
        let Some(mut list) = self.list.take() else {
            return;
        };
        if let Some(children) = list.item.take() {
            list.items.push(ListItem { children });
        }
        self.blocks.push(BlockNode::new(BlockBody::List {
            ordered: list.ordered,
            items: list.items,
        }));
    }

    /// Loose list items hold several paragraphs; keep them apart with a break.
    fn separate_item_paragraph(&mut self) {
        let needs_break = self
            .list
            .as_ref()
            .and_then(|list| list.item.as_ref())
            .is_some_and(|children| !children.is_empty());
        if needs_break {
            self.push_node(InlineNode::LineBreak);
        }
    }

    fn code_text(&mut self, text: &str) {
        let marks = self.current_marks().with(Mark::Code);
        let text = text.strip_suffix('\n').unwrap_or(text);
        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                self.push_node(InlineNode::LineBreak);
            }
            self.push_text(line, marks);
        }
    }

    fn target(&mut self) -> &mut Vec<InlineNode> {
        if let Some((_, children)) = self.links.last_mut() {
            return children;
        }
        if let Some(item) = self.list.as_mut().and_then(|list| list.item.as_mut()) {
            return item;
        }
        &mut self
            .block
            .get_or_insert_with(|| OpenBlock {
                kind: OpenKind::Paragraph,
                children: Vec::new(),
            })
            .children
    }

    fn push_node(&mut self, node: InlineNode) {
        self.target().push(node);
    }

    fn push_text(&mut self, text: &str, marks: MarkSet) {
        if text.is_empty() {
            return;
        }
        let target = self.target();
        if let Some(InlineNode::Text(run)) = target.last_mut() {
            if run.marks == marks {
                run.text.push_str(text);
                return;
            }
        }
        target.push(InlineNode::Text(TextRun::marked(text, marks)));
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
