use regex::Regex;
use richdoc_model::DocumentAst;

use crate::context::{section_context, SectionContext};
use crate::matcher::find_headings;
use crate::outline::{build_outline, get_section_range, OutlineItem, Section};
use crate::paragraph::{project, FlatParagraph, NodeKey};

/// Anything that can present itself as a flat paragraph list.
pub trait SectionSource {
    fn paragraphs(&self) -> Vec<FlatParagraph>;

    fn outline(&self) -> Vec<OutlineItem> {
        build_outline(&self.paragraphs())
    }

    fn section(&self, heading: &NodeKey) -> Option<Section> {
        get_section_range(&self.paragraphs(), heading)
    }

    fn section_context(&self, heading: &NodeKey) -> Option<SectionContext> {
        let paragraphs = self.paragraphs();
        let section = get_section_range(&paragraphs, heading)?;
        Some(section_context(&paragraphs, &section))
    }

    /// Sections whose heading text matches `pattern`.
    fn find_sections(&self, pattern: &Regex) -> Vec<Section> {
        let paragraphs = self.paragraphs();
        find_headings(&paragraphs, pattern)
            .iter()
            .filter_map(|item| get_section_range(&paragraphs, &item.id))
            .collect()
    }
}

impl SectionSource for DocumentAst {
    fn paragraphs(&self) -> Vec<FlatParagraph> {
        project(self)
    }
}

impl SectionSource for [FlatParagraph] {
    fn paragraphs(&self) -> Vec<FlatParagraph> {
        self.to_vec()
    }
}

impl SectionSource for Vec<FlatParagraph> {
    fn paragraphs(&self) -> Vec<FlatParagraph> {
        self.clone()
    }
}
