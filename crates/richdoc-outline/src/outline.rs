use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::paragraph::{FlatParagraph, NodeKey};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineItem {
    pub id: NodeKey,
    pub level: u8,
    pub text: String,
    pub index: usize,
    /// Position of the enclosing heading within the outline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
}

/// A heading plus the content that belongs to it.
///
/// `end_index` is inclusive: it is the index just before the next heading of
/// equal or higher rank, or the last index of the document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: OutlineItem,
    pub start_index: usize,
    pub end_index: usize,
    /// Keys of the content paragraphs, heading excluded.
    pub paragraph_ids: Vec<NodeKey>,
}

impl Section {
    pub fn content_range(&self) -> std::ops::RangeInclusive<usize> {
        self.start_index + 1..=self.end_index
    }

    pub fn is_empty(&self) -> bool {
        self.paragraph_ids.is_empty()
    }
}

/// Collect every heading in document order, linking each to its parent.
pub fn build_outline(paragraphs: &[FlatParagraph]) -> Vec<OutlineItem> {
    let mut items: Vec<OutlineItem> = Vec::new();
    let mut stack: Vec<usize> = Vec::new();

    for paragraph in paragraphs {
        let Some(level) = paragraph.heading_level() else {
            continue;
        };
        while let Some(&last) = stack.last() {
            if items[last].level < level {
                break;
            }
            stack.pop();
        }

        items.push(OutlineItem {
            id: paragraph.key.clone(),
            level,
            text: paragraph.text.clone(),
            index: paragraph.index,
            parent: stack.last().copied(),
        });
        stack.push(items.len() - 1);
    }

    items
}

/// Resolve the section headed by `heading_id`.
///
/// Returns `None` when the key is unknown or does not name a heading.
pub fn get_section_range(paragraphs: &[FlatParagraph], heading_id: &NodeKey) -> Option<Section> {
    let start = paragraphs.iter().position(|p| &p.key == heading_id)?;
    let level = paragraphs[start].heading_level()?;
    let mut heading = build_outline(paragraphs)
        .into_iter()
        .find(|item| &item.id == heading_id)?;
    heading.index = start;

    let end = paragraphs[start + 1..]
        .iter()
        .position(|p| p.heading_level().is_some_and(|other| other <= level))
        .map(|offset| start + offset)
        .unwrap_or(paragraphs.len() - 1);

    let paragraph_ids = paragraphs[start + 1..=end]
        .iter()
        .map(|p| p.key.clone())
        .collect();

    Some(Section {
        heading,
        start_index: start,
        end_index: end,
        paragraph_ids,
    })
}

/// Replace a section's content, keeping its heading.
///
/// Indexes of the new content and of every trailing paragraph are reassigned
/// to their new positions.
pub fn replace_section_content(
    paragraphs: &[FlatParagraph],
    section: &Section,
    new_paragraphs: Vec<FlatParagraph>,
) -> Vec<FlatParagraph> {
    let start = section.start_index.min(paragraphs.len());
    let end = section.end_index.min(paragraphs.len().saturating_sub(1));
    let head_end = (start + 1).min(paragraphs.len());
    let tail_start = (end + 1).max(head_end);

    debug!(
        heading = %section.heading.id,
        removed = tail_start - head_end,
        inserted = new_paragraphs.len(),
        "replacing section content"
    );

    let mut out: Vec<FlatParagraph> = paragraphs[..head_end].to_vec();
    out.extend(new_paragraphs);
    out.extend(paragraphs[tail_start..].iter().cloned());
    for (index, paragraph) in out.iter_mut().enumerate() {
        paragraph.index = index;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<FlatParagraph> {
        vec![
            FlatParagraph::heading("h1", 1, "Intro", 0),
            FlatParagraph::normal("p1", "one", 1),
            FlatParagraph::heading("h2", 2, "Detail", 2),
            FlatParagraph::normal("p2", "two", 3),
            FlatParagraph::heading("h3", 1, "Next", 4),
            FlatParagraph::normal("p3", "three", 5),
        ]
    }

    #[test]
    fn outline_tracks_parents() {
        let outline = build_outline(&sample());
        let shape: Vec<(&str, u8, Option<usize>)> = outline
            .iter()
            .map(|item| (item.id.as_str(), item.level, item.parent))
            .collect();
        assert_eq!(
            shape,
            vec![("h1", 1, None), ("h2", 2, Some(0)), ("h3", 1, None)]
        );
    }

    #[test]
    fn section_stops_before_equal_level_heading() {
        let section = get_section_range(&sample(), &"h1".into()).unwrap();
        assert_eq!(section.start_index, 0);
        assert_eq!(section.end_index, 3);
        assert_eq!(
            section.paragraph_ids,
            vec![NodeKey::from("p1"), "h2".into(), "p2".into()]
        );
    }

    #[test]
    fn subsection_stops_at_higher_heading() {
        let section = get_section_range(&sample(), &"h2".into()).unwrap();
        assert_eq!((section.start_index, section.end_index), (2, 3));
    }

    #[test]
    fn last_section_runs_to_end() {
        let section = get_section_range(&sample(), &"h3".into()).unwrap();
        assert_eq!(section.end_index, 5);
    }

    #[test]
    fn heading_without_content_has_empty_section() {
        let paragraphs = vec![
            FlatParagraph::heading("a", 2, "A", 0),
            FlatParagraph::heading("b", 2, "B", 1),
        ];
        let section = get_section_range(&paragraphs, &"a".into()).unwrap();
        assert_eq!(section.end_index, 0);
        assert!(section.is_empty());
    }

    #[test]
    fn non_heading_or_unknown_key_is_none() {
        assert_eq!(get_section_range(&sample(), &"p1".into()), None);
        assert_eq!(get_section_range(&sample(), &"missing".into()), None);
    }

    #[test]
    fn replace_reindexes_trailing_paragraphs() {
        let paragraphs = sample();
        let section = get_section_range(&paragraphs, &"h2".into()).unwrap();
        let replaced = replace_section_content(
            &paragraphs,
            &section,
            vec![
                FlatParagraph::normal("n1", "new one", 99),
                FlatParagraph::normal("n2", "new two", 99),
            ],
        );
        let keys: Vec<(&str, usize)> = replaced
            .iter()
            .map(|p| (p.key.as_str(), p.index))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("h1", 0),
                ("p1", 1),
                ("h2", 2),
                ("n1", 3),
                ("n2", 4),
                ("h3", 5),
                ("p3", 6),
            ]
        );
    }
}
