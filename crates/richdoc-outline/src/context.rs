use serde::{Deserialize, Serialize};

use crate::outline::Section;
use crate::paragraph::{FlatParagraph, NodeKey};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextParagraph {
    pub node_key: NodeKey,
    pub text: String,
    /// Location of the paragraph in the source document; here its index.
    #[serde(default)]
    pub path: Vec<usize>,
}

/// The existing content of one section, as seen by the diff reconciler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionContext {
    pub section_id: String,
    #[serde(default)]
    pub paragraphs: Vec<ContextParagraph>,
}

impl SectionContext {
    pub fn new(section_id: impl Into<String>, paragraphs: Vec<ContextParagraph>) -> Self {
        Self {
            section_id: section_id.into(),
            paragraphs,
        }
    }

    /// Build a context from bare texts, keyed `p0`, `p1`, ...
    pub fn from_texts<I, S>(section_id: impl Into<String>, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let paragraphs = texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| ContextParagraph {
                node_key: NodeKey::new(format!("p{index}")),
                text: text.into(),
                path: vec![index],
            })
            .collect();
        Self::new(section_id, paragraphs)
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.paragraphs.iter().map(|p| p.text.as_str())
    }
}

/// Content paragraphs of `section`, subheadings included.
pub fn section_context(paragraphs: &[FlatParagraph], section: &Section) -> SectionContext {
    let content = paragraphs
        .iter()
        .skip(section.start_index + 1)
        .take(section.end_index.saturating_sub(section.start_index))
        .map(|p| ContextParagraph {
            node_key: p.key.clone(),
            text: p.text.clone(),
            path: vec![p.index],
        })
        .collect();
    SectionContext::new(section.heading.id.to_string(), content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::get_section_range;
    use pretty_assertions::assert_eq;

    #[test]
    fn context_covers_section_content_only() {
        let paragraphs = vec![
            FlatParagraph::heading("h", 1, "Intro", 0),
            FlatParagraph::normal("a", "first", 1),
            FlatParagraph::normal("b", "second", 2),
            FlatParagraph::heading("n", 1, "Next", 3),
        ];
        let section = get_section_range(&paragraphs, &"h".into()).unwrap();
        let context = section_context(&paragraphs, &section);

        assert_eq!(context.section_id, "h");
        assert_eq!(context.texts().collect::<Vec<_>>(), vec!["first", "second"]);
        assert_eq!(context.paragraphs[1].path, vec![2]);
    }

    #[test]
    fn loads_from_json_without_paths() {
        let json = serde_json::json!({
            "section_id": "s",
            "paragraphs": [{ "node_key": "k", "text": "x" }]
        });
        let context: SectionContext = serde_json::from_value(json).unwrap();
        assert_eq!(context.paragraphs[0].node_key, NodeKey::new("k"));
        assert!(context.paragraphs[0].path.is_empty());
    }
}
