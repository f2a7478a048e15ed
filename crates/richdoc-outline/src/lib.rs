//! Heading outline and section extraction.
//!
//! Documents are viewed as a flat list of paragraphs, one per block. Sections
//! are derived from that list on demand and never stored.

pub mod context;
pub mod matcher;
pub mod outline;
pub mod paragraph;
pub mod source;

pub use context::{section_context, ContextParagraph, SectionContext};
pub use matcher::{build_heading_regex, find_headings};
pub use outline::{build_outline, get_section_range, replace_section_content, OutlineItem, Section};
pub use paragraph::{project, FlatParagraph, NodeKey, ParagraphType};
pub use source::SectionSource;
