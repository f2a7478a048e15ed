use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Boolean text attribute carried by a text run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
}

impl Mark {
    pub const ALL: [Mark; 5] = [
        Mark::Bold,
        Mark::Italic,
        Mark::Underline,
        Mark::Strikethrough,
        Mark::Code,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mark::Bold => "bold",
            Mark::Italic => "italic",
            Mark::Underline => "underline",
            Mark::Strikethrough => "strikethrough",
            Mark::Code => "code",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Mark::Bold => 1,
            Mark::Italic => 1 << 1,
            Mark::Underline => 1 << 2,
            Mark::Strikethrough => 1 << 3,
            Mark::Code => 1 << 4,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mark {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "bold" => Ok(Mark::Bold),
            "italic" => Ok(Mark::Italic),
            "underline" => Ok(Mark::Underline),
            "strikethrough" => Ok(Mark::Strikethrough),
            "code" => Ok(Mark::Code),
            other => Err(ModelError::UnknownMark(other.to_string())),
        }
    }
}

/// Set of marks stored as a bitset; serialised as a list of mark names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Mark>", into = "Vec<Mark>")]
pub struct MarkSet(u8);

impl MarkSet {
    pub const EMPTY: MarkSet = MarkSet(0);

    pub fn contains(&self, mark: Mark) -> bool {
        self.0 & mark.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn with(self, mark: Mark) -> Self {
        Self(self.0 | mark.bit())
    }

    pub fn without(self, mark: Mark) -> Self {
        Self(self.0 & !mark.bit())
    }

    pub fn set(self, mark: Mark, enabled: bool) -> Self {
        if enabled {
            self.with(mark)
        } else {
            self.without(mark)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Mark> + '_ {
        Mark::ALL.into_iter().filter(|mark| self.contains(*mark))
    }
}

impl FromIterator<Mark> for MarkSet {
    fn from_iter<I: IntoIterator<Item = Mark>>(iter: I) -> Self {
        iter.into_iter().fold(MarkSet::EMPTY, MarkSet::with)
    }
}

impl From<Vec<Mark>> for MarkSet {
    fn from(marks: Vec<Mark>) -> Self {
        marks.into_iter().collect()
    }
}

impl From<MarkSet> for Vec<Mark> {
    fn from(set: MarkSet) -> Self {
        set.iter().collect()
    }
}
