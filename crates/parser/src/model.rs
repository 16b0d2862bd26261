// ABOUTME: Data types produced by the bill pipeline: Classification, Segment, Stats, ParsedBill.
// ABOUTME: Serialized shapes match the JSON envelopes served by the transport layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::words::word_count;

/// What a run of bill text does to existing law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Inserted language (underlined in the printed bill).
    New,
    /// Removed language (struck through in the printed bill).
    Deleted,
    /// Existing law left as is.
    #[default]
    Unchanged,
}

impl Classification {
    /// Returns true for `New` and `Deleted`.
    pub fn is_change(self) -> bool {
        !matches!(self, Classification::Unchanged)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Classification::New => "new",
            Classification::Deleted => "deleted",
            Classification::Unchanged => "unchanged",
        };
        write!(f, "{}", s)
    }
}

/// A contiguous run of text sharing one classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(rename = "type")]
    pub classification: Classification,
    pub text: String,
}

impl Segment {
    pub fn new(classification: Classification, text: impl Into<String>) -> Self {
        Self {
            classification,
            text: text.into(),
        }
    }
}

/// Counts of inserted and removed runs and the words they contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub new_count: usize,
    pub new_words: usize,
    pub deleted_count: usize,
    pub deleted_words: usize,
}

impl Stats {
    /// Tallies `New` and `Deleted` segments. Unchanged text is never counted.
    pub fn from_segments(segments: &[Segment]) -> Self {
        let mut stats = Stats::default();
        for segment in segments {
            match segment.classification {
                Classification::New => {
                    stats.new_count += 1;
                    stats.new_words += word_count(&segment.text);
                }
                Classification::Deleted => {
                    stats.deleted_count += 1;
                    stats.deleted_words += word_count(&segment.text);
                }
                Classification::Unchanged => {}
            }
        }
        stats
    }
}

/// Complete output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedBill {
    pub segments: Vec<Segment>,
    #[serde(rename = "taggedText")]
    pub tagged_text: String,
    pub stats: Stats,
}
