// ABOUTME: Error types for bill markup classification.
// ABOUTME: Provides BillError with Parse and NoFormattingDetected variants.

use std::fmt;
use thiserror::Error;

/// Errors that can occur while turning bill markup into classified segments.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BillError {
    /// The markup could not be turned into a document tree at all.
    #[error("unable to parse document: {0}")]
    Parse(String),

    /// The markup parsed, but carried no insertion or deletion signal.
    #[error("No legislative formatting detected. Make sure the HTML contains underline or strikethrough tags.")]
    NoFormattingDetected,
}

impl BillError {
    /// Creates a Parse error from any displayable cause.
    pub fn parse(err: impl fmt::Display) -> Self {
        BillError::Parse(err.to_string())
    }

    /// Returns true if the markup could not be parsed.
    pub fn is_parse(&self) -> bool {
        matches!(self, BillError::Parse(_))
    }

    /// Returns true if the markup had no recognizable formatting.
    pub fn is_no_formatting(&self) -> bool {
        matches!(self, BillError::NoFormattingDetected)
    }
}
