// ABOUTME: Segment reduction: whitespace normalization, empty filtering, adjacent merging, and stats.
// ABOUTME: Fails with NoFormattingDetected when nothing inserted or deleted survives.

use serde::Serialize;
use tracing::debug;

use crate::error::BillError;
use crate::model::{Segment, Stats};

/// Reduced segment sequence and its statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reduced {
    pub segments: Vec<Segment>,
    pub stats: Stats,
}

/// Normalizes, filters and merges segments, then computes stats.
///
/// Each segment is normalized on its own before any merge happens.
pub fn reduce(segments: Vec<Segment>) -> Result<Reduced, BillError> {
    let normalized: Vec<Segment> = segments
        .into_iter()
        .filter_map(|mut segment| {
            segment.text = normalize_whitespace(&segment.text);
            (!segment.text.is_empty()).then_some(segment)
        })
        .collect();

    let merged = merge_adjacent(normalized);

    if !merged.iter().any(|s| s.classification.is_change()) {
        return Err(BillError::NoFormattingDetected);
    }

    let stats = Stats::from_segments(&merged);
    debug!(segments = merged.len(), ?stats, "reduced segments");

    Ok(Reduced {
        segments: merged,
        stats,
    })
}

/// Collapses every whitespace run to one space and trims the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Joins each segment into its immediate predecessor when both share a classification.
pub fn merge_adjacent(segments: Vec<Segment>) -> Vec<Segment> {
    let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());
    for segment in segments {
        match merged.last_mut() {
            Some(last) if last.classification == segment.classification => {
                last.text.push(' ');
                last.text.push_str(&segment.text);
            }
            _ => merged.push(segment),
        }
    }
    merged
}
