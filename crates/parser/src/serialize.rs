// ABOUTME: Tagged plain-text rendering of classified segments, and its inverse.
// ABOUTME: Provides serialize(), split_tagged() and the copy-for-any-AI prompt export.

use crate::model::{Classification, Segment};

pub const NEW_OPEN: &str = "[NEW]";
pub const NEW_CLOSE: &str = "[/NEW]";
pub const DELETED_OPEN: &str = "[DELETED]";
pub const DELETED_CLOSE: &str = "[/DELETED]";

/// Instructions placed ahead of tagged text for pasting into any chat assistant.
pub const COPY_PROMPT_HEADER: &str = "LEGISLATIVE BILL ANALYSIS \u{2014} FORMATTING PRESERVED

INSTRUCTIONS: This is legislative bill text with formatting tags that preserve the original underline and strikethrough formatting from the bill.

\u{2022} Text in [NEW] ... [/NEW] = NEW LANGUAGE being added to existing law (underlined in the original bill)
\u{2022} Text in [DELETED] ... [/DELETED] = LANGUAGE BEING REMOVED from existing law (strikethrough in the original bill)
\u{2022} All other text = EXISTING LAW that remains unchanged

Please analyze what substantive changes this bill makes. Identify what is being removed, what is being added, and the practical impact of each change.

---

";

/// Renders segments as one string, wrapping inserted and removed runs in markers.
pub fn serialize(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| match segment.classification {
            Classification::New => format!("{} {} {}", NEW_OPEN, segment.text, NEW_CLOSE),
            Classification::Deleted => {
                format!("{} {} {}", DELETED_OPEN, segment.text, DELETED_CLOSE)
            }
            Classification::Unchanged => segment.text.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Recovers classified segments from tagged text.
///
/// An opening marker with no matching close is kept as plain text through
/// the end of the input.
pub fn split_tagged(tagged: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = tagged;

    loop {
        let next = [
            (rest.find(NEW_OPEN), Classification::New),
            (rest.find(DELETED_OPEN), Classification::Deleted),
        ]
        .into_iter()
        .filter_map(|(pos, class)| pos.map(|p| (p, class)))
        .min_by_key(|&(pos, _)| pos);

        let Some((start, class)) = next else {
            push_trimmed(&mut segments, Classification::Unchanged, rest);
            break;
        };

        let (open, close) = match class {
            Classification::New => (NEW_OPEN, NEW_CLOSE),
            _ => (DELETED_OPEN, DELETED_CLOSE),
        };
        let body_start = start + open.len();
        let Some(body_len) = rest[body_start..].find(close) else {
            push_trimmed(&mut segments, Classification::Unchanged, rest);
            break;
        };

        push_trimmed(&mut segments, Classification::Unchanged, &rest[..start]);
        push_trimmed(
            &mut segments,
            class,
            &rest[body_start..body_start + body_len],
        );
        rest = &rest[body_start + body_len + close.len()..];
    }

    segments
}

fn push_trimmed(segments: &mut Vec<Segment>, classification: Classification, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        segments.push(Segment::new(classification, text));
    }
}

/// Prefixes tagged text with instructions explaining its markers.
pub fn copy_prompt(tagged: &str) -> String {
    format!("{}{}", COPY_PROMPT_HEADER, tagged)
}
