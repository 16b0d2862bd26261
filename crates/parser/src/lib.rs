// ABOUTME: Core library for classifying legislative bill markup into new, deleted, and unchanged text.
// ABOUTME: Re-exports the pipeline stages and parse_bill(), which runs them in order.

//! Redline parser - turns bill markup into classified, tagged text.
//!
//! The pipeline has four stages, each consuming the previous one's output:
//!
//! 1. [`clean`] decodes entities and strips printed page artifacts.
//! 2. [`classify`] walks the markup tree and emits classified text runs.
//! 3. [`reduce`] normalizes whitespace, merges neighbours and counts words.
//! 4. [`serialize`] renders `[NEW]`/`[DELETED]` tagged plain text.
//!
//! # Example
//!
//! ```
//! use redline_parser::parse_bill;
//!
//! let bill = parse_bill("<p>The <del>old</del> <u>new</u> rule.</p>").unwrap();
//! assert_eq!(bill.tagged_text, "The [DELETED] old [/DELETED] [NEW] new [/NEW] rule.");
//! assert_eq!(bill.stats.new_words, 1);
//! ```

pub mod classify;
pub mod error;
pub mod model;
pub mod preprocess;
pub mod reduce;
pub mod serialize;
pub mod words;

pub use classify::classify;
pub use error::BillError;
pub use model::{Classification, ParsedBill, Segment, Stats};
pub use preprocess::{clean, decode_entities};
pub use reduce::{merge_adjacent, normalize_whitespace, reduce, Reduced};
pub use serialize::{copy_prompt, serialize, split_tagged};
pub use words::{check_length, word_count, LengthCheck, DEFAULT_WORD_LIMIT};

use tracing::{debug, info};

/// Runs the full pipeline over raw bill markup.
pub fn parse_bill(raw: &str) -> Result<ParsedBill, BillError> {
    let cleaned = clean(raw);
    debug!(raw_len = raw.len(), cleaned_len = cleaned.len(), "cleaned markup");

    let Reduced { segments, stats } = reduce(classify(&cleaned)?)?;
    let tagged_text = serialize(&segments);

    info!(
        segments = segments.len(),
        new_count = stats.new_count,
        deleted_count = stats.deleted_count,
        "parsed bill"
    );

    Ok(ParsedBill {
        segments,
        tagged_text,
        stats,
    })
}
