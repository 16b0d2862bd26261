// ABOUTME: Tree classifier that walks parsed bill markup and emits classified text segments.
// ABOUTME: Classification is inherited down the tree and overridden by underline/strikethrough signals.

//! Markup classification.
//!
//! The cleaned markup is parsed with html5ever (through `scraper`), which
//! always produces a best-effort tree for messy input. The walk then threads
//! the current [`Classification`] down through the tree:
//!
//! - `u`/`ins` switch a subtree to [`Classification::New`].
//! - `del`/`s`/`strike` switch a subtree to [`Classification::Deleted`].
//! - `span` elements may switch either way through a `text-decoration`
//!   style or an `inserted`/`deleted` class.
//! - Every other element keeps the classification of its parent.
//!
//! Table elements only carry the visual layout of the printed bill, so they
//! are unwrapped: their children are visited in place as if the table tags
//! were never there.

use ego_tree::NodeRef;
use scraper::node::Element;
use scraper::{Html, Node, Selector};
use tracing::debug;

use crate::error::BillError;
use crate::model::{Classification, Segment};

/// Tags marking inserted language.
const INSERT_TAGS: &[&str] = &["u", "ins"];

/// Tags marking removed language.
const DELETE_TAGS: &[&str] = &["del", "s", "strike"];

/// Layout-only containers unwrapped before classification.
const LAYOUT_TAGS: &[&str] = &["table", "tr", "td", "th", "tbody", "thead", "tfoot"];

/// Elements whose text is never bill content.
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Parses cleaned markup and returns its text runs in document order.
///
/// Text is not trimmed here; whitespace-only leaves are dropped.
pub fn classify(cleaned: &str) -> Result<Vec<Segment>, BillError> {
    let doc = Html::parse_document(cleaned);

    if !doc.tree.root().children().any(|n| n.value().is_element()) {
        return Err(BillError::parse("markup produced no element tree"));
    }

    let body = Selector::parse("body")
        .ok()
        .and_then(|sel| doc.select(&sel).next());

    let segments = match body {
        Some(body) => walk(body.children()),
        None => walk(doc.tree.root().children()),
    };

    debug!(segments = segments.len(), "classified markup");
    Ok(segments)
}

/// Visits `roots` and their descendants in document order, threading each
/// node's inherited classification through an explicit stack so nesting
/// depth is bounded only by memory.
fn walk<'a>(roots: impl DoubleEndedIterator<Item = NodeRef<'a, Node>>) -> Vec<Segment> {
    let mut stack: Vec<(NodeRef<'a, Node>, Classification)> = roots
        .rev()
        .map(|node| (node, Classification::Unchanged))
        .collect();
    let mut segments = Vec::new();

    while let Some((node, inherited)) = stack.pop() {
        match node.value() {
            Node::Text(text) => {
                if !text.trim().is_empty() {
                    segments.push(Segment::new(inherited, &**text));
                }
            }
            Node::Element(el) => {
                let tag = el.name().to_ascii_lowercase();
                if SKIPPED_TAGS.contains(&tag.as_str()) {
                    continue;
                }
                let effective = if LAYOUT_TAGS.contains(&tag.as_str()) {
                    inherited
                } else {
                    element_signal(&tag, el).unwrap_or(inherited)
                };
                // Reversed so the first child is popped first.
                stack.extend(node.children().rev().map(|child| (child, effective)));
            }
            _ => {}
        }
    }
    segments
}

/// Returns the classification an element imposes on its subtree, if any.
fn element_signal(tag: &str, el: &Element) -> Option<Classification> {
    if INSERT_TAGS.contains(&tag) {
        return Some(Classification::New);
    }
    if DELETE_TAGS.contains(&tag) {
        return Some(Classification::Deleted);
    }
    if tag == "span" {
        return span_signal(el);
    }
    None
}

/// Reads a span's style first, then its class list.
fn span_signal(el: &Element) -> Option<Classification> {
    let style = attr_lowercase(el, "style");
    if style.contains("text-decoration") {
        if style.contains("underline") {
            return Some(Classification::New);
        }
        if style.contains("line-through") {
            return Some(Classification::Deleted);
        }
    }

    let class = attr_lowercase(el, "class");
    if class.contains("inserted") {
        Some(Classification::New)
    } else if class.contains("deleted") {
        Some(Classification::Deleted)
    } else {
        None
    }
}

/// An attribute value as one lowercase string; empty when absent.
fn attr_lowercase(el: &Element, name: &str) -> String {
    el.attr(name).map(str::to_lowercase).unwrap_or_default()
}
