// ABOUTME: Markup cleanup run before tree parsing: entity decoding, page header and line number removal.
// ABOUTME: Provides clean() and decode_entities(); both are total and never fail.

//! Preprocessing of raw bill markup.
//!
//! Printed bills carry artifacts of their page layout: a running footer on
//! every page (`SB2846 - 5 - LRB104 16878 AAS 30288 b`) and a line number at
//! the start of each printed line. Both are stripped here, after entities are
//! decoded so that `&nbsp;`-style padding is visible as whitespace.

use once_cell::sync::Lazy;
use regex::Regex;

// Page footer: bill number, page, LRB revision, sequence, drafter code, sequence, suffix.
static PAGE_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z]{2}\d+\s*-\s*\d+\s*-\s*LRB\d+\s+\d+\s+[A-Z]+\s+\d+\s+[a-z]\b").unwrap()
});

// Printed line numbers (1-2 digits) at the start of a line.
static LINE_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*\d{1,2}\s+").unwrap());

// Longest entity name we try to resolve, semicolon excluded.
const MAX_ENTITY_LEN: usize = 32;

const NAMED_ENTITIES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", ' '),
    ("ensp", ' '),
    ("emsp", ' '),
    ("thinsp", ' '),
    ("ndash", '\u{2013}'),
    ("mdash", '\u{2014}'),
    ("lsquo", '\u{2018}'),
    ("rsquo", '\u{2019}'),
    ("ldquo", '\u{201C}'),
    ("rdquo", '\u{201D}'),
    ("hellip", '\u{2026}'),
    ("sect", '\u{00A7}'),
    ("para", '\u{00B6}'),
    ("copy", '\u{00A9}'),
    ("reg", '\u{00AE}'),
    ("trade", '\u{2122}'),
    ("bull", '\u{2022}'),
    ("middot", '\u{00B7}'),
    ("deg", '\u{00B0}'),
    ("plusmn", '\u{00B1}'),
    ("times", '\u{00D7}'),
    ("divide", '\u{00F7}'),
    ("frac12", '\u{00BD}'),
    ("frac14", '\u{00BC}'),
    ("frac34", '\u{00BE}'),
    ("euro", '\u{20AC}'),
    ("pound", '\u{00A3}'),
    ("yen", '\u{00A5}'),
    ("cent", '\u{00A2}'),
];

/// Cleans raw bill markup ahead of structural parsing.
///
/// Steps run in a fixed order: entities are decoded first, then page
/// footers are removed, then leading line numbers.
pub fn clean(raw: &str) -> String {
    let decoded = decode_entities(raw);
    let without_headers = PAGE_HEADER_RE.replace_all(&decoded, "");
    LINE_NUMBER_RE.replace_all(&without_headers, "").into_owned()
}

/// Decodes named and numeric character references in a single pass.
///
/// Output of one reference is never re-read, so `&amp;lt;` becomes `&lt;`.
/// Unknown names and malformed references are left as written.
pub fn decode_entities(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('&') {
        result.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match decode_reference(tail) {
            Some((decoded, consumed)) => {
                result.push(decoded);
                rest = &tail[consumed..];
            }
            None => {
                result.push('&');
                rest = &tail[1..];
            }
        }
    }

    result.push_str(rest);
    result
}

/// Resolves the reference at the start of `tail` (which begins with '&').
/// Returns the character and the number of bytes consumed, semicolon included.
fn decode_reference(tail: &str) -> Option<(char, usize)> {
    let body = &tail[1..];
    let semi = body
        .char_indices()
        .take(MAX_ENTITY_LEN + 1)
        .find(|&(_, c)| c == ';')
        .map(|(i, _)| i)?;
    let name = &body[..semi];

    let decoded = match name.strip_prefix('#') {
        Some(num) => decode_numeric(num)?,
        None => NAMED_ENTITIES
            .iter()
            .find(|(entity, _)| *entity == name)
            .map(|&(_, c)| c)?,
    };

    Some((decoded, semi + 2))
}

// Windows-1252 characters for references in 0x80..=0x9F; `None` keeps the code point.
const C1_REMAP: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

fn decode_numeric(num: &str) -> Option<char> {
    // Digits are validated first, so a parse failure can only be overflow.
    let code = match num.strip_prefix(['x', 'X']) {
        Some(hex) if !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()) => {
            u32::from_str_radix(hex, 16).unwrap_or(u32::MAX)
        }
        Some(_) => return None,
        None if !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()) => {
            num.parse::<u32>().unwrap_or(u32::MAX)
        }
        None => return None,
    };

    if let Some(remapped) = code
        .checked_sub(0x80)
        .and_then(|i| C1_REMAP.get(i as usize).copied().flatten())
    {
        return Some(remapped);
    }
    // NUL, surrogates and out-of-range values become the replacement character.
    match code {
        0 => Some(char::REPLACEMENT_CHARACTER),
        _ => Some(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)),
    }
}
