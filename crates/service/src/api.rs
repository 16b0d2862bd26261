// ABOUTME: JSON request and response envelopes for the bills HTTP API.
// ABOUTME: Failures travel inside the envelope with success=false rather than as HTTP errors.

use redline_parser::{ParsedBill, Segment, Stats};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchBillRequest {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchBillResponse {
    pub html: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FetchBillResponse {
    pub fn ok(html: String) -> Self {
        Self {
            html,
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            html: String::new(),
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseBillRequest {
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseBillResponse {
    pub segments: Vec<Segment>,
    #[serde(rename = "taggedText")]
    pub tagged_text: String,
    pub stats: Stats,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ParseBillResponse {
    /// An empty result with zeroed stats.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            segments: Vec::new(),
            tagged_text: String::new(),
            stats: Stats::default(),
            success: false,
            error: Some(error.into()),
        }
    }
}

impl From<ParsedBill> for ParseBillResponse {
    fn from(parsed: ParsedBill) -> Self {
        Self {
            segments: parsed.segments,
            tagged_text: parsed.tagged_text,
            stats: parsed.stats,
            success: true,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeBillRequest {
    #[serde(rename = "taggedText")]
    pub tagged_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn failed_parse_has_zeroed_stats() {
        let value = serde_json::to_value(ParseBillResponse::failed("nope")).unwrap();
        assert_eq!(
            value,
            json!({
                "segments": [],
                "taggedText": "",
                "stats": {"new_count": 0, "new_words": 0, "deleted_count": 0, "deleted_words": 0},
                "success": false,
                "error": "nope"
            })
        );
    }

    #[test]
    fn successful_fetch_omits_error() {
        let value = serde_json::to_value(FetchBillResponse::ok("<p>x</p>".into())).unwrap();
        assert_eq!(value, json!({"html": "<p>x</p>", "success": true}));
    }

    #[test]
    fn analyze_request_uses_camel_case_key() {
        let req: AnalyzeBillRequest =
            serde_json::from_value(json!({"taggedText": "[NEW] a [/NEW]"})).unwrap();
        assert_eq!(req.tagged_text, "[NEW] a [/NEW]");
    }
}
