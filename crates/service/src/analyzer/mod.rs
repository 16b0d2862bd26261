// ABOUTME: Narrative generation for tagged bill text via the Anthropic Messages streaming API.
// ABOUTME: Emits length notices, then relays each text delta verbatim as a stream of fragments.

//! Streaming bill analysis.
//!
//! [`Analyzer::analyze_stream`] never fails up front: every problem, from a
//! missing API key to a dropped connection, arrives as an `Err` item on the
//! stream after any fragments already produced.

pub mod sse;

use std::collections::VecDeque;

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use redline_parser::{check_length, LengthCheck};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::error::ServiceError;
use crate::options::AnalyzerOptions;

use self::sse::{SseDecoder, SseEvent};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Instructions given to the model for every analysis.
pub const SYSTEM_PROMPT: &str = "You are a legislative analyst AI. You are reading bill text that has been specially tagged to preserve legislative formatting:

- Text wrapped in [NEW] ... [/NEW] tags represents NEW LANGUAGE being added to existing law (shown as underlined text in the original bill)
- Text wrapped in [DELETED] ... [/DELETED] tags represents LANGUAGE BEING REMOVED from existing law (shown as strikethrough text in the original bill)
- All other text is EXISTING LAW that remains unchanged

Your job is to:
1. Clearly explain what substantive changes this bill makes
2. Identify what existing provisions are being removed and what is replacing them
3. Note the practical impact of these changes
4. Flag any provisions that seem ambiguous or could have unintended consequences

Be specific and reference the actual language. Do not summarize generically \u{2014} a legislative professional is reading your analysis.";

/// A stream of narrative fragments.
pub type NarrativeStream = BoxStream<'static, Result<String, ServiceError>>;

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    stream: bool,
    messages: [Message; 1],
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

/// Streams analyses of tagged bill text.
#[derive(Debug, Clone)]
pub struct Analyzer {
    http: reqwest::Client,
    opts: AnalyzerOptions,
}

impl Analyzer {
    pub fn new(http: reqwest::Client, opts: AnalyzerOptions) -> Self {
        Self { http, opts }
    }

    /// Compares tagged text against the configured word limit.
    pub fn check_length(&self, tagged: &str) -> LengthCheck {
        check_length(tagged, self.opts.word_limit)
    }

    /// Streams the model's analysis of `tagged`, fragment by fragment.
    pub fn analyze_stream(&self, tagged: &str) -> NarrativeStream {
        let Some(api_key) = self.opts.api_key.as_deref() else {
            return stream::once(async {
                Err(ServiceError::config(
                    "",
                    "Analyze",
                    Some(anyhow::anyhow!(
                        "Anthropic API key not configured. Please set ANTHROPIC_API_KEY environment variable."
                    )),
                ))
            })
            .boxed();
        };

        let notices = length_notices(&self.check_length(tagged));
        let request = self.build_request(api_key, tagged);
        let body = stream::once(open_stream(request)).flatten();

        stream::iter(notices.into_iter().map(Ok))
            .chain(body)
            .boxed()
    }

    fn build_request(&self, api_key: &str, tagged: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/v1/messages", self.opts.api_base.trim_end_matches('/'));
        let payload = MessagesRequest {
            model: &self.opts.model,
            max_tokens: self.opts.max_tokens,
            system: SYSTEM_PROMPT,
            stream: true,
            messages: [Message {
                role: "user",
                content: user_message(tagged),
            }],
        };
        debug!(url = %url, model = %self.opts.model, "requesting bill analysis");

        self.http
            .post(url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
    }
}

fn user_message(tagged: &str) -> String {
    format!(
        "Analyze the following tagged legislative text. Explain what changes are being made, what is being removed, what is being added, and the practical impact:\n\n{}",
        tagged
    )
}

/// Fragments announcing that the bill is over the word budget.
fn length_notices(check: &LengthCheck) -> Vec<String> {
    if !check.too_long {
        return Vec::new();
    }
    vec![
        format!(
            "Note: This bill contains {} words, which exceeds the recommended limit of {} words. ",
            group_thousands(check.word_count),
            group_thousands(check.limit)
        ),
        "The analysis may be incomplete. Consider using the 'Copy for Any AI' button to analyze sections separately.\n\n"
            .to_string(),
    ]
}

/// Formats `n` with comma thousands separators.
fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Pointer to the manual fallback, appended to every analysis failure.
const COPY_FALLBACK_HINT: &str =
    "Use the 'Copy for Any AI' button to paste the tagged text into any AI chat.";

fn analyze_error(detail: impl std::fmt::Display) -> ServiceError {
    ServiceError::analyze(
        "",
        "Analyze",
        Some(anyhow::anyhow!(
            "Could not connect to Claude API. {}\n\n{}",
            detail,
            COPY_FALLBACK_HINT
        )),
    )
}

async fn open_stream(request: reqwest::RequestBuilder) -> NarrativeStream {
    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            error!("analysis request failed: {}", e);
            return stream::once(async move { Err(analyze_error(e)) }).boxed();
        }
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(body);
        error!(status = status.as_u16(), "analysis request rejected: {}", detail);
        return stream::once(async move {
            Err(analyze_error(format!("HTTP {}: {}", status.as_u16(), detail)))
        })
        .boxed();
    }

    text_deltas(response.bytes_stream().boxed()).boxed()
}

enum Delta {
    Text(String),
    Stop,
    Failed(String),
    Ignore,
}

fn interpret(event: &SseEvent) -> Delta {
    let Ok(value) = serde_json::from_str::<Value>(&event.data) else {
        return Delta::Ignore;
    };
    match value.get("type").and_then(Value::as_str) {
        Some("content_block_delta") => {
            let is_text = value.pointer("/delta/type").and_then(Value::as_str) == Some("text_delta");
            match value.pointer("/delta/text").and_then(Value::as_str) {
                Some(text) if is_text => Delta::Text(text.to_string()),
                _ => Delta::Ignore,
            }
        }
        Some("message_stop") => Delta::Stop,
        Some("error") => Delta::Failed(
            value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        ),
        _ => Delta::Ignore,
    }
}

struct DeltaState {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, ServiceError>>,
    done: bool,
}

impl DeltaState {
    fn absorb(&mut self, events: impl IntoIterator<Item = SseEvent>) {
        for event in events {
            if self.done {
                return;
            }
            match interpret(&event) {
                Delta::Text(text) => self.pending.push_back(Ok(text)),
                Delta::Stop => self.done = true,
                Delta::Failed(message) => {
                    error!("analysis stream reported an error: {}", message);
                    self.pending.push_back(Err(analyze_error(message)));
                    self.done = true;
                }
                Delta::Ignore => {}
            }
        }
    }
}

/// Turns a raw SSE response body into its text fragments.
fn text_deltas(
    body: BoxStream<'static, reqwest::Result<Bytes>>,
) -> impl futures::Stream<Item = Result<String, ServiceError>> + Send + 'static {
    let state = DeltaState {
        body,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.done {
                return None;
            }
            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(&chunk);
                    state.absorb(events);
                }
                Some(Err(e)) => {
                    error!("analysis stream interrupted: {}", e);
                    state.pending.push_back(Err(analyze_error(e)));
                    state.done = true;
                }
                None => {
                    let rest = state.decoder.finish();
                    state.absorb(rest);
                    state.done = true;
                }
            }
        }
    })
}
