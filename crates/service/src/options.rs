// ABOUTME: Configuration options for the redline service including Options, AnalyzerOptions, and ClientBuilder.
// ABOUTME: Options can be overlaid from environment variables; ClientBuilder provides a fluent API.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use redline_parser::DEFAULT_WORD_LIMIT;

use crate::client::Client;

/// Browser-like User-Agent sent with bill requests.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Host suffix bill URLs must belong to.
pub const DEFAULT_ALLOWED_HOST: &str = "ilga.gov";

/// Retrieved documents shorter than this many characters are rejected.
pub const DEFAULT_MIN_CONTENT_LENGTH: usize = 100;

pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Settings for the narrative generator.
#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub max_tokens: u32,
    pub word_limit: usize,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            word_limit: DEFAULT_WORD_LIMIT,
        }
    }
}

/// Configuration options for the redline client.
#[derive(Debug, Clone)]
pub struct Options {
    pub timeout: Duration,
    pub user_agent: String,
    pub allowed_host: Option<String>,
    pub min_content_length: usize,
    pub allow_private_networks: bool,
    pub http_client: Option<reqwest::Client>,
    pub headers: HashMap<String, String>,
    pub analyzer: AnalyzerOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            allowed_host: Some(DEFAULT_ALLOWED_HOST.to_string()),
            min_content_length: DEFAULT_MIN_CONTENT_LENGTH,
            allow_private_networks: false,
            http_client: None,
            headers: HashMap::new(),
            analyzer: AnalyzerOptions::default(),
        }
    }
}

impl Options {
    /// Defaults overlaid with `ANTHROPIC_API_KEY`, `ANTHROPIC_API_BASE`,
    /// `REDLINE_MODEL` and `REDLINE_WORD_LIMIT`.
    pub fn from_env() -> Self {
        let mut opts = Options::default();
        opts.apply_env(|key| env::var(key).ok());
        opts
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("ANTHROPIC_API_KEY") {
            self.analyzer.api_key = Some(key);
        }
        if let Some(base) = non_empty("ANTHROPIC_API_BASE") {
            self.analyzer.api_base = base;
        }
        if let Some(model) = non_empty("REDLINE_MODEL") {
            self.analyzer.model = model;
        }
        match non_empty("REDLINE_WORD_LIMIT").map(|v| v.trim().parse::<usize>()) {
            Some(Ok(limit)) => self.analyzer.word_limit = limit,
            Some(Err(e)) => tracing::warn!("ignoring REDLINE_WORD_LIMIT: {}", e),
            None => {}
        }
    }
}

/// Builder for constructing Client instances with custom configuration.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    opts: Options,
}

impl ClientBuilder {
    /// Create a new ClientBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    /// Start from existing options, e.g. [`Options::from_env`].
    pub fn from_options(opts: Options) -> Self {
        Self { opts }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Restrict bill URLs to hosts ending in `host`; `None` accepts any host.
    pub fn allowed_host(mut self, host: Option<String>) -> Self {
        self.opts.allowed_host = host;
        self
    }

    /// Set the shortest retrieved document accepted, in characters.
    pub fn min_content_length(mut self, len: usize) -> Self {
        self.opts.min_content_length = len;
        self
    }

    /// Allow or disallow requests to private networks.
    pub fn allow_private_networks(mut self, allow: bool) -> Self {
        self.opts.allow_private_networks = allow;
        self
    }

    /// Use a custom HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Add a custom header to all bill requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Set the Anthropic API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.opts.analyzer.api_key = Some(key.into());
        self
    }

    /// Set the Anthropic API base URL.
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.opts.analyzer.api_base = base.into();
        self
    }

    /// Set the model used for analysis.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.opts.analyzer.model = model.into();
        self
    }

    /// Set the response token budget for analysis.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.opts.analyzer.max_tokens = max_tokens;
        self
    }

    /// Set the word count above which analysis is flagged as partial.
    pub fn word_limit(mut self, limit: usize) -> Self {
        self.opts.analyzer.word_limit = limit;
        self
    }

    /// Build the Client with the configured options.
    pub fn build(self) -> Client {
        Client::new(self.opts)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
