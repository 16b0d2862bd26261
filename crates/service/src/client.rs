// ABOUTME: The main Client struct for redline tying retrieval, the tagging pipeline, and analysis together.
// ABOUTME: Builds the HTTP clients once so every handler and CLI command shares connection pools and policy.

use std::net::ToSocketAddrs;
use std::time::Instant;

use redline_parser::ParsedBill;
use tracing::{debug, error, info};

use crate::analyzer::{Analyzer, NarrativeStream};
use crate::error::ServiceError;
use crate::options::{ClientBuilder, Options};
use crate::resource::{fetch_document, is_private_ip, FetchOptions};

/// Entry point for fetching, parsing, and analyzing bills.
#[derive(Debug, Clone)]
pub struct Client {
    opts: Options,
    http_client: reqwest::Client,
    analyzer: Analyzer,
}

/// Redirect policy that refuses hops onto private addresses.
fn redirect_policy(allow_private: bool) -> reqwest::redirect::Policy {
    reqwest::redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() > 10 {
            return attempt.error("too many redirects");
        }
        if allow_private {
            return attempt.follow();
        }
        let next = attempt.url().clone();
        let Some(host) = next.host_str() else {
            return attempt.follow();
        };
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = host.parse::<std::net::IpAddr>() {
            if is_private_ip(&ip) {
                return attempt.error("redirect to private IP blocked");
            }
            return attempt.follow();
        }
        // redirect policies are synchronous
        let port = next.port_or_known_default().unwrap_or(80);
        match (host, port).to_socket_addrs() {
            Ok(mut addrs) => {
                if addrs.any(|sa| is_private_ip(&sa.ip())) {
                    attempt.error("redirect to private IP blocked")
                } else {
                    attempt.follow()
                }
            }
            Err(_) => attempt.error("DNS lookup failed during redirect"),
        }
    })
}

impl Client {
    /// Create a new ClientBuilder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a new Client with the given options.
    pub fn new(opts: Options) -> Self {
        let http_client = opts.http_client.clone().unwrap_or_else(|| {
            reqwest::Client::builder()
                .redirect(redirect_policy(opts.allow_private_networks))
                .user_agent(&opts.user_agent)
                .timeout(opts.timeout)
                .gzip(true)
                .brotli(true)
                .deflate(true)
                .build()
                .unwrap_or_else(|e| {
                    error!("falling back to default HTTP client: {}", e);
                    reqwest::Client::new()
                })
        });

        // Analysis responses stream for longer than any sane total timeout.
        let analyzer_http = reqwest::Client::builder()
            .connect_timeout(opts.timeout)
            .build()
            .unwrap_or_else(|e| {
                error!("falling back to default analysis client: {}", e);
                reqwest::Client::new()
            });
        let analyzer = Analyzer::new(analyzer_http, opts.analyzer.clone());

        Self {
            opts,
            http_client,
            analyzer,
        }
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            headers: self.opts.headers.clone(),
            allow_private_networks: self.opts.allow_private_networks,
            allowed_host: self.opts.allowed_host.clone(),
            min_content_length: self.opts.min_content_length,
        }
    }

    /// Retrieves the raw markup of the bill at `url`.
    pub async fn fetch_bill(&self, url: &str) -> Result<String, ServiceError> {
        let start = Instant::now();
        let html = fetch_document(&self.http_client, url, &self.fetch_options()).await?;
        info!(
            url,
            chars = html.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "fetched bill"
        );
        Ok(html)
    }

    /// Runs the tagging pipeline over bill markup.
    pub fn parse_bill(&self, html: &str) -> Result<ParsedBill, ServiceError> {
        let start = Instant::now();
        let parsed = redline_parser::parse_bill(html)?;
        debug!(
            segments = parsed.segments.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "parsed bill"
        );
        Ok(parsed)
    }

    /// Fetches and parses in one step.
    pub async fn fetch_and_parse(&self, url: &str) -> Result<ParsedBill, ServiceError> {
        let html = self.fetch_bill(url).await?;
        self.parse_bill(&html)
    }

    /// Streams an analysis of tagged bill text.
    pub fn analyze(&self, tagged: &str) -> NarrativeStream {
        self.analyzer.analyze_stream(tagged)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new(Options::default())
    }
}
