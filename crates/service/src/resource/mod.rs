// ABOUTME: Document retrieval for bill markup over HTTP.
// ABOUTME: Validates bill URLs, blocks private networks, enforces size/status/length limits, and decodes charsets.

use std::collections::HashMap;
use std::net::IpAddr;

use bytes::Bytes;
use ipnet::{Ipv4Net, Ipv6Net};
use once_cell::sync::Lazy;
use tracing::{debug, warn};
use url::Url;

use crate::error::ServiceError;

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

static PRIVATE_V4: Lazy<Vec<Ipv4Net>> = Lazy::new(|| {
    [
        "10.0.0.0/8",
        "172.16.0.0/12",
        "192.168.0.0/16",
        "127.0.0.0/8",
        "169.254.0.0/16",
        "0.0.0.0/8",
    ]
    .iter()
    .map(|net| net.parse().unwrap())
    .collect()
});

static PRIVATE_V6: Lazy<Vec<Ipv6Net>> = Lazy::new(|| {
    ["fc00::/7", "fe80::/10"]
        .iter()
        .map(|net| net.parse().unwrap())
        .collect()
});

/// Options for fetching a bill document.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub headers: HashMap<String, String>,
    pub allow_private_networks: bool,
    pub allowed_host: Option<String>,
    pub min_content_length: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            headers: HashMap::new(),
            allow_private_networks: false,
            allowed_host: None,
            min_content_length: 0,
        }
    }
}

/// Result of a successful fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    pub url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResult {
    /// Decode the body as text, using the charset from the content-type header when present.
    pub fn text(&self) -> String {
        decode_body(&self.body, self.content_type.as_deref())
    }
}

/// Check if an IP address is in a private/reserved range.
pub(crate) fn is_private_ip(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(ip) => PRIVATE_V4.iter().any(|net| net.contains(ip)),
        IpAddr::V6(ip) => {
            if ip.is_loopback() || ip.is_unspecified() {
                return true;
            }
            if let Some(v4) = ip.to_ipv4_mapped() {
                return PRIVATE_V4.iter().any(|net| net.contains(&v4));
            }
            PRIVATE_V6.iter().any(|net| net.contains(ip))
        }
    }
}

/// Decode body bytes to a String using charset from content-type header or detection.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(encoding) = content_type
        .and_then(extract_charset)
        .and_then(|charset| encoding_rs::Encoding::for_label(charset.as_bytes()))
    {
        let (decoded, _, _) = encoding.decode(body);
        return decoded.into_owned();
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    lower.split(';').find_map(|part| {
        part.trim()
            .strip_prefix("charset=")
            .map(|charset| charset.trim_matches('"').trim_matches('\'').to_string())
    })
}

/// Checks that `url` is a well-formed http(s) URL on the allowed host.
pub fn validate_bill_url(url: &str, allowed_host: Option<&str>) -> Result<Url, ServiceError> {
    if url.trim().is_empty() {
        return Err(ServiceError::invalid_url(url, "Fetch", None));
    }

    let parsed = Url::parse(url.trim()).map_err(|e| {
        ServiceError::invalid_url(url, "Fetch", Some(anyhow::anyhow!("invalid URL: {}", e)))
    })?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ServiceError::invalid_url(
            url,
            "Fetch",
            Some(anyhow::anyhow!("scheme must be http or https")),
        ));
    }

    if let Some(allowed) = allowed_host {
        let allowed = allowed.to_lowercase();
        let host = parsed.host_str().unwrap_or_default().to_lowercase();
        let on_allowed_host = host == allowed || host.ends_with(&format!(".{}", allowed));
        if !on_allowed_host {
            return Err(ServiceError::invalid_url(
                url,
                "Fetch",
                Some(anyhow::anyhow!("host {:?} is not under {}", host, allowed)),
            ));
        }
    }

    Ok(parsed)
}

/// Rejects URLs whose host is, or resolves to, a private address.
async fn ensure_public_host(target: &Url, url: &str, reason: &str) -> Result<(), ServiceError> {
    let Some(host) = target.host_str() else {
        return Ok(());
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');

    let blocked = || ServiceError::ssrf(url, "Fetch", Some(anyhow::anyhow!("{}", reason)));

    if let Ok(ip) = host.parse::<IpAddr>() {
        if is_private_ip(&ip) {
            return Err(blocked());
        }
        return Ok(());
    }

    let port = target.port_or_known_default().unwrap_or(80);
    let addrs = tokio::net::lookup_host((host, port)).await.map_err(|e| {
        ServiceError::fetch(
            url,
            "Fetch",
            Some(anyhow::anyhow!("DNS lookup failed: {}", e)),
        )
    })?;

    for socket_addr in addrs {
        if is_private_ip(&socket_addr.ip()) {
            return Err(blocked());
        }
    }
    Ok(())
}

/// Maps a reqwest failure onto Timeout or Fetch.
fn request_error(url: &str, e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::timeout(url, "Fetch", Some(anyhow::Error::new(e)))
    } else {
        ServiceError::fetch(
            url,
            "Fetch",
            Some(anyhow::anyhow!("Failed to fetch bill: {}", e)),
        )
    }
}

/// Fetch raw bytes from the given URL.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    opts: &FetchOptions,
) -> Result<FetchResult, ServiceError> {
    let parsed = validate_bill_url(url, opts.allowed_host.as_deref())?;

    if !opts.allow_private_networks {
        ensure_public_host(&parsed, url, "private IP addresses are not allowed").await?;
    }

    let mut request = client.get(parsed.as_str());
    for (key, value) in &opts.headers {
        request = request.header(key, value);
    }

    let response = request.send().await.map_err(|e| request_error(url, e))?;

    // Redirects may land somewhere the original host check never saw.
    if !opts.allow_private_networks {
        ensure_public_host(response.url(), url, "redirect to private IP address is not allowed")
            .await?;
    }

    if let Some(len) = response.content_length() {
        if len as usize > MAX_CONTENT_LENGTH {
            return Err(ServiceError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("content too large")),
            ));
        }
    }

    let status = response.status().as_u16();
    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase());

    if !response.status().is_success() {
        warn!(url, status, "bill request returned non-success status");
        return Err(ServiceError::fetch(
            url,
            "Fetch",
            Some(anyhow::anyhow!(
                "HTTP error {}. The bill page may not exist.",
                status
            )),
        ));
    }

    let body = response.bytes().await.map_err(|e| request_error(url, e))?;

    if body.len() > MAX_CONTENT_LENGTH {
        return Err(ServiceError::fetch(
            url,
            "Fetch",
            Some(anyhow::anyhow!("content too large")),
        ));
    }

    debug!(url, status, bytes = body.len(), "fetched bill document");

    Ok(FetchResult {
        status,
        url: url.to_string(),
        final_url,
        content_type,
        body,
    })
}

/// Fetch and decode a bill document, rejecting suspiciously short payloads.
pub async fn fetch_document(
    client: &reqwest::Client,
    url: &str,
    opts: &FetchOptions,
) -> Result<String, ServiceError> {
    let result = fetch(client, url, opts).await?;
    let text = result.text();

    let chars = text.chars().count();
    if text.trim().is_empty() || chars < opts.min_content_length {
        warn!(url, chars, "retrieved bill document is too short");
        return Err(ServiceError::empty_content(
            url,
            "Fetch",
            Some(anyhow::anyhow!("{} characters", chars)),
        ));
    }

    Ok(text)
}
