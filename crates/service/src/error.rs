// ABOUTME: Error types for the redline service including ErrorCode enum and ServiceError struct.
// ABOUTME: Provides categorized errors with convenience constructors, boolean helpers, and user-facing messages.

use std::fmt;

use redline_parser::BillError;

/// Error codes representing different categories of service failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidUrl,
    Fetch,
    Timeout,
    Ssrf,
    EmptyContent,
    Parse,
    Analyze,
    Config,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidUrl => "invalid URL",
            ErrorCode::Fetch => "fetch error",
            ErrorCode::Timeout => "timeout",
            ErrorCode::Ssrf => "SSRF blocked",
            ErrorCode::EmptyContent => "empty content",
            ErrorCode::Parse => "parse error",
            ErrorCode::Analyze => "analysis error",
            ErrorCode::Config => "configuration error",
        };
        write!(f, "{}", s)
    }
}

/// The main error type for service operations.
#[derive(Debug, thiserror::Error)]
pub struct ServiceError {
    pub code: ErrorCode,
    pub target: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "redline: {}", self.op)?;
        if !self.target.is_empty() {
            write!(f, " {}", self.target)?;
        }
        write!(f, ": {}", self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl From<BillError> for ServiceError {
    fn from(err: BillError) -> Self {
        ServiceError::parse("", "Parse", Some(anyhow::Error::new(err)))
    }
}

macro_rules! constructor {
    ($(#[$doc:meta])* $name:ident, $code:ident) => {
        $(#[$doc])*
        pub fn $name(
            target: impl Into<String>,
            op: impl Into<String>,
            source: Option<anyhow::Error>,
        ) -> Self {
            Self {
                code: ErrorCode::$code,
                target: target.into(),
                op: op.into(),
                source,
            }
        }
    };
}

impl ServiceError {
    constructor!(
        /// Create an InvalidUrl error.
        invalid_url,
        InvalidUrl
    );
    constructor!(
        /// Create a Fetch error.
        fetch,
        Fetch
    );
    constructor!(
        /// Create a Timeout error.
        timeout,
        Timeout
    );
    constructor!(
        /// Create an SSRF error.
        ssrf,
        Ssrf
    );
    constructor!(
        /// Create an EmptyContent error.
        empty_content,
        EmptyContent
    );
    constructor!(
        /// Create a Parse error.
        parse,
        Parse
    );
    constructor!(
        /// Create an Analyze error.
        analyze,
        Analyze
    );
    constructor!(
        /// Create a Config error.
        config,
        Config
    );

    /// The sentence shown to end users in response envelopes.
    pub fn message(&self) -> String {
        match self.code {
            ErrorCode::InvalidUrl => {
                "Invalid URL. Please provide a valid ILGA.gov bill URL.".to_string()
            }
            ErrorCode::Timeout => {
                "Request timed out. The ILGA.gov server may be slow or unreachable.".to_string()
            }
            ErrorCode::Ssrf => "Refusing to fetch from a private network address.".to_string(),
            ErrorCode::EmptyContent => {
                "Retrieved content appears to be empty or invalid.".to_string()
            }
            ErrorCode::Fetch | ErrorCode::Parse | ErrorCode::Analyze | ErrorCode::Config => self
                .source
                .as_ref()
                .map(|src| src.to_string())
                .unwrap_or_else(|| self.code.to_string()),
        }
    }

    /// Returns the pipeline error behind a Parse error, if any.
    pub fn bill_error(&self) -> Option<&BillError> {
        self.source.as_ref().and_then(|src| src.downcast_ref())
    }

    /// Returns true if this is a Timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code == ErrorCode::Timeout
    }

    /// Returns true if this is an SSRF error.
    pub fn is_ssrf(&self) -> bool {
        self.code == ErrorCode::Ssrf
    }

    /// Returns true if this is a Fetch error.
    pub fn is_fetch(&self) -> bool {
        self.code == ErrorCode::Fetch
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code == ErrorCode::InvalidUrl
    }

    /// Returns true if this is an EmptyContent error.
    pub fn is_empty_content(&self) -> bool {
        self.code == ErrorCode::EmptyContent
    }

    /// Returns true if this is a Parse error.
    pub fn is_parse(&self) -> bool {
        self.code == ErrorCode::Parse
    }

    /// Returns true if this is an Analyze error.
    pub fn is_analyze(&self) -> bool {
        self.code == ErrorCode::Analyze
    }

    /// Returns true if this is a Config error.
    pub fn is_config(&self) -> bool {
        self.code == ErrorCode::Config
    }
}
