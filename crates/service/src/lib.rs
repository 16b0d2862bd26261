// ABOUTME: Library entry point for the redline service: bill retrieval, analysis, and HTTP transport.
// ABOUTME: Re-exports the public API: Client, ClientBuilder, Options, ServiceError, ErrorCode, router, serve.

//! Redline service - fetches legislative bills, tags their amendments and
//! streams plain-language analyses of the changes.
//!
//! The tagging pipeline itself lives in `redline-parser`; this crate adds
//! everything that talks to the network.
//!
//! # Example
//!
//! ```no_run
//! use redline_service::{Client, ServiceError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ServiceError> {
//!     let client = Client::builder().build();
//!     let bill = client
//!         .fetch_and_parse("https://www.ilga.gov/legislation/fulltext.asp?DocName=10400SB3980")
//!         .await?;
//!     println!("{}", bill.tagged_text);
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod api;
pub mod client;
pub mod error;
pub mod options;
pub mod resource;
pub mod server;

pub use crate::analyzer::{Analyzer, NarrativeStream, SYSTEM_PROMPT};
pub use crate::client::Client;
pub use crate::error::{ErrorCode, ServiceError};
pub use crate::options::{AnalyzerOptions, ClientBuilder, Options};
pub use crate::server::{router, serve};
pub use redline_parser::{ParsedBill, Segment, Stats};
