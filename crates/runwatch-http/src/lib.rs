//! [`StatusFetcher`](runwatch_core::StatusFetcher) over HTTP/JSON.

mod config;
pub use config::{DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_RUNS_PATH, HttpFetcherConfig};

mod errors;
pub use errors::HttpFetcherError;

mod fetcher;
pub use fetcher::HttpStatusFetcher;
