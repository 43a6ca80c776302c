use thiserror::Error;

#[derive(Error, Debug)]
pub enum HttpFetcherError {
    #[error("invalid fetcher config: {0}")]
    InvalidConfig(String),

    #[error("invalid base url: {0}")]
    InvalidUrl(String),

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}
