//! Error handling and custom error types
//!
//! Every client operation reports failure through [`Error`]. Transport,
//! size and configuration problems are "unavailable"; failures reported by
//! the image service itself keep the server's text.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Image service unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image size illegal: {0}")]
    ImageSizeIllegal(String),

    #[error("Image service failure: {0}")]
    RemoteFailure(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for failures a caller may retry or give up on: transport errors,
    /// rejected payloads, missing configuration and non-success statuses.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::Unavailable(_) | Error::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
