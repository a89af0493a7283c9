use std::error::Error as _;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("API error: {code} {reason}")]
    Status { code: u16, reason: String },
    #[error("{}", with_sources(.0))]
    Network(#[from] reqwest::Error),
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// reqwest keeps the interesting part (refused, dns, tls) in the source chain.
fn with_sources(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}
