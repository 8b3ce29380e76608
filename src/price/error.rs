use reqwest::StatusCode;
use thiserror::Error;

/// Poll failures. The display strings are what the view shows.
#[derive(Debug, Error)]
pub enum PriceError {
    #[error("Failed to fetch price")]
    Status(StatusCode),

    #[error("Failed to fetch price")]
    Transport(#[source] reqwest::Error),

    #[error("Invalid price data")]
    Decode(#[source] serde_json::Error),

    #[error("Invalid price data")]
    InvalidData,
}

impl PriceError {
    /// Cause for the log line. The display string stays generic.
    pub fn detail(&self) -> String {
        match self {
            PriceError::Status(status) => format!("price endpoint returned {status}"),
            PriceError::Transport(err) => format!("request failed: {err}"),
            PriceError::Decode(err) => format!("body was not JSON: {err}"),
            PriceError::InvalidData => "usd field missing, zero or non-numeric".to_string(),
        }
    }
}
