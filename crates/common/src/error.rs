use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Why a single exchange failed to produce a price
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("create request: {0}")]
    Request(String),

    #[error("do request: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    /// Exchange-native error envelope
    #[error("code={code}, msg={msg}")]
    Exchange { code: String, msg: String },

    #[error("unexpected status code: {status}, body: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("decode response: {0}")]
    Decode(String),

    #[error("empty response")]
    EmptyResult,

    #[error("parse price: invalid value {0:?}")]
    InvalidPrice(String),
}

impl FetchError {
    /// Machine code supplied by the exchange, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            FetchError::Exchange { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout)
    }
}

/// Every configured exchange failed for one request.
///
/// `errors` holds one `"<exchange>: <reason>"` entry per exchange, in the
/// order the failures arrived.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateFailure {
    pub message: String,
    pub errors: Vec<String>,
}

impl AggregateFailure {
    pub const ALL_FAILED: &'static str = "all exchanges failed";
    pub const ALL_TIMED_OUT: &'static str = "all exchanges timed out";

    pub fn all_failed(errors: Vec<String>) -> Self {
        Self {
            message: Self::ALL_FAILED.to_string(),
            errors,
        }
    }

    pub fn all_timed_out(errors: Vec<String>) -> Self {
        Self {
            message: Self::ALL_TIMED_OUT.to_string(),
            errors,
        }
    }

    /// JSON body rendered to clients
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"message\":\"{}\"}}", self.message))
    }
}

impl fmt::Display for AggregateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

/// Race-level failure, produced only when no exchange succeeded
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RaceError {
    #[error("{0}")]
    AllFailed(AggregateFailure),

    /// Every exchange ran out the shared deadline
    #[error("{0}")]
    DeadlineExceeded(AggregateFailure),
}

impl RaceError {
    pub fn failure(&self) -> &AggregateFailure {
        match self {
            RaceError::AllFailed(failure) | RaceError::DeadlineExceeded(failure) => failure,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
