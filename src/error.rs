// src/error.rs

use thiserror::Error;

/// Failure categories of a probe run.
///
/// `Auth` is fatal and halts the run. `Provider` and `Precondition` are
/// recovered where they happen and end up as a failed strategy result.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("{call} failed: {message}")]
    Provider { call: &'static str, message: String },

    #[error("precondition not met: {0}")]
    Precondition(String),
}

impl ProbeError {
    pub fn provider(call: &'static str, message: impl Into<String>) -> Self {
        ProbeError::Provider {
            call,
            message: message.into(),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ProbeError::Auth(_))
    }

    /// Wrap a failed HTTP exchange, keeping the response body for context.
    pub fn from_http(call: &'static str, err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => {
                let body = response.into_string().unwrap_or_default();
                ProbeError::provider(call, format!("HTTP {}: {}", code, body.trim()))
            }
            ureq::Error::Transport(transport) => ProbeError::provider(call, transport.to_string()),
        }
    }
}
