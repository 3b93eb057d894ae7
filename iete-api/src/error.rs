use http::StatusCode;
use iete_client::TransportError;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(TransportError),
    #[error("no API key configured")]
    MissingCredential,
    #[error("configured API key is not a valid header value")]
    InvalidCredential,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("api error {status}: {message}")]
    Api {
        status: StatusCode,
        /// Symbolic status reported by the provider, e.g. `RESOURCE_EXHAUSTED`.
        code: Option<String>,
        message: String,
    },
    #[error("no stream data received for {0:?}")]
    IdleTimeout(Duration),
    #[error("stream error: {0}")]
    Stream(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status(),
            _ => None,
        }
    }
}

/// Error envelope used by the Gemini API, both for failed HTTP responses and
/// for error events embedded in a stream.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub(crate) error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub(crate) code: Option<u16>,
    pub(crate) message: Option<String>,
    pub(crate) status: Option<String>,
}

impl ErrorBody {
    pub(crate) fn into_api_error(self, fallback_status: StatusCode) -> ApiError {
        let status = self
            .code
            .and_then(|c| StatusCode::from_u16(c).ok())
            .unwrap_or(fallback_status);
        ApiError::Api {
            status,
            code: self.status,
            message: self.message.unwrap_or_else(|| status.to_string()),
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Http { status, body } => {
                let envelope = body
                    .as_deref()
                    .and_then(|b| serde_json::from_str::<ErrorEnvelope>(b).ok());
                match envelope {
                    Some(envelope) => envelope.error.into_api_error(status),
                    None => ApiError::Api {
                        status,
                        code: None,
                        message: body
                            .filter(|b| !b.trim().is_empty())
                            .unwrap_or_else(|| status.to_string()),
                    },
                }
            }
            other => ApiError::Transport(other),
        }
    }
}
