use http::StatusCode;
use iete_api::ApiError;
use iete_api::TransportError;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub type Result<T> = std::result::Result<T, ChatError>;

/// Suggested wait after the provider throttles us.
pub const THROTTLE_RETRY_AFTER: Duration = Duration::from_secs(60);

pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

/// Terminal failure of a single chat or image request. The conversation stays
/// usable after any of these.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("rate limited by provider: {message}")]
    Throttle {
        message: String,
        retry_after: Duration,
    },

    #[error("connectivity error: {0}")]
    Connectivity(String),

    #[error("provider error: {0}")]
    Provider(String),
}

impl ChatError {
    /// Text shown to the user in place of the assistant reply.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::InvalidRequest(_) => {
                "Please type a message or attach a file before sending.".to_string()
            }
            ChatError::Auth(reason) => format!(
                "I can't reach the model because {reason}. Set the {API_KEY_ENV_VAR} environment variable (or `api_key` in config.toml) and try again."
            ),
            ChatError::Throttle { retry_after, .. } => format!(
                "The model is receiving too many requests right now. Please wait about {} seconds and try again.",
                retry_after.as_secs()
            ),
            ChatError::Connectivity(_) => {
                "I couldn't connect to the model service. Check your internet connection and try again.".to_string()
            }
            ChatError::Provider(message) => {
                format!("Sorry, something went wrong while generating a response: {message}")
            }
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ChatError::Throttle { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

fn is_throttle(status: StatusCode, code: Option<&str>) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || code == Some("RESOURCE_EXHAUSTED")
}

impl From<ApiError> for ChatError {
    fn from(err: ApiError) -> Self {
        let classified = match err {
            ApiError::MissingCredential => ChatError::Auth("no API key is configured".to_string()),
            ApiError::InvalidCredential => {
                ChatError::Auth("the configured API key is malformed".to_string())
            }
            ApiError::InvalidRequest(msg) => ChatError::InvalidRequest(msg),
            ApiError::Api {
                status,
                code,
                message,
            } if is_throttle(status, code.as_deref()) => ChatError::Throttle {
                message,
                retry_after: THROTTLE_RETRY_AFTER,
            },
            ApiError::Api { status, message, .. } => {
                ChatError::Provider(format!("{message} (HTTP {})", status.as_u16()))
            }
            ApiError::Transport(TransportError::Http { status, body })
                if status == StatusCode::TOO_MANY_REQUESTS =>
            {
                ChatError::Throttle {
                    message: body.unwrap_or_default(),
                    retry_after: THROTTLE_RETRY_AFTER,
                }
            }
            ApiError::Transport(TransportError::Network(msg)) => ChatError::Connectivity(msg),
            ApiError::Transport(TransportError::Timeout) => {
                ChatError::Connectivity("request timed out".to_string())
            }
            ApiError::IdleTimeout(after) => {
                ChatError::Connectivity(format!("no data received for {}s", after.as_secs()))
            }
            ApiError::Transport(other) => ChatError::Provider(other.to_string()),
            ApiError::Stream(msg) => ChatError::Provider(msg),
        };
        warn!(error = %classified, "request failed");
        classified
    }
}
