use crate::error::ApiError;
use http::HeaderValue;
use iete_client::Request;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Source of the provider credential.
pub trait AuthProvider: Send + Sync {
    fn api_key(&self) -> Option<&str>;
}

/// Static API key, absent when nothing was configured.
#[derive(Clone, Default)]
pub struct ApiKeyAuth {
    key: Option<String>,
}

impl ApiKeyAuth {
    /// Blank keys are treated as missing.
    pub fn new(key: Option<String>) -> Self {
        let key = key.filter(|k| !k.trim().is_empty());
        Self { key }
    }
}

impl std::fmt::Debug for ApiKeyAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuth")
            .field("key", &self.key.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl AuthProvider for ApiKeyAuth {
    fn api_key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

/// Fails with [`ApiError::MissingCredential`] when no key is available so
/// callers never reach the network without one.
pub(crate) fn require_api_key<A: AuthProvider>(auth: &A) -> Result<HeaderValue, ApiError> {
    let key = auth.api_key().ok_or(ApiError::MissingCredential)?;
    let mut value = HeaderValue::from_str(key).map_err(|_| ApiError::InvalidCredential)?;
    value.set_sensitive(true);
    Ok(value)
}

pub(crate) fn add_auth_headers<A: AuthProvider>(
    auth: &A,
    mut req: Request,
) -> Result<Request, ApiError> {
    let value = require_api_key(auth)?;
    req.headers.insert(API_KEY_HEADER, value);
    Ok(req)
}
