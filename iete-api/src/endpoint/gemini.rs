//! Endpoint client for Google Gemini API.
//!
//! Issues one `streamGenerateContent` call per request and hands back the
//! decoded event stream. Nothing is retried here.

use crate::auth::AuthProvider;
use crate::auth::add_auth_headers;
use crate::common::ResponseStream;
use crate::error::ApiError;
use crate::provider::Provider;
use crate::requests::GeminiRequest;
use crate::sse::spawn_gemini_stream;
use http::HeaderValue;
use http::Method;
use iete_client::HttpTransport;
use iete_client::Request;
use tracing::debug;

pub struct GeminiClient<T: HttpTransport, A: AuthProvider> {
    transport: T,
    provider: Provider,
    auth: A,
}

impl<T: HttpTransport, A: AuthProvider> GeminiClient<T, A> {
    pub fn new(transport: T, provider: Provider, auth: A) -> Self {
        Self {
            transport,
            provider,
            auth,
        }
    }

    /// True when a credential is configured; no request can succeed otherwise.
    pub fn has_credential(&self) -> bool {
        self.auth.api_key().is_some()
    }

    pub async fn stream_request(&self, request: GeminiRequest) -> Result<ResponseStream, ApiError> {
        let url = self.provider.stream_url_for_model(&request.model);

        let mut req = Request::new(Method::POST, url).with_json(request.body);
        req.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        // Checked before the transport is touched.
        let req = add_auth_headers(&self.auth, req)?;

        debug!(provider = %self.provider.name, model = %request.model, "starting Gemini stream");
        let stream_response = self.transport.stream(req).await?;

        Ok(spawn_gemini_stream(
            stream_response,
            self.provider.stream_idle_timeout,
        ))
    }
}
