//! Endpoint client for single-shot image generation.

use crate::auth::AuthProvider;
use crate::auth::add_auth_headers;
use crate::error::ApiError;
use crate::provider::Provider;
use crate::requests::AspectRatio;
use crate::requests::ImagenRequestBuilder;
use http::HeaderValue;
use http::Method;
use iete_client::HttpTransport;
use iete_client::Request;
use iete_protocol::models::Media;
use serde::Deserialize;
use tracing::debug;

const DEFAULT_IMAGE_MIME: &str = "image/png";

pub struct ImagenClient<T: HttpTransport, A: AuthProvider> {
    transport: T,
    provider: Provider,
    auth: A,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

impl<T: HttpTransport, A: AuthProvider> ImagenClient<T, A> {
    pub fn new(transport: T, provider: Provider, auth: A) -> Self {
        Self {
            transport,
            provider,
            auth,
        }
    }

    /// Returns `Ok(None)` when the provider answers without an image, e.g.
    /// because every sample was filtered.
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<Option<Media>, ApiError> {
        let body = ImagenRequestBuilder::new(prompt)
            .aspect_ratio(aspect_ratio)
            .build()?;

        let mut req = Request::new(Method::POST, self.provider.predict_url_for_model(model))
            .with_json(body);
        req.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        let req = add_auth_headers(&self.auth, req)?;

        debug!(model, %aspect_ratio, "requesting image generation");
        let response = self.transport.execute(req).await?;

        let parsed: PredictResponse = serde_json::from_slice(&response.body)
            .map_err(|e| ApiError::Stream(format!("Failed to parse image response: {e}")))?;

        Ok(parsed.predictions.into_iter().find_map(|p| {
            let data = p.bytes_base64_encoded.filter(|d| !d.is_empty())?;
            Some(Media::new(
                data,
                p.mime_type.unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string()),
            ))
        }))
    }
}
