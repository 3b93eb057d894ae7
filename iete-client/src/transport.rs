use crate::error::TransportError;
use crate::request::Request;
use crate::request::Response;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use http::HeaderMap;
use http::StatusCode;
use tracing::debug;

pub type ByteStream = BoxStream<'static, Result<Bytes, TransportError>>;

pub struct StreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: ByteStream,
}

/// Minimal HTTP surface the API layer needs. Implementations must report
/// non-success statuses as [`TransportError::Http`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, req: Request) -> Result<Response, TransportError>;
    async fn stream(&self, req: Request) -> Result<StreamResponse, TransportError>;
}

#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build(&self, req: Request) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(req.method, &req.url)
            .headers(req.headers);
        if let Some(body) = req.body {
            builder = builder.json(&body);
        }
        builder
    }

    async fn send(&self, req: Request) -> Result<reqwest::Response, TransportError> {
        debug!(method = %req.method, url = %req.url, "sending request");
        let resp = self.build(req).send().await.map_err(map_error)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.ok();
        Err(TransportError::Http { status, body })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, req: Request) -> Result<Response, TransportError> {
        let resp = self.send(req).await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await.map_err(map_error)?;
        Ok(Response {
            status,
            headers,
            body,
        })
    }

    async fn stream(&self, req: Request) -> Result<StreamResponse, TransportError> {
        let resp = self.send(req).await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.bytes_stream().map(|r| r.map_err(map_error)).boxed();
        Ok(StreamResponse {
            status,
            headers,
            bytes,
        })
    }
}

fn map_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_builder() {
        TransportError::Build(err.to_string())
    } else {
        TransportError::Network(err.to_string())
    }
}
