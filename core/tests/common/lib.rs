//! Test doubles shared by the `iete-core` integration tests.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use http::HeaderMap;
use http::StatusCode;
use iete_client::HttpTransport;
use iete_client::Request;
use iete_client::Response;
use iete_client::StreamResponse;
use iete_client::TransportError;
use serde_json::Value;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

/// Canned answer for the next transport call.
pub enum Reply {
    /// Successful SSE body delivered in the given byte pieces.
    Sse(Vec<String>),
    /// SSE body whose connection fails after the given pieces.
    Broken {
        pieces: Vec<String>,
        error: TransportError,
    },
    /// Successful buffered JSON body.
    Json(Value),
    Fail(TransportError),
}

impl Reply {
    pub fn sse(events: &[Value]) -> Self {
        Reply::Sse(vec![sse_body(events)])
    }

    pub fn status(status: u16, body: Value) -> Self {
        Reply::Fail(TransportError::Http {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body: Some(body.to_string()),
        })
    }
}

/// Transport that records every request and answers from a queue.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    requests: Arc<Mutex<Vec<Request>>>,
    replies: Arc<Mutex<VecDeque<Reply>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, reply: Reply) -> &Self {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// JSON body of the most recent request.
    pub fn last_body(&self) -> Option<Value> {
        self.requests().last().and_then(|r| r.body.clone())
    }

    fn record(&self, req: Request) -> Option<Reply> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(req);
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

fn unexpected_call() -> TransportError {
    TransportError::Network("no reply queued for this call".to_string())
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn execute(&self, req: Request) -> Result<Response, TransportError> {
        match self.record(req) {
            Some(Reply::Json(value)) => Ok(Response {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body: Bytes::from(value.to_string()),
            }),
            Some(Reply::Fail(err)) => Err(err),
            Some(Reply::Sse(_) | Reply::Broken { .. }) | None => Err(unexpected_call()),
        }
    }

    async fn stream(&self, req: Request) -> Result<StreamResponse, TransportError> {
        match self.record(req) {
            Some(Reply::Sse(pieces)) => Ok(StreamResponse {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                bytes: futures::stream::iter(pieces.into_iter().map(|p| Ok(Bytes::from(p))))
                    .boxed(),
            }),
            Some(Reply::Broken { pieces, error }) => Ok(StreamResponse {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                bytes: futures::stream::iter(
                    pieces
                        .into_iter()
                        .map(|p| Ok(Bytes::from(p)))
                        .chain(std::iter::once(Err(error))),
                )
                .boxed(),
            }),
            Some(Reply::Fail(err)) => Err(err),
            Some(Reply::Json(_)) | None => Err(unexpected_call()),
        }
    }
}

pub fn sse_body(events: &[Value]) -> String {
    events.iter().map(|e| format!("data: {e}\n\n")).collect()
}

pub fn text_event(text: &str) -> Value {
    json!({"candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]})
}

/// Event carrying a text delta plus `(title, uri)` grounding sources.
pub fn grounded_event(text: &str, sources: &[(&str, &str)]) -> Value {
    let chunks: Vec<Value> = sources
        .iter()
        .map(|(title, uri)| json!({"web": {"title": title, "uri": uri}}))
        .collect();
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "groundingMetadata": {"groundingChunks": chunks}
        }]
    })
}
