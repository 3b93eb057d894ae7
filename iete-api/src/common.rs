use crate::error::ApiError;
use futures::Stream;
use std::pin::Pin;
use std::task::Context;
use std::task::Poll;
use tokio::sync::mpsc;

/// Grounding reference as reported by the provider. Either field may be
/// missing; consumers decide what is usable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationFragment {
    pub title: Option<String>,
    pub uri: Option<String>,
}

/// One decoded event of the generation stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamChunk {
    /// Text delta; empty when the event only carried metadata.
    pub text: String,
    pub citations: Vec<CitationFragment>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub total_tokens: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseEvent {
    Chunk(StreamChunk),
    Completed { token_usage: Option<TokenUsage> },
}

#[derive(Debug)]
pub struct ResponseStream {
    pub(crate) rx_event: mpsc::Receiver<Result<ResponseEvent, ApiError>>,
}

impl Stream for ResponseStream {
    type Item = Result<ResponseEvent, ApiError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx_event.poll_recv(cx)
    }
}
