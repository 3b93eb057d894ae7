//! SSE parser for Google Gemini streaming responses.
//!
//! Parses Gemini's `streamGenerateContent` SSE events into [`ResponseEvent`]s:
//! one [`ResponseEvent::Chunk`] per event, then a single
//! [`ResponseEvent::Completed`] when the provider closes the stream.

use crate::common::CitationFragment;
use crate::common::ResponseEvent;
use crate::common::ResponseStream;
use crate::common::StreamChunk;
use crate::common::TokenUsage;
use crate::error::ApiError;
use crate::error::ErrorBody;
use eventsource_stream::EventStreamError;
use eventsource_stream::Eventsource;
use futures::Stream;
use futures::StreamExt;
use http::StatusCode;
use iete_client::StreamResponse;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::debug;
use tracing::trace;

/// Finish reasons that mean the answer was withheld rather than completed.
const BLOCKED_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

pub(crate) fn spawn_gemini_stream(
    stream_response: StreamResponse,
    idle_timeout: Duration,
) -> ResponseStream {
    let (tx_event, rx_event) = mpsc::channel::<Result<ResponseEvent, ApiError>>(1600);
    tokio::spawn(async move {
        process_gemini_sse(stream_response.bytes, tx_event, idle_timeout).await;
    });
    ResponseStream { rx_event }
}

/// Gemini SSE response structure
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    usage_metadata: Option<GeminiUsageMetadata>,
    prompt_feedback: Option<GeminiPromptFeedback>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
    grounding_metadata: Option<GeminiGroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
    /// Set on reasoning summaries, which are not part of the answer.
    thought: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGroundingMetadata {
    grounding_chunks: Option<Vec<GeminiGroundingChunk>>,
}

#[derive(Debug, Deserialize)]
struct GeminiGroundingChunk {
    web: Option<GeminiWebSource>,
}

#[derive(Debug, Deserialize)]
struct GeminiWebSource {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    prompt_token_count: Option<i64>,
    candidates_token_count: Option<i64>,
    total_token_count: Option<i64>,
}

impl From<GeminiUsageMetadata> for TokenUsage {
    fn from(u: GeminiUsageMetadata) -> Self {
        TokenUsage {
            input_tokens: u.prompt_token_count.unwrap_or(0),
            output_tokens: u.candidates_token_count.unwrap_or(0),
            total_tokens: u.total_token_count.unwrap_or(0),
        }
    }
}

pub async fn process_gemini_sse<S>(
    stream: S,
    tx_event: mpsc::Sender<Result<ResponseEvent, ApiError>>,
    idle_timeout: Duration,
) where
    S: Stream<Item = Result<bytes::Bytes, iete_client::TransportError>> + Unpin,
{
    let mut stream = stream.eventsource();
    let mut last_usage: Option<GeminiUsageMetadata> = None;

    loop {
        let sse = match timeout(idle_timeout, stream.next()).await {
            Ok(Some(Ok(sse))) => sse,
            Ok(Some(Err(EventStreamError::Transport(err)))) => {
                // Dropped connections must stay classifiable as network errors.
                let _ = tx_event.send(Err(ApiError::from(err))).await;
                return;
            }
            Ok(Some(Err(e))) => {
                let _ = tx_event.send(Err(ApiError::Stream(e.to_string()))).await;
                return;
            }
            Ok(None) => {
                let _ = tx_event
                    .send(Ok(ResponseEvent::Completed {
                        token_usage: last_usage.map(TokenUsage::from),
                    }))
                    .await;
                return;
            }
            Err(_) => {
                let _ = tx_event.send(Err(ApiError::IdleTimeout(idle_timeout))).await;
                return;
            }
        };

        trace!("Gemini SSE event: {}", sse.data);

        if sse.data.trim().is_empty() {
            continue;
        }

        let gemini_response: GeminiResponse = match serde_json::from_str(&sse.data) {
            Ok(val) => val,
            Err(err) => {
                debug!(
                    "Failed to parse Gemini SSE event: {err}, data: {}",
                    &sse.data
                );
                continue;
            }
        };

        if let Some(error) = gemini_response.error {
            let _ = tx_event
                .send(Err(error.into_api_error(StatusCode::INTERNAL_SERVER_ERROR)))
                .await;
            return;
        }

        if let Some(reason) = gemini_response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
        {
            let _ = tx_event
                .send(Err(ApiError::Stream(format!(
                    "Prompt blocked by the provider ({reason})"
                ))))
                .await;
            return;
        }

        if let Some(usage) = gemini_response.usage_metadata {
            last_usage = Some(usage);
        }

        let mut chunk = StreamChunk::default();
        let mut blocked: Option<String> = None;

        for candidate in gemini_response.candidates.unwrap_or_default() {
            // Content first, so text preceding a block is still delivered.
            if let Some(parts) = candidate.content.and_then(|c| c.parts) {
                for part in parts {
                    if part.thought == Some(true) {
                        continue;
                    }
                    if let Some(text) = part.text {
                        chunk.text.push_str(&text);
                    }
                }
            }

            if let Some(grounding) = candidate
                .grounding_metadata
                .and_then(|g| g.grounding_chunks)
            {
                chunk.citations.extend(
                    grounding
                        .into_iter()
                        .filter_map(|g| g.web)
                        .map(|web| CitationFragment {
                            title: web.title,
                            uri: web.uri,
                        }),
                );
            }

            if let Some(reason) = candidate.finish_reason {
                if BLOCKED_FINISH_REASONS.contains(&reason.as_str()) {
                    blocked = Some(reason);
                } else {
                    debug!("Gemini finish reason: {}", reason);
                }
            }
        }

        if tx_event.send(Ok(ResponseEvent::Chunk(chunk))).await.is_err() {
            // Receiver dropped; nobody is listening any more.
            return;
        }

        if let Some(reason) = blocked {
            let _ = tx_event
                .send(Err(ApiError::Stream(format!(
                    "Response blocked by safety filters ({reason})"
                ))))
                .await;
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use futures::TryStreamExt;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tokio::sync::mpsc;
    use tokio_util::io::ReaderStream;

    fn build_body(events: &[serde_json::Value]) -> String {
        let mut body = String::new();
        for e in events {
            body.push_str(&format!("data: {e}\n\n"));
        }
        body
    }

    async fn collect_results(body: &str) -> Vec<Result<ResponseEvent, ApiError>> {
        let reader = ReaderStream::new(std::io::Cursor::new(body.to_string()))
            .map_err(|err| iete_client::TransportError::Network(err.to_string()));
        let (tx, mut rx) = mpsc::channel::<Result<ResponseEvent, ApiError>>(16);
        tokio::spawn(process_gemini_sse(reader, tx, Duration::from_millis(1000)));

        let mut out = Vec::new();
        while let Some(ev) = rx.recv().await {
            out.push(ev);
        }
        out
    }

    async fn collect_events(body: &str) -> Vec<ResponseEvent> {
        collect_results(body)
            .await
            .into_iter()
            .map(|ev| ev.expect("stream error"))
            .collect()
    }

    fn text_chunk(text: &str) -> ResponseEvent {
        ResponseEvent::Chunk(StreamChunk {
            text: text.to_string(),
            citations: Vec::new(),
        })
    }

    #[tokio::test]
    async fn parses_text_response() {
        let chunk1 = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "Hello, "}]
                }
            }]
        });

        let chunk2 = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "world!"}]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 10,
                "candidatesTokenCount": 5,
                "totalTokenCount": 15
            }
        });

        let events = collect_events(&build_body(&[chunk1, chunk2])).await;

        assert_eq!(
            events,
            vec![
                text_chunk("Hello, "),
                text_chunk("world!"),
                ResponseEvent::Completed {
                    token_usage: Some(TokenUsage {
                        input_tokens: 10,
                        output_tokens: 5,
                        total_tokens: 15,
                    }),
                },
            ]
        );
    }

    #[tokio::test]
    async fn extracts_grounding_chunks() {
        let chunk = json!({
            "candidates": [{
                "content": {"parts": [{"text": "It rained."}]},
                "groundingMetadata": {
                    "groundingChunks": [
                        {"web": {"uri": "https://a.example", "title": "A"}},
                        {"web": {"title": "no uri"}},
                        {"retrievedContext": {}}
                    ]
                }
            }]
        });

        let events = collect_events(&build_body(&[chunk])).await;

        assert_eq!(
            events[0],
            ResponseEvent::Chunk(StreamChunk {
                text: "It rained.".to_string(),
                citations: vec![
                    CitationFragment {
                        title: Some("A".to_string()),
                        uri: Some("https://a.example".to_string()),
                    },
                    CitationFragment {
                        title: Some("no uri".to_string()),
                        uri: None,
                    },
                ],
            })
        );
    }

    #[tokio::test]
    async fn skips_thought_parts() {
        let chunk = json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "answer"}
                ]}
            }]
        });

        let events = collect_events(&build_body(&[chunk])).await;
        assert_eq!(events[0], text_chunk("answer"));
    }

    #[tokio::test]
    async fn empty_stream_only_completes() {
        let events = collect_events("").await;
        assert_eq!(events, vec![ResponseEvent::Completed { token_usage: None }]);
    }

    #[tokio::test]
    async fn ignores_unparseable_events() {
        let body = format!(
            "data: not json\n\n{}",
            build_body(&[json!({"candidates": [{"content": {"parts": [{"text": "ok"}]}}]})])
        );
        let events = collect_events(&body).await;
        assert_eq!(events[0], text_chunk("ok"));
    }

    #[tokio::test]
    async fn safety_finish_reason_ends_with_error() {
        let chunk = json!({
            "candidates": [{
                "content": {"parts": [{"text": "partial"}]},
                "finishReason": "SAFETY"
            }]
        });

        let results = collect_results(&build_body(&[chunk])).await;
        assert_eq!(results.len(), 2);
        assert_matches!(&results[0], Ok(ResponseEvent::Chunk(c)) if c.text == "partial");
        assert_matches!(&results[1], Err(ApiError::Stream(msg)) if msg.contains("SAFETY"));
    }

    #[tokio::test]
    async fn embedded_error_event_maps_to_api_error() {
        let event = json!({
            "error": {"code": 429, "message": "Resource exhausted", "status": "RESOURCE_EXHAUSTED"}
        });

        let results = collect_results(&build_body(&[event])).await;
        assert_matches!(
            &results[..],
            [Err(ApiError::Api { status, code: Some(code), .. })]
            if *status == StatusCode::TOO_MANY_REQUESTS && code == "RESOURCE_EXHAUSTED"
        );
    }

    #[tokio::test]
    async fn body_failure_mid_stream_keeps_transport_error() {
        let first = build_body(&[json!({"candidates": [{"content": {"parts": [{"text": "hi"}]}}]})]);
        let body = futures::stream::iter(vec![
            Ok(bytes::Bytes::from(first)),
            Err(iete_client::TransportError::Network(
                "connection reset by peer".to_string(),
            )),
        ]);
        let (tx, mut rx) = mpsc::channel::<Result<ResponseEvent, ApiError>>(4);
        tokio::spawn(process_gemini_sse(body, tx, Duration::from_millis(1000)));

        assert_matches!(rx.recv().await, Some(Ok(ResponseEvent::Chunk(c))) if c.text == "hi");
        assert_matches!(
            rx.recv().await,
            Some(Err(ApiError::Transport(
                iete_client::TransportError::Network(_)
            )))
        );
    }

    #[tokio::test]
    async fn idle_stream_times_out() {
        let pending = futures::stream::pending::<Result<bytes::Bytes, iete_client::TransportError>>();
        let (tx, mut rx) = mpsc::channel::<Result<ResponseEvent, ApiError>>(4);
        tokio::spawn(process_gemini_sse(pending, tx, Duration::from_millis(20)));

        assert_matches!(rx.recv().await, Some(Err(ApiError::IdleTimeout(_))));
    }
}
