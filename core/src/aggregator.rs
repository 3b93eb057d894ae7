//! Folds streamed chunks into a running [`StreamResult`].

use iete_api::StreamChunk;
use iete_protocol::models::Citation;
use indexmap::IndexMap;

/// Accumulated output of one request: the text so far and the sources cited
/// so far, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamResult {
    text: String,
    sources: IndexMap<String, Citation>,
}

impl StreamResult {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sources(&self) -> impl ExactSizeIterator<Item = &Citation> {
        self.sources.values()
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

#[derive(Debug, Default)]
pub struct StreamAggregator {
    result: StreamResult,
}

impl StreamAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the delta and merges citations by URI, keeping the first title
    /// seen. Fragments without a URI are dropped.
    pub fn apply(&mut self, chunk: StreamChunk) -> &StreamResult {
        self.result.text.push_str(&chunk.text);
        for fragment in chunk.citations {
            let Some(uri) = fragment.uri.filter(|u| !u.is_empty()) else {
                continue;
            };
            self.result.sources.entry(uri.clone()).or_insert_with(|| Citation {
                title: fragment.title.unwrap_or_else(|| uri.clone()),
                uri,
            });
        }
        &self.result
    }

    pub fn result(&self) -> &StreamResult {
        &self.result
    }

    pub fn finish(self) -> StreamResult {
        self.result
    }
}
