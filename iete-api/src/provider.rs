use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Where and how to reach the model provider.
#[derive(Debug, Clone)]
pub struct Provider {
    pub name: String,
    pub base_url: String,
    /// Longest gap tolerated between two stream events.
    pub stream_idle_timeout: Duration,
}

impl Provider {
    pub fn gemini(base_url: impl Into<String>, stream_idle_timeout: Duration) -> Self {
        Self {
            name: "gemini".to_string(),
            base_url: base_url.into(),
            stream_idle_timeout,
        }
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{base}/models/{model}:{method}")
    }

    /// Server-sent-events variant of `generateContent`.
    pub fn stream_url_for_model(&self, model: &str) -> String {
        format!("{}?alt=sse", self.model_url(model, "streamGenerateContent"))
    }

    /// Imagen `predict` endpoint.
    pub fn predict_url_for_model(&self, model: &str) -> String {
        self.model_url(model, "predict")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn provider() -> Provider {
        Provider::gemini(DEFAULT_BASE_URL, Duration::from_secs(30))
    }

    #[test]
    fn constructs_stream_url() {
        assert_eq!(
            provider().stream_url_for_model("gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn constructs_predict_url_with_custom_base() {
        let mut p = provider();
        p.base_url = "https://ai-gateway.example.com/google/v1beta/".to_string();
        assert_eq!(
            p.predict_url_for_model("imagen-3.0-generate-002"),
            "https://ai-gateway.example.com/google/v1beta/models/imagen-3.0-generate-002:predict"
        );
    }
}
