//! Request builder for Google Gemini API.
//!
//! Converts conversation turns into Gemini's `contents[].parts[]` format.

use crate::error::ApiError;
use iete_protocol::models::Part;
use iete_protocol::models::Role;
use iete_protocol::models::Turn;
use serde_json::Value;
use serde_json::json;

/// Assembled request body for Gemini streaming calls.
#[derive(Debug, Clone)]
pub struct GeminiRequest {
    pub body: Value,
    /// Model name to use in the URL path (e.g., "gemini-2.5-flash").
    pub model: String,
}

/// Sampling parameters, fixed per deployment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f64,
    pub max_output_tokens: Option<u32>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: None,
        }
    }
}

pub struct GeminiRequestBuilder<'a> {
    model: &'a str,
    instructions: &'a str,
    history: &'a [Turn],
    turn: &'a Turn,
    params: GenerationParams,
    use_search: bool,
}

impl<'a> GeminiRequestBuilder<'a> {
    pub fn new(model: &'a str, instructions: &'a str, history: &'a [Turn], turn: &'a Turn) -> Self {
        Self {
            model,
            instructions,
            history,
            turn,
            params: GenerationParams::default(),
            use_search: false,
        }
    }

    pub fn params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn use_search(mut self, enabled: bool) -> Self {
        self.use_search = enabled;
        self
    }

    pub fn build(self) -> Result<GeminiRequest, ApiError> {
        let new_content = turn_to_content(self.turn).ok_or_else(|| {
            ApiError::InvalidRequest("the new turn has no text or media".to_string())
        })?;

        let mut contents: Vec<Value> = self.history.iter().filter_map(turn_to_content).collect();
        contents.push(new_content);

        let mut generation_config = json!({
            "temperature": self.params.temperature,
        });
        if let Some(max) = self.params.max_output_tokens {
            generation_config["maxOutputTokens"] = json!(max);
        }

        let mut body = json!({
            "contents": contents,
            "generationConfig": generation_config,
        });

        if !self.instructions.is_empty() {
            body["systemInstruction"] = json!({
                "parts": [{
                    "text": self.instructions
                }]
            });
        }

        if self.use_search {
            body["tools"] = json!([{ "googleSearch": {} }]);
        }

        Ok(GeminiRequest {
            body,
            model: self.model.to_string(),
        })
    }
}

fn map_role_to_gemini(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

/// Returns `None` for turns with nothing to send, e.g. an empty reply.
fn turn_to_content(turn: &Turn) -> Option<Value> {
    let parts: Vec<Value> = turn
        .parts()
        .iter()
        .filter_map(|part| match part {
            Part::Text { text } if text.is_empty() => None,
            Part::Text { text } => Some(json!({ "text": text })),
            Part::Media(media) => Some(json!({
                "inlineData": {
                    "mimeType": media.mime_type,
                    "data": media.data
                }
            })),
        })
        .collect();

    if parts.is_empty() {
        return None;
    }
    Some(json!({
        "role": map_role_to_gemini(turn.role()),
        "parts": parts
    }))
}
