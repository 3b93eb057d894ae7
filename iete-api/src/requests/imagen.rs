//! Request builder for the Imagen `predict` endpoint.

use crate::error::ApiError;
use serde_json::Value;
use serde_json::json;
use std::fmt;
use std::str::FromStr;

/// Aspect ratios accepted by the image model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AspectRatio {
    #[default]
    Square,
    Portrait,
    Landscape,
    Tall,
    Wide,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Portrait,
        AspectRatio::Landscape,
        AspectRatio::Tall,
        AspectRatio::Wide,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "3:4",
            AspectRatio::Landscape => "4:3",
            AspectRatio::Tall => "9:16",
            AspectRatio::Wide => "16:9",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AspectRatio::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == s.trim())
            .ok_or_else(|| ApiError::InvalidRequest(format!("unsupported aspect ratio `{s}`")))
    }
}

pub struct ImagenRequestBuilder<'a> {
    prompt: &'a str,
    aspect_ratio: AspectRatio,
}

impl<'a> ImagenRequestBuilder<'a> {
    pub fn new(prompt: &'a str) -> Self {
        Self {
            prompt,
            aspect_ratio: AspectRatio::default(),
        }
    }

    pub fn aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn build(self) -> Result<Value, ApiError> {
        if self.prompt.trim().is_empty() {
            return Err(ApiError::InvalidRequest(
                "image prompt must not be empty".to_string(),
            ));
        }
        Ok(json!({
            "instances": [{ "prompt": self.prompt }],
            "parameters": {
                "sampleCount": 1,
                "aspectRatio": self.aspect_ratio.as_str(),
            }
        }))
    }
}
