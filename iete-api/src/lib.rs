//! Client for the Gemini generative-language REST API as used by IETE Bot:
//! streamed chat completions with optional search grounding, and single-shot
//! image generation.

pub mod auth;
pub mod common;
pub mod endpoint;
pub mod error;
pub mod provider;
pub mod requests;
pub mod sse;

pub use crate::auth::ApiKeyAuth;
pub use crate::auth::AuthProvider;
pub use crate::common::CitationFragment;
pub use crate::common::ResponseEvent;
pub use crate::common::ResponseStream;
pub use crate::common::StreamChunk;
pub use crate::common::TokenUsage;
pub use crate::endpoint::GeminiClient;
pub use crate::endpoint::ImagenClient;
pub use crate::error::ApiError;
pub use crate::provider::Provider;
pub use crate::requests::AspectRatio;
pub use crate::requests::GeminiRequest;
pub use crate::requests::GeminiRequestBuilder;
pub use crate::requests::GenerationParams;
pub use crate::requests::ImagenRequestBuilder;
pub use crate::sse::process_gemini_sse;
pub use iete_client::HttpTransport;
pub use iete_client::ReqwestTransport;
pub use iete_client::TransportError;
