pub mod gemini;
pub mod imagen;

pub use gemini::GeminiRequest;
pub use gemini::GeminiRequestBuilder;
pub use gemini::GenerationParams;
pub use imagen::AspectRatio;
pub use imagen::ImagenRequestBuilder;
