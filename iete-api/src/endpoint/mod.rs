pub mod gemini;
pub mod imagen;

pub use gemini::GeminiClient;
pub use imagen::ImagenClient;
