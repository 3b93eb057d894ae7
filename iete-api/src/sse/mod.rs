pub mod gemini;

pub(crate) use gemini::spawn_gemini_stream;
pub use gemini::process_gemini_sse;
