//! Embedding provider implementations.

pub mod gemini;
pub mod mock;
pub mod ollama;

pub use gemini::GeminiEmbeddingProvider;
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
