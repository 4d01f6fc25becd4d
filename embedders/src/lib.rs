//! HTTP clients for the embedding APIs grounded can embed records and questions with.

pub mod error;

/// Client for a local or remote Ollama server.
#[cfg(feature = "ollama")]
pub mod ollama;

/// Client for the OpenAI embeddings API.
#[cfg(feature = "openai")]
pub mod openai;
