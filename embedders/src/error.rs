use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[cfg(feature = "ollama")]
    #[error("ollama: {0}")]
    Ollama(#[from] crate::ollama::OllamaError),

    #[cfg(feature = "openai")]
    #[error("openai: {0}")]
    OpenAI(#[from] crate::openai::OpenAIError),

    #[cfg(any(feature = "openai", feature = "ollama"))]
    #[error("http client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}
