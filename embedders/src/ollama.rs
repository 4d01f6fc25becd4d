use crate::error::EmbeddingError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use thiserror::Error;
use tracing::debug;

pub const MXBAI_EMBED_LARGE: &str = "mxbai-embed-large";
pub const NOMIC_EMBED_TEXT: &str = "nomic-embed-text";
pub const ALL_MINILM: &str = "all-minilm";
pub const SNOWFLAKE_ARCTIC_EMBED: &str = "snowflake-arctic-embed";

/// Embedding client for the `/api/embed` endpoint of an Ollama server.
///
/// Ollama can serve any model that was pulled into it, so the list of models
/// here only covers the common embedding models whose sizes are known upfront.
pub struct OllamaEmbeddings {
    endpoint: String,
    client: reqwest::Client,
}

impl OllamaEmbeddings {
    pub fn new(endpoint: &str) -> Self {
        tracing::info!("Initializing Ollama embeddings at {endpoint}");
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn list_embedding_models(&self) -> Vec<(String, usize)> {
        vec![
            (String::from(MXBAI_EMBED_LARGE), 1024),
            (String::from(NOMIC_EMBED_TEXT), 768),
            (String::from(ALL_MINILM), 384),
            (String::from(SNOWFLAKE_ARCTIC_EMBED), 1024),
        ]
    }

    pub async fn embed(
        &self,
        input: &[&str],
        model: &str,
    ) -> Result<Vec<Vec<f64>>, EmbeddingError> {
        if input.is_empty() {
            return Err(EmbeddingError::InvalidInput(format!(
                "cannot be empty (len = {})",
                input.len()
            )));
        }

        let request = EmbedRequest {
            model,
            input: input.to_vec(),
        };

        let response = self
            .client
            .post(format!("{}/api/embed", self.endpoint))
            .json(&request)
            .send()
            .await
            .inspect_err(|e| tracing::error!("Error in Ollama request: {e}"))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!("Request to {} failed with status {status}", response.url());
            return match response.json::<OllamaError>().await {
                Ok(error) if error.error.contains("not found") => {
                    Err(EmbeddingError::InvalidModel(error.error))
                }
                Ok(error) => Err(EmbeddingError::Ollama(error)),
                Err(e) => {
                    tracing::error!("Error reading Ollama response: {e}");
                    tracing::error!("Source: {:?}", e.source());
                    Err(EmbeddingError::Reqwest(e))
                }
            };
        }

        let response = match response.json::<EmbedResponse>().await {
            Ok(res) => res,
            Err(e) => {
                tracing::error!("Error decoding Ollama response: {e}");
                tracing::error!("Source: {:?}", e.source());
                return Err(EmbeddingError::Reqwest(e));
            }
        };

        debug!(
            "Embedded {} input(s) with '{}'",
            input.len(),
            response.model
        );

        if response.embeddings.len() != input.len() {
            return Err(EmbeddingError::InvalidInput(format!(
                "expected {} embeddings, got {}",
                input.len(),
                response.embeddings.len()
            )));
        }

        Ok(response.embeddings)
    }
}

impl std::fmt::Debug for OllamaEmbeddings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaEmbeddings")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    model: String,
    embeddings: Vec<Vec<f64>>,
}

/// The error body Ollama responds with on non-2xx statuses.
#[derive(Debug, Deserialize, Error)]
#[error("Ollama error response {{ {error} }}")]
pub struct OllamaError {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::OllamaEmbeddings;
    use crate::error::EmbeddingError;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn ollama(status: StatusCode, body: Value) -> OllamaEmbeddings {
        let router = Router::new().route(
            "/api/embed",
            post(move || async move { (status, Json(body)) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        OllamaEmbeddings::new(&format!("http://{addr}"))
    }

    #[tokio::test]
    async fn embeds_every_input() {
        let ollama = ollama(
            StatusCode::OK,
            json!({ "model": "all-minilm", "embeddings": [[0.1, 0.2], [0.3, 0.4]] }),
        )
        .await;

        let embeddings = ollama.embed(&["a", "b"], "all-minilm").await.unwrap();
        assert_eq!(vec![vec![0.1, 0.2], vec![0.3, 0.4]], embeddings);
    }

    #[tokio::test]
    async fn missing_embeddings_are_invalid_input() {
        let ollama = ollama(
            StatusCode::OK,
            json!({ "model": "all-minilm", "embeddings": [[0.1, 0.2]] }),
        )
        .await;

        let err = ollama.embed(&["a", "b"], "all-minilm").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn unknown_model_is_invalid() {
        let ollama = ollama(
            StatusCode::NOT_FOUND,
            json!({ "error": "model \"nope\" not found, try pulling it first" }),
        )
        .await;

        let err = ollama.embed(&["a"], "nope").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidModel(_)));
    }

    #[tokio::test]
    async fn other_errors_are_passed_through() {
        let ollama = ollama(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "out of memory" }),
        )
        .await;

        let err = ollama.embed(&["a"], "all-minilm").await.unwrap_err();
        let EmbeddingError::Ollama(e) = err else {
            panic!("expected an Ollama error, got {err}");
        };
        assert_eq!("out of memory", e.error);
    }

    #[tokio::test]
    async fn empty_input_is_rejected_upfront() {
        let ollama = OllamaEmbeddings::new("http://127.0.0.1:9");
        let err = ollama.embed(&[], "all-minilm").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidInput(_)));
    }
}
