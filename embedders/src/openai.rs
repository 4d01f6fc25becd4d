use crate::error::EmbeddingError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use thiserror::Error;
use tracing::debug;

const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com";

pub const TEXT_EMBEDDING_3_LARGE: &str = "text-embedding-3-large";
pub const TEXT_EMBEDDING_3_SMALL: &str = "text-embedding-3-small";
pub const TEXT_EMBEDDING_ADA_002: &str = "text-embedding-ada-002";

pub struct OpenAiEmbeddings {
    endpoint: String,
    key: String,
    client: reqwest::Client,
}

impl OpenAiEmbeddings {
    pub fn new(api_key: &str) -> Self {
        Self {
            endpoint: DEFAULT_OPENAI_ENDPOINT.to_string(),
            key: api_key.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn list_embedding_models(&self) -> Vec<(String, usize)> {
        vec![
            (String::from(TEXT_EMBEDDING_3_LARGE), 3072),
            (String::from(TEXT_EMBEDDING_3_SMALL), 1536),
            (String::from(TEXT_EMBEDDING_ADA_002), 1536),
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

        let request = EmbeddingRequest {
            model: model.to_string(),
            input: input.iter().map(|s| s.to_string()).collect(),
        };

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.endpoint))
            .bearer_auth(&self.key)
            .json(&request)
            .send()
            .await
            .inspect_err(|e| tracing::error!("Error in OpenAI request: {e}"))?;

        if !response.status().is_success() {
            tracing::error!(
                "Request to {} failed with status {}",
                response.url(),
                response.status()
            );
            let response = match response.json::<OpenAIError>().await {
                Ok(res) => res,
                Err(e) => {
                    tracing::error!("Error reading OpenAI response: {e}");
                    tracing::error!("Source: {:?}", e.source());
                    return Err(EmbeddingError::Reqwest(e));
                }
            };
            return Err(EmbeddingError::OpenAI(response));
        }

        let response = match response.json::<EmbeddingResponse>().await {
            Ok(res) => res,
            Err(e) => {
                tracing::error!("Error decoding OpenAI response: {e}");
                tracing::error!("Source: {:?}", e.source());
                return Err(EmbeddingError::Reqwest(e));
            }
        };

        debug!(
            "Embedded {} input(s) with '{}', used tokens {}-{} (prompt-total)",
            input.len(),
            response.model,
            response.usage.prompt_tokens,
            response.usage.total_tokens
        );

        let mut data = response.data;
        data.sort_by_key(|o| o.index);

        Ok(data.into_iter().map(|o| o.embedding).collect())
    }
}

impl std::fmt::Debug for OpenAiEmbeddings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbeddings")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingObject>,
    model: String,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct EmbeddingObject {
    embedding: Vec<f64>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: usize,
    total_tokens: usize,
}

#[derive(Debug, Deserialize, Error)]
#[error("{message}, type: {r#type}, param: {param:?}, code: {code:?}")]
pub struct OpenAIErrorParams {
    pub message: String,
    pub r#type: String,
    pub param: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Deserialize, Error)]
#[error("Open AI error response {{ {error} }}")]
pub struct OpenAIError {
    pub error: OpenAIErrorParams,
}
