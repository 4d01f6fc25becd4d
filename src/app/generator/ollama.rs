use crate::{core::generator::Generator, err, error::GroundedError, map_err};
use grounded_embedders::ollama::OllamaError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use tracing::debug;

/// Answers prompts with the `/api/generate` endpoint of an Ollama server.
pub struct OllamaGenerator {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaGenerator {
    pub fn new(endpoint: &str, model: &str) -> Self {
        tracing::info!("Initializing Ollama generator '{model}' at {endpoint}");
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl Generator for OllamaGenerator {
    fn id(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, GroundedError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = map_err!(
            self.client
                .post(format!("{}/api/generate", self.endpoint))
                .json(&request)
                .send()
                .await
        );

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!("Request to {} failed with status {status}", response.url());
            return match response.json::<OllamaError>().await {
                Ok(e) => err!(Generation, "{status}: {}", e.error),
                Err(e) => {
                    tracing::error!("Source: {:?}", e.source());
                    err!(Generation, "{status}: unreadable error response")
                }
            };
        }

        let response = map_err!(response.json::<GenerateResponse>().await);

        if !response.done {
            return err!(Generation, "'{}' returned an incomplete answer", self.model);
        }

        debug!(
            "Generated answer with '{}', tokens {:?}-{:?} (prompt-answer)",
            response.model, response.prompt_eval_count, response.eval_count
        );

        Ok(response.response.trim().to_string())
    }
}

impl std::fmt::Debug for OllamaGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaGenerator")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
    prompt_eval_count: Option<usize>,
    eval_count: Option<usize>,
}
