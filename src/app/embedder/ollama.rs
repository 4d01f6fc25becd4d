use crate::{core::embedder::Embedder, error::GroundedError, map_err};
use tracing::info;

pub use grounded_embedders::ollama::OllamaEmbeddings;

use grounded_embedders::ollama::MXBAI_EMBED_LARGE;

/// Embedded to find out the vector size of models without a known size.
const SIZE_PROBE: &str = "size probe";

#[async_trait::async_trait]
impl Embedder for OllamaEmbeddings {
    fn id(&self) -> &'static str {
        "ollama"
    }

    fn default_model(&self) -> (String, usize) {
        (String::from(MXBAI_EMBED_LARGE), 1024)
    }

    async fn list_embedding_models(&self) -> Result<Vec<(String, usize)>, GroundedError> {
        Ok(self.list_embedding_models())
    }

    async fn embed(&self, content: &[&str], model: &str) -> Result<Vec<Vec<f64>>, GroundedError> {
        Ok(map_err!(self.embed(content, model).await))
    }

    /// Ollama serves whatever model was pulled into it. Models without a known size
    /// are probed with a single embedding request.
    async fn size(&self, model: &str) -> Result<Option<usize>, GroundedError> {
        if let Some((_, size)) = self
            .list_embedding_models()
            .into_iter()
            .find(|(m, _)| m == model)
        {
            return Ok(Some(size));
        }

        info!("Probing vector size of '{model}'");

        let embeddings = map_err!(self.embed(&[SIZE_PROBE], model).await);

        Ok(embeddings.first().map(Vec::len))
    }
}
