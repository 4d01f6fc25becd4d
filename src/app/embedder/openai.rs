use crate::core::embedder::Embedder;
use crate::error::GroundedError;
use crate::map_err;

pub use grounded_embedders::openai::OpenAiEmbeddings;

use grounded_embedders::openai::TEXT_EMBEDDING_3_SMALL;

#[async_trait::async_trait]
impl Embedder for OpenAiEmbeddings {
    fn id(&self) -> &'static str {
        "openai"
    }

    fn default_model(&self) -> (String, usize) {
        (String::from(TEXT_EMBEDDING_3_SMALL), 1536)
    }

    async fn list_embedding_models(&self) -> Result<Vec<(String, usize)>, GroundedError> {
        Ok(self.list_embedding_models())
    }

    async fn embed(&self, content: &[&str], model: &str) -> Result<Vec<Vec<f64>>, GroundedError> {
        Ok(map_err!(self.embed(content, model).await))
    }
}
