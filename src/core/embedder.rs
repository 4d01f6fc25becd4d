use crate::error::GroundedError;

/// Operations related to embeddings and their models.
#[async_trait::async_trait]
pub trait Embedder {
    /// Used as an identifier for the embedder.
    fn id(&self) -> &'static str;

    /// Return the default embedding model and its size.
    fn default_model(&self) -> (String, usize);

    /// List all available models in the embedder and their sizes.
    async fn list_embedding_models(&self) -> Result<Vec<(String, usize)>, GroundedError>;

    /// Get the vectors for the elements in `content`.
    /// The content passed in can be a user's question,
    /// or a batch of dataset records.
    ///
    /// * `content`: The text to embed.
    /// * `model`: The embedding model to use.
    async fn embed(&self, content: &[&str], model: &str) -> Result<Vec<Vec<f64>>, GroundedError>;

    /// Get the vector size of the given model. Returns `None` if the model is not supported.
    ///
    /// * `model`: The embedding model.
    async fn size(&self, model: &str) -> Result<Option<usize>, GroundedError> {
        Ok(self
            .list_embedding_models()
            .await?
            .into_iter()
            .find(|m| m.0 == model)
            .map(|m| m.1))
    }
}
