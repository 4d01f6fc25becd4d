use crate::error::GroundedError;

/// A language model answering rendered prompts.
#[async_trait::async_trait]
pub trait Generator {
    /// Used as an identifier for the generator.
    fn id(&self) -> &'static str;

    /// The model answering the prompts.
    fn model(&self) -> &str;

    /// Produce an answer for the rendered prompt.
    /// The whole answer is returned at once.
    ///
    /// * `prompt`: The rendered prompt.
    async fn generate(&self, prompt: &str) -> Result<String, GroundedError>;
}
