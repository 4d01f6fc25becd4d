use crate::core::{
    generator::Generator,
    model::Turn,
    prompt::PromptTemplate,
    retriever::Retriever,
    session::SessionStore,
};
use crate::{err, error::GroundedError};
use std::sync::Arc;
use tracing::{debug, info};

/// Shown as the assistant's answer when retrieval or generation fails.
pub const DEGRADED_ANSWER: &str = "Sorry, I could not answer that right now. Please try again.";

/// What the conversation is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for a question.
    Idle,
    /// Fetching records relevant to the question.
    Retrieving,
    /// Rendering the prompt.
    Assembling,
    /// Waiting for the generator.
    Generating,
}

/// The outcome of a single question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// The assistant turn's content.
    pub answer: String,

    /// `true` if retrieval or generation failed and the answer is [DEGRADED_ANSWER].
    pub degraded: bool,
}

/// Runs a single question through retrieval, prompt assembly and generation,
/// and records the exchange in a session transcript.
#[derive(Clone)]
pub struct ChatService {
    retriever: Arc<dyn Retriever + Send + Sync>,
    generator: Arc<dyn Generator + Send + Sync>,
    template: Arc<PromptTemplate>,
}

impl ChatService {
    pub fn new(
        retriever: Arc<dyn Retriever + Send + Sync>,
        generator: Arc<dyn Generator + Send + Sync>,
    ) -> Self {
        Self {
            retriever,
            generator,
            template: Arc::new(PromptTemplate::startup()),
        }
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = Arc::new(template);
        self
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Answer `question` and append the exchange to `session`.
    ///
    /// Errors only if the question is empty, in which case the session is left untouched.
    ///
    /// * `session`: The transcript to append the turns to.
    /// * `question`: The user's question.
    pub async fn ask(
        &self,
        session: &mut SessionStore,
        question: &str,
    ) -> Result<Reply, GroundedError> {
        self.ask_observed(session, question, |_| {}).await
    }

    /// Same as [ask](Self::ask), calling `on_phase` whenever the conversation enters a new [Phase].
    pub async fn ask_observed<F>(
        &self,
        session: &mut SessionStore,
        question: &str,
        mut on_phase: F,
    ) -> Result<Reply, GroundedError>
    where
        F: FnMut(Phase) + Send,
    {
        let question = question.trim();

        if question.is_empty() {
            return err!(EmptyInput);
        }

        // The question stays in the transcript even if answering it fails.
        session.append(Turn::user(question));

        let reply = match self.answer(question, &mut on_phase).await {
            Ok(answer) => Reply {
                answer,
                degraded: false,
            },
            Err(e) => {
                e.print();
                Reply {
                    answer: DEGRADED_ANSWER.to_string(),
                    degraded: true,
                }
            }
        };

        session.append(Turn::assistant(&reply.answer));

        on_phase(Phase::Idle);

        Ok(reply)
    }

    async fn answer<F>(&self, question: &str, on_phase: &mut F) -> Result<String, GroundedError>
    where
        F: FnMut(Phase) + Send,
    {
        on_phase(Phase::Retrieving);
        let records = self.retriever.retrieve(question).await?;

        if records.is_empty() {
            info!("No records found for question");
        }

        on_phase(Phase::Assembling);
        let prompt = self.template.render(&records, question);

        debug!(
            "Prompting '{}' with {} record(s), {} bytes",
            self.generator.model(),
            records.len(),
            prompt.len()
        );

        on_phase(Phase::Generating);
        self.generator.generate(&prompt).await
    }
}
