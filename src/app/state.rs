use super::session::SessionRegistry;
use crate::{
    config::{StartArgs, INPUT_PLACEHOLDER, INTRO, PAGE_TITLE},
    core::{
        embedder::Embedder,
        generator::Generator,
        provider::ProviderFactory,
        retriever::VectorRetriever,
        service::{chat::ChatService, ingest::IngestService},
        vector::VectorDb,
    },
    err,
    error::GroundedError,
};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
pub struct AppState {
    pub chat: ChatService,

    pub ingest: IngestService,

    pub sessions: SessionRegistry,

    pub embedding_provider: Arc<EmbeddingProvider>,

    /// Names the models and the collection in use, for display.
    settings: Arc<Settings>,
}

/// Resolved values from [StartArgs] the state was built with.
#[derive(Debug)]
struct Settings {
    generation_model: String,
    embedding_provider: String,
    embedding_model: String,
    collection: String,
    retrieval_limit: u32,
}

impl AppState {
    /// Load the application state using the provided configuration.
    /// Initializes the global tracing subscriber.
    pub async fn new(args: &StartArgs) -> Result<Self, GroundedError> {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(args.log()))
            .init();

        let ollama_url = args.ollama_url();

        #[cfg(feature = "ollama")]
        let ollama = Arc::new(crate::app::embedder::ollama::OllamaEmbeddings::new(
            &ollama_url,
        ));

        #[cfg(feature = "openai")]
        let openai = Arc::new(crate::app::embedder::openai::OpenAiEmbeddings::new(
            &args.open_ai_key()?,
        ));

        let embedding_provider = Arc::new(EmbeddingProvider {
            #[cfg(feature = "ollama")]
            ollama,

            #[cfg(feature = "openai")]
            openai,
        });

        let embedder = embedding_provider.get_provider(&args.embedding_provider())?;

        let embedding_model = match args.embedding_model() {
            Some(model) => model,
            None => embedder.default_model().0,
        };

        let vector_db: Arc<dyn VectorDb + Send + Sync> =
            crate::app::vector::qdrant::init(&args.qdrant_url())?;

        let generator = Arc::new(crate::app::generator::ollama::OllamaGenerator::new(
            &ollama_url,
            &args.generation_model(),
        ));

        let settings = Settings {
            generation_model: generator.model().to_string(),
            embedding_provider: embedder.id().to_string(),
            embedding_model,
            collection: args.collection(),
            retrieval_limit: args.retrieval_limit()?,
        };

        let session_idle_timeout = args.session_idle_timeout()?;

        info!("Starting with {settings:?}");

        let state = Self::from_parts(
            embedder,
            vector_db,
            generator,
            embedding_provider,
            settings,
        );

        state.sessions.spawn_eviction(session_idle_timeout);

        Ok(state)
    }

    fn from_parts(
        embedder: Arc<dyn Embedder + Send + Sync>,
        vector_db: Arc<dyn VectorDb + Send + Sync>,
        generator: Arc<dyn Generator + Send + Sync>,
        embedding_provider: Arc<EmbeddingProvider>,
        settings: Settings,
    ) -> Self {
        let retriever = VectorRetriever::new(
            embedder.clone(),
            vector_db.clone(),
            &settings.collection,
            &settings.embedding_model,
            settings.retrieval_limit,
        );

        let ingest = IngestService::new(
            embedder,
            vector_db,
            &settings.collection,
            &settings.embedding_model,
        );

        Self {
            chat: ChatService::new(Arc::new(retriever), generator),
            ingest,
            sessions: SessionRegistry::new(),
            embedding_provider,
            settings: Arc::new(settings),
        }
    }

    /// Used for metadata display.
    pub async fn get_configuration(&self) -> Result<AppConfig, GroundedError> {
        let mut embedding_providers = HashMap::new();

        for provider in EMBEDDING_PROVIDERS {
            let embedder = self.embedding_provider.get_provider(provider)?;

            let models = embedder
                .list_embedding_models()
                .await?
                .into_iter()
                .collect();

            embedding_providers.insert(provider.to_string(), models);
        }

        let Settings {
            generation_model,
            embedding_provider,
            embedding_model,
            collection,
            retrieval_limit,
        } = &*self.settings;

        Ok(AppConfig {
            title: PAGE_TITLE.to_string(),
            intro: INTRO.to_string(),
            input_placeholder: INPUT_PLACEHOLDER.to_string(),
            generation_model: generation_model.clone(),
            embedding_provider: embedding_provider.clone(),
            embedding_model: embedding_model.clone(),
            collection: collection.clone(),
            retrieval_limit: *retrieval_limit,
            embedding_providers,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Title of the chat surface.
    pub title: String,

    /// Shown when a session starts.
    pub intro: String,

    /// Hint for the question input.
    pub input_placeholder: String,

    /// The model answering questions.
    pub generation_model: String,

    /// The embedding provider in use.
    pub embedding_provider: String,

    /// The embedding model in use.
    pub embedding_model: String,

    /// The collection holding the dataset.
    pub collection: String,

    /// Amount of records retrieved per question.
    pub retrieval_limit: u32,

    /// A map of available embedding providers, their models and their respective model sizes.
    pub embedding_providers: HashMap<String, HashMap<String, usize>>,
}

/// Implements functions for `$target` to easily get an instance of whatever
/// the provider is for, i.e. `$provider_out`.
///
/// Additionally, creates a constant with the given feature literals so we can easily list them
/// to the client.
macro_rules! provider {
    (
        $target:ident -> $provider_out:ident,
        $($feature:literal => $state_id:ident),*
        $(,)?;
        $constant_name:ident
    ) => {
            impl ProviderFactory<Arc<dyn $provider_out + Send + Sync>> for $target {
                fn get_provider(&self, input: &str) -> Result<Arc<dyn $provider_out + Send + Sync>, GroundedError> {
                    match input {
                        $(
                            #[cfg(feature = $feature)]
                            _ if self.$state_id.id() == input => Ok(self.$state_id.clone()),
                        )*
                        _ => err!(InvalidProvider, "{input}"),
                    }
                }
            }

            /// A list of available providers for a given functionality.
            pub(in $crate::app) const $constant_name: &[&str] = &[
                $(
                    #[cfg(feature = $feature)]
                    $feature
                ),*
            ];
    };
}

provider! {
    EmbeddingProvider -> Embedder,
        "ollama" => ollama,
        "openai" => openai;
    EMBEDDING_PROVIDERS
}

/// Provides concrete implementations of [Embedder] for each provider.
#[derive(Clone)]
pub struct EmbeddingProvider {
    #[cfg(feature = "ollama")]
    pub ollama: Arc<super::embedder::ollama::OllamaEmbeddings>,

    #[cfg(feature = "openai")]
    pub openai: Arc<super::embedder::openai::OpenAiEmbeddings>,
}

#[cfg(test)]
impl AppState {
    /// State backed by in-memory stubs with the `stub` embedding model.
    pub fn new_test(
        vector_db: Arc<dyn VectorDb + Send + Sync>,
        generator: Arc<dyn Generator + Send + Sync>,
    ) -> Self {
        use crate::app::test::StubEmbedder;
        use crate::config::DEFAULT_COLLECTION;

        let embedder = Arc::new(StubEmbedder::default());

        let embedding_provider = Arc::new(EmbeddingProvider {
            #[cfg(feature = "ollama")]
            ollama: Arc::new(crate::app::embedder::ollama::OllamaEmbeddings::new(
                "http://localhost:11434",
            )),

            #[cfg(feature = "openai")]
            openai: Arc::new(crate::app::embedder::openai::OpenAiEmbeddings::new("test")),
        });

        let settings = Settings {
            generation_model: generator.model().to_string(),
            embedding_provider: embedder.id().to_string(),
            embedding_model: StubEmbedder::MODEL.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            retrieval_limit: 2,
        };

        Self::from_parts(
            embedder,
            vector_db,
            generator,
            embedding_provider,
            settings,
        )
    }
}
