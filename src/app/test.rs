//! Test suites and utilites.



use crate::core::{
    embedder::Embedder,
    generator::Generator,
    model::Record,
    retriever::Retriever,
    vector::VectorDb,
};
use crate::{err, error::GroundedError};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};
use testcontainers::{ContainerAsync, GenericImage};

pub type AsyncContainer = ContainerAsync<GenericImage>;

/// Serve `router` on a random local port and return its base URL.
#[cfg(feature = "http")]
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{addr}")
}

/// Returns the same records for every question and counts how many times it was called.
#[derive(Debug, Default)]
pub struct StaticRetriever {
    records: Vec<Record>,
    calls: AtomicUsize,
}

impl StaticRetriever {
    pub fn new(records: &[&str]) -> Self {
        Self {
            records: records.iter().copied().map(Record::from).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(&self, _: &str) -> Result<Vec<Record>, GroundedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.clone())
    }
}

/// Fails every retrieval as if the vector database were unreachable.
#[derive(Debug, Default)]
pub struct FailingRetriever;

#[async_trait::async_trait]
impl Retriever for FailingRetriever {
    async fn retrieve(&self, _: &str) -> Result<Vec<Record>, GroundedError> {
        err!(Retrieval, "vector database unreachable")
    }
}

/// Answers every prompt with the same text and keeps the prompts it received.
#[derive(Debug)]
pub struct StaticGenerator {
    answer: String,
    prompts: Mutex<Vec<String>>,
}

impl StaticGenerator {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            prompts: Mutex::new(vec![]),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Generator for StaticGenerator {
    fn id(&self) -> &'static str {
        "static"
    }

    fn model(&self) -> &str {
        "static"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GroundedError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.answer.clone())
    }
}

/// Answers every prompt with the same text after a delay.
#[derive(Debug)]
pub struct SlowGenerator {
    answer: String,
    delay: Duration,
}

impl SlowGenerator {
    pub fn new(answer: &str, delay: Duration) -> Self {
        Self {
            answer: answer.to_string(),
            delay,
        }
    }
}

#[async_trait::async_trait]
impl Generator for SlowGenerator {
    fn id(&self) -> &'static str {
        "slow"
    }

    fn model(&self) -> &str {
        "slow"
    }

    async fn generate(&self, _: &str) -> Result<String, GroundedError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.answer.clone())
    }
}

/// Fails every generation as if the model server were down.
#[derive(Debug, Default)]
pub struct FailingGenerator;

#[async_trait::async_trait]
impl Generator for FailingGenerator {
    fn id(&self) -> &'static str {
        "failing"
    }

    fn model(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _: &str) -> Result<String, GroundedError> {
        err!(Generation, "model server unreachable")
    }
}

/// Embeds text as `[length, 1, 0]` with a single model called `stub`.
#[derive(Debug, Default)]
pub struct StubEmbedder {
    calls: AtomicUsize,
}

impl StubEmbedder {
    pub const MODEL: &'static str = "stub";

    pub fn vector_for(text: &str) -> Vec<f64> {
        vec![text.chars().count() as f64, 1.0, 0.0]
    }

    /// Amount of `embed` calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Embedder for StubEmbedder {
    fn id(&self) -> &'static str {
        "stub"
    }

    fn default_model(&self) -> (String, usize) {
        (Self::MODEL.to_string(), 3)
    }

    async fn list_embedding_models(&self) -> Result<Vec<(String, usize)>, GroundedError> {
        Ok(vec![self.default_model()])
    }

    async fn embed(&self, content: &[&str], model: &str) -> Result<Vec<Vec<f64>>, GroundedError> {
        if model != Self::MODEL {
            return err!(InvalidEmbeddingModel, "{model}");
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(content.iter().map(|c| Self::vector_for(c)).collect())
    }
}

/// Keeps collections in memory and ranks records by euclidean distance.
#[derive(Debug, Default)]
pub struct MemoryVectorDb {
    collections: Mutex<HashMap<String, HashMap<uuid::Uuid, (Record, Vec<f64>)>>>,
}

impl MemoryVectorDb {
    /// Amount of records in the collection.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map_or(0, HashMap::len)
    }
}

#[async_trait::async_trait]
impl VectorDb for MemoryVectorDb {
    fn id(&self) -> &'static str {
        "memory"
    }

    async fn create_vector_collection(&self, name: &str, _: usize) -> Result<(), GroundedError> {
        self.collections
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    async fn search(
        &self,
        search: Vec<f64>,
        collection: &str,
        limit: u32,
    ) -> Result<Vec<String>, GroundedError> {
        let collections = self.collections.lock().unwrap();

        let Some(points) = collections.get(collection) else {
            return err!(DoesNotExist, "Collection '{collection}'");
        };

        let distance = |v: &[f64]| {
            v.iter()
                .zip(search.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
        };

        let mut ranked = points
            .values()
            .map(|(record, vector)| (distance(vector), record.as_str().to_string()))
            .collect::<Vec<_>>();

        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        Ok(ranked
            .into_iter()
            .take(limit as usize)
            .map(|(_, content)| content)
            .collect())
    }

    async fn insert_records(
        &self,
        collection: &str,
        records: &[Record],
        vectors: Vec<Vec<f64>>,
    ) -> Result<(), GroundedError> {
        let mut collections = self.collections.lock().unwrap();

        let Some(points) = collections.get_mut(collection) else {
            return err!(DoesNotExist, "Collection '{collection}'");
        };

        for (record, vector) in records.iter().zip(vectors) {
            points.insert(record.id(), (record.clone(), vector));
        }

        Ok(())
    }
}

/// Setup a qdrant test container and connect to it using QdrantDb.
/// When using suitest's [before_all][suitest::before_all], make sure you return this, othwerise the
/// container will get dropped and cleaned up.
#[cfg(feature = "qdrant")]
pub async fn init_qdrant() -> (super::vector::qdrant::QdrantDb, AsyncContainer) {
    use testcontainers::{
        core::{IntoContainerPort, WaitFor},
        runners::AsyncRunner,
    };

    let qd_image = GenericImage::new("qdrant/qdrant", "latest")
        .with_exposed_port(6334.tcp())
        .with_wait_for(WaitFor::message_on_stdout("gRPC listening on"))
        .start()
        .await
        .expect("qdrant container error");

    let qd_host = qd_image.get_host().await.unwrap();
    let qd_port = qd_image.get_host_port_ipv4(6334).await.unwrap();
    let qd_url = format!("http://{qd_host}:{qd_port}");
    (
        crate::app::vector::qdrant::init(&qd_url).expect("qdrant client error"),
        qd_image,
    )
}
