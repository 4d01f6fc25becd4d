use super::{embedder::Embedder, model::Record, vector::VectorDb};
use crate::{err, error::GroundedError};
use std::sync::Arc;
use tracing::debug;

/// Maps a question to an ordered sequence of relevant records.
#[async_trait::async_trait]
pub trait Retriever {
    /// * `question`: The user's question.
    async fn retrieve(&self, question: &str) -> Result<Vec<Record>, GroundedError>;
}

/// Retrieves records by embedding the question and searching a vector collection.
#[derive(Clone)]
pub struct VectorRetriever {
    embedder: Arc<dyn Embedder + Send + Sync>,
    vector_db: Arc<dyn VectorDb + Send + Sync>,
    collection: String,
    model: String,
    limit: u32,
}

impl VectorRetriever {
    /// * `embedder`: Embeds the questions. Must be the same embedder the collection was created with.
    /// * `vector_db`: Holds the collection.
    /// * `collection`: The collection to search in.
    /// * `model`: The embedding model.
    /// * `limit`: Amount of records to retrieve per question.
    pub fn new(
        embedder: Arc<dyn Embedder + Send + Sync>,
        vector_db: Arc<dyn VectorDb + Send + Sync>,
        collection: impl Into<String>,
        model: impl Into<String>,
        limit: u32,
    ) -> Self {
        Self {
            embedder,
            vector_db,
            collection: collection.into(),
            model: model.into(),
            limit,
        }
    }
}

#[async_trait::async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, question: &str) -> Result<Vec<Record>, GroundedError> {
        let mut embeddings = self.embedder.embed(&[question], &self.model).await?;

        if embeddings.len() != 1 {
            let amount = embeddings.len();
            return err!(
                Retrieval,
                "expected a single question embedding, got {amount}"
            );
        }

        let search = embeddings.remove(0);

        let results = self
            .vector_db
            .search(search, &self.collection, self.limit)
            .await?;

        debug!(
            "Retrieved {} record(s) from '{}' ({})",
            results.len(),
            self.collection,
            self.vector_db.id()
        );

        Ok(results.into_iter().map(Record::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{Retriever, VectorRetriever};
    use crate::app::test::{MemoryVectorDb, StubEmbedder};
    use crate::core::{model::Record, vector::VectorDb};
    use std::sync::Arc;

    #[tokio::test]
    async fn retrieves_closest_records_first() {
        let embedder = Arc::new(StubEmbedder::default());
        let vector_db = Arc::new(MemoryVectorDb::default());

        vector_db.create_vector_collection("startups", 3).await.unwrap();

        let records = vec![
            Record::new("aaaaa"),
            Record::new("bb"),
            Record::new("cccccccccc"),
        ];
        let vectors = records
            .iter()
            .map(|r| StubEmbedder::vector_for(r.as_str()))
            .collect();
        vector_db
            .insert_records("startups", &records, vectors)
            .await
            .unwrap();

        let retriever = VectorRetriever::new(embedder, vector_db, "startups", "stub", 2);
        let results = retriever.retrieve("ddd").await.unwrap();

        assert_eq!(vec![Record::new("bb"), Record::new("aaaaa")], results);
    }

    #[tokio::test]
    async fn missing_collection_fails() {
        let retriever = VectorRetriever::new(
            Arc::new(StubEmbedder::default()),
            Arc::new(MemoryVectorDb::default()),
            "startups",
            "stub",
            2,
        );

        assert!(retriever.retrieve("anything").await.is_err());
    }
}
