use super::model::Record;
use crate::error::GroundedError;

/// The payload property holding the record text.
pub const CONTENT_PROPERTY: &str = "content";

/// Vector database operations.
#[async_trait::async_trait]
pub trait VectorDb {
    fn id(&self) -> &'static str;

    /// Create a vector collection if it does not exist.
    ///
    /// * `name`: The name of the collection.
    /// * `size`: Vector size of the collection.
    async fn create_vector_collection(&self, name: &str, size: usize) -> Result<(), GroundedError>;

    /// Perform semantic search.
    /// Results are ordered by relevance, most relevant first.
    ///
    /// * `search`: The query to use as the search vector.
    /// * `collection`: The collection to search in.
    /// * `limit`: Amount of results to return.
    async fn search(
        &self,
        search: Vec<f64>,
        collection: &str,
        limit: u32,
    ) -> Result<Vec<String>, GroundedError>;

    /// Store the records and their vectors in the collection.
    /// The `records` and `vectors` inputs are expected to
    /// be 1:1, i.e. the same index into both lists should
    /// yield the record and its embedding.
    /// Records are stored under [Record::id], so storing a record
    /// again replaces it.
    ///
    /// * `collection`: The vector collection to store in.
    /// * `records`: The records to store.
    /// * `vectors`: The vectors to store.
    async fn insert_records(
        &self,
        collection: &str,
        records: &[Record],
        vectors: Vec<Vec<f64>>,
    ) -> Result<(), GroundedError>;
}
