use crate::core::{embedder::Embedder, model::Record, vector::VectorDb};
use crate::{err, error::GroundedError, map_err};
use std::{io::Read, path::Path, sync::Arc};
use tracing::{debug, info};

/// The default amount of records embedded in a single request.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Loads the dataset into the vector collection the retriever searches.
#[derive(Clone)]
pub struct IngestService {
    embedder: Arc<dyn Embedder + Send + Sync>,
    vector_db: Arc<dyn VectorDb + Send + Sync>,
    collection: String,
    model: String,
    batch_size: usize,
}

impl IngestService {
    pub fn new(
        embedder: Arc<dyn Embedder + Send + Sync>,
        vector_db: Arc<dyn VectorDb + Send + Sync>,
        collection: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            vector_db,
            collection: collection.into(),
            model: model.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the amount of records embedded in a single request. Zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Read the CSV dataset at `path` and store its records.
    /// Returns the amount of records stored.
    ///
    /// * `path`: Path to a CSV file with a header row.
    pub async fn ingest_file(&self, path: impl AsRef<Path>) -> Result<usize, GroundedError> {
        let path = path.as_ref();
        let file = map_err!(tokio::fs::read(path).await);
        let records = records_from_csv(file.as_slice())?;

        info!(
            "Read {} record(s) from {}",
            records.len(),
            path.display()
        );

        self.ingest(&records).await
    }

    /// Embed and store the records, creating the collection if necessary.
    /// Returns the amount of records stored.
    ///
    /// * `records`: The records to store.
    pub async fn ingest(&self, records: &[Record]) -> Result<usize, GroundedError> {
        if records.is_empty() {
            return err!(Ingest, "no records to ingest");
        }

        let Some(size) = self.embedder.size(&self.model).await? else {
            let (model, embedder) = (&self.model, self.embedder.id());
            return err!(
                InvalidEmbeddingModel,
                "Model '{model}' not supported by embedder '{embedder}'"
            );
        };

        info!(
            "Ensuring collection '{}' of size {size} in {}",
            self.collection,
            self.vector_db.id()
        );

        self.vector_db
            .create_vector_collection(&self.collection, size)
            .await?;

        let mut stored = 0;

        for batch in records.chunks(self.batch_size) {
            let content = batch.iter().map(Record::as_str).collect::<Vec<_>>();
            let vectors = self.embedder.embed(&content, &self.model).await?;

            if vectors.len() != batch.len() {
                let (expected, got) = (batch.len(), vectors.len());
                return err!(Ingest, "expected {expected} embeddings, got {got}");
            }

            if let Some(v) = vectors.iter().find(|v| v.len() != size) {
                let got = v.len();
                return err!(
                    InvalidEmbeddingModel,
                    "Embedding size ({got}) not compatible with collection ({size})"
                );
            }

            self.vector_db
                .insert_records(&self.collection, batch, vectors)
                .await?;

            stored += batch.len();
            debug!("Stored {stored}/{} record(s)", records.len());
        }

        info!("Stored {stored} record(s) in '{}'", self.collection);

        Ok(stored)
    }
}

/// Render every row of a CSV document with a header row into a record.
///
/// Cells are written as `header: value` pairs joined by `, ` in column order.
/// Empty cells are left out and rows without any values are skipped.
pub fn records_from_csv<R: Read>(reader: R) -> Result<Vec<Record>, GroundedError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = map_err!(reader.headers()).clone();
    let mut records = vec![];

    for row in reader.records() {
        let row = map_err!(row);

        let fields = headers
            .iter()
            .zip(row.iter())
            .filter(|(_, value)| !value.is_empty())
            .map(|(header, value)| format!("{header}: {value}"))
            .collect::<Vec<_>>();

        if fields.is_empty() {
            continue;
        }

        records.push(Record::new(fields.join(", ")));
    }

    Ok(records)
}
