use crate::core::{
    model::Record,
    vector::{VectorDb, CONTENT_PROPERTY},
};
use crate::error::{GroundedErr, GroundedError};
use crate::{err, map_err};
use qdrant_client::qdrant::vectors_config::Config;
use qdrant_client::qdrant::with_payload_selector::SelectorOptions;
use qdrant_client::qdrant::{
    value, CreateCollection, Distance, PointStruct, SearchParams, SearchPoints,
    UpsertPointsBuilder, VectorParams, VectorsConfig, WithPayloadSelector,
};
use qdrant_client::{Payload, Qdrant, QdrantError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Alias for an arced Qdrant instance.
pub type QdrantDb = Arc<Qdrant>;

pub fn init(url: &str) -> Result<QdrantDb, GroundedError> {
    info!("Connecting to qdrant at {url}");
    Ok(Arc::new(map_err!(Qdrant::from_url(url).build())))
}

#[async_trait::async_trait]
impl VectorDb for Qdrant {
    fn id(&self) -> &'static str {
        "qdrant"
    }

    async fn create_vector_collection(&self, name: &str, size: usize) -> Result<(), GroundedError> {
        let config = VectorsConfig {
            config: Some(Config::Params(VectorParams {
                size: size as u64,
                distance: Distance::Cosine.into(),
                ..Default::default()
            })),
        };

        let result = self
            .create_collection(CreateCollection {
                collection_name: name.to_string(),
                vectors_config: Some(config),
                ..Default::default()
            })
            .await;

        match result {
            Ok(res) => {
                debug_assert!(res.result);
                info!("Created collection '{name}'");
                Ok(())
            }
            Err(QdrantError::ResponseError { status })
                if matches!(status.code(), tonic::Code::AlreadyExists) =>
            {
                debug!("Collection '{name}' already exists");
                Ok(())
            }
            Err(e) => Err(GroundedError::new(
                file!(),
                line!(),
                column!(),
                GroundedErr::Qdrant(e),
            )),
        }
    }

    async fn search(
        &self,
        search: Vec<f64>,
        collection: &str,
        limit: u32,
    ) -> Result<Vec<String>, GroundedError> {
        let search_points = SearchPoints {
            collection_name: collection.to_string(),
            vector: search.into_iter().map(|x| x as f32).collect(),
            filter: None,
            limit: limit as u64,
            with_payload: Some(WithPayloadSelector {
                selector_options: Some(SelectorOptions::Enable(true)),
            }),
            params: Some(SearchParams::default()),
            ..Default::default()
        };

        let search_result = map_err!(self.search_points(search_points).await);

        let results = search_result
            .result
            .into_iter()
            .filter_map(|mut point| point.payload.remove(CONTENT_PROPERTY)?.kind)
            .filter_map(|value| match value {
                value::Kind::StringValue(s) => Some(s),
                v => {
                    warn!("Found unsupported value kind: {v:?}");
                    None
                }
            })
            .collect();

        Ok(results)
    }

    async fn insert_records(
        &self,
        collection: &str,
        records: &[Record],
        vectors: Vec<Vec<f64>>,
    ) -> Result<(), GroundedError> {
        debug!("Inserting {} record(s) to {collection}", records.len());

        if records.len() != vectors.len() {
            let (records, vectors) = (records.len(), vectors.len());
            return err!(
                Ingest,
                "got {records} record(s) but {vectors} vector(s)"
            );
        }

        let points: Vec<PointStruct> = vectors
            .into_iter()
            .zip(records.iter())
            .map(|(embedding, record)| {
                let mut payload = Payload::new();
                payload.insert(CONTENT_PROPERTY, record.as_str().to_string());
                PointStruct::new(
                    record.id().to_string(),
                    embedding
                        .into_iter()
                        .map(|x| x as f32)
                        .collect::<Vec<f32>>(),
                    payload,
                )
            })
            .collect();

        map_err!(
            self.upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
                .await
        );

        Ok(())
    }
}
