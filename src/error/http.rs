use super::{GroundedErr, GroundedError};
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

impl GroundedError {
    pub fn status(&self) -> StatusCode {
        use GroundedErr as E;
        use StatusCode as SC;
        match self.error {
            E::DoesNotExist(_) => SC::NOT_FOUND,
            E::SessionBusy(_) => SC::CONFLICT,
            E::EmptyInput
            | E::Validation(_)
            | E::InvalidProvider(_)
            | E::InvalidEmbeddingModel(_) => SC::UNPROCESSABLE_ENTITY,
            E::Retrieval(_) | E::Generation(_) | E::Embedding(_) => SC::BAD_GATEWAY,

            #[cfg(feature = "ollama")]
            E::Reqwest(_) => SC::BAD_GATEWAY,

            #[cfg(feature = "qdrant")]
            E::Qdrant(_) => SC::BAD_GATEWAY,

            E::Ingest(_) | E::IO(_) | E::Csv(_) | E::ParseConfig(_) | E::Join(_) => {
                SC::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error response wrapper.
#[derive(Debug, Serialize)]
struct ResponseError<T: Serialize> {
    error_type: ErrorType,
    body: T,
}

impl<T> ResponseError<T>
where
    T: Serialize,
{
    pub fn new(error_type: ErrorType, body: T) -> Self {
        Self { error_type, body }
    }
}

#[derive(Debug, Serialize)]
enum ErrorType {
    Internal,
    Upstream,
    Api,
}

impl<T> IntoResponse for ResponseError<T>
where
    T: Serialize,
{
    fn into_response(self) -> axum::response::Response {
        <Json<ResponseError<T>> as IntoResponse>::into_response(Json(self))
    }
}

impl IntoResponse for GroundedError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();

        self.print();

        use ErrorType as ET;
        use GroundedErr as GE;

        match self.error {
            GE::EmptyInput => (
                status,
                ResponseError::new(ET::Api, "question cannot be empty".to_string()),
            )
                .into_response(),

            GE::SessionBusy(id) => (
                status,
                ResponseError::new(
                    ET::Api,
                    format!("session '{id}' is already answering a question"),
                ),
            )
                .into_response(),

            GE::DoesNotExist(e)
            | GE::InvalidProvider(e)
            | GE::InvalidEmbeddingModel(e) => {
                (status, ResponseError::new(ET::Api, e)).into_response()
            }

            GE::Validation(errors) => (status, ResponseError::new(ET::Api, errors)).into_response(),

            GE::Retrieval(_) | GE::Generation(_) | GE::Embedding(_) => (
                status,
                ResponseError::new(ET::Upstream, "upstream service error".to_string()),
            )
                .into_response(),

            #[cfg(feature = "ollama")]
            GE::Reqwest(_) => (
                status,
                ResponseError::new(ET::Upstream, "ollama".to_string()),
            )
                .into_response(),

            #[cfg(feature = "qdrant")]
            GE::Qdrant(_) => (
                status,
                ResponseError::new(ET::Upstream, "qdrant".to_string()),
            )
                .into_response(),

            GE::Ingest(_) | GE::IO(_) | GE::Csv(_) | GE::ParseConfig(_) | GE::Join(_) => (
                status,
                ResponseError::new(ET::Internal, "internal".to_string()),
            )
                .into_response(),
        }
    }
}
