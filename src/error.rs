use std::error::Error as _;
use thiserror::Error;
use tracing::error;
use validify::ValidationErrors;

#[cfg(feature = "qdrant")]
use qdrant_client::QdrantError;

#[cfg(feature = "http")]
pub mod http;

#[derive(Debug, Error)]
pub enum GroundedErr {
    #[error("Empty input")]
    EmptyInput,

    #[error("Session busy; {0}")]
    SessionBusy(String),

    #[error("Does not exist; {0}")]
    DoesNotExist(String),

    #[error("Invalid provider; {0}")]
    InvalidProvider(String),

    #[error("Invalid embedding model; {0}")]
    InvalidEmbeddingModel(String),

    #[error("retrieval: {0}")]
    Retrieval(String),

    #[error("generation: {0}")]
    Generation(String),

    #[error("ingest: {0}")]
    Ingest(String),

    #[error("embedding error; {0}")]
    Embedding(#[from] grounded_embedders::error::EmbeddingError),

    #[error("IO; {0}")]
    IO(#[from] std::io::Error),

    #[error("CSV; {0}")]
    Csv(#[from] csv::Error),

    #[error("parse configuration: {0}")]
    ParseConfig(String),

    #[error("Task; {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Validation; {0}")]
    Validation(#[from] ValidationErrors),

    #[cfg(feature = "ollama")]
    #[error("Http client; {0}")]
    Reqwest(#[from] reqwest::Error),

    #[cfg(feature = "qdrant")]
    #[error("Qdrant; {0}")]
    Qdrant(#[from] QdrantError),
}

#[derive(Debug, Error)]
#[error("{error}")]
pub struct GroundedError {
    file: &'static str,
    line: u32,
    column: u32,
    pub error: GroundedErr,
}

impl GroundedError {
    pub fn new(file: &'static str, line: u32, column: u32, error: GroundedErr) -> GroundedError {
        GroundedError {
            file,
            line,
            column,
            error,
        }
    }

    pub fn location(&self) -> String {
        format!("{}:{}:{}", self.file, self.line, self.column)
    }

    pub fn print(&self) {
        let location = self.location();

        error!("{location} | {self}");

        if self.error.source().is_some() {
            error!("Causes:");
        }

        let mut src = self.error.source();
        while let Some(source) = src {
            error!(" - {source}");
            src = source.source();
        }
    }
}

#[macro_export]
macro_rules! err {
    ($ty:ident $(, $l:literal $(,)? $($args:expr),* )?) => {
        Err($crate::error::GroundedError::new(
            file!(),
            line!(),
            column!(),
            $crate::error::GroundedErr::$ty $( (format!($l, $( $args, )*)) )?,
        ))
    };
}

#[macro_export]
macro_rules! map_err {
    ($ex:expr) => {
        $ex.map_err(|e| $crate::error::GroundedError::new(file!(), line!(), column!(), e.into()))?
    };
}
