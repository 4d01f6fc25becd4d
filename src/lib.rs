/// Concrete implementations of the [core] module.
pub mod app;

/// Terminal chat and dataset ingestion commands.
pub mod cli;

/// Application starting arguments and configuration.
pub mod config;

/// Core business logic.
pub mod core;

/// Error types.
pub mod error;

#[cfg(not(feature = "ollama"))]
compile_error!("the `ollama` feature must be enabled to generate answers");

#[cfg(not(feature = "qdrant"))]
compile_error!("the `qdrant` feature must be enabled to retrieve records");
