//! Module containing concrete implementations from the [core](crate::core) module.

/// Text embedder implementations.
pub mod embedder;

/// Answer generator implementations.
pub mod generator;

/// Session registry for hosts serving multiple sessions.
pub mod session;

/// Application state configuration.
pub mod state;

/// Vector database implementations.
pub mod vector;

/// HTTP server implementation.
#[cfg(feature = "http")]
pub mod server;

#[cfg(test)]
pub mod test;
