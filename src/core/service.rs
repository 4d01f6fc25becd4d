//! High level operations composing the core traits.

pub mod chat;
pub mod ingest;
