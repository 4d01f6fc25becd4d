//! The core module defines the business logic of grounded.
//! It provides the traits and models upstream adapters need to implement.

pub mod embedder;
pub mod generator;
pub mod model;
pub mod prompt;
pub mod provider;
pub mod retriever;
pub mod service;
pub mod session;
pub mod vector;
