#[cfg(feature = "qdrant")]
pub mod qdrant;
