//! HTTP surface for the chat sessions.

pub mod api;
pub mod dto;
pub mod router;

pub use router::router;
