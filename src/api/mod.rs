//! Axum HTTP handlers: question answering, document ingestion, and the
//! liveness probe.

pub mod ask;
pub mod documents;
pub mod health;
