//! Hybrid lexical + vector retrieval over ingested documents.
//!
//! [`HybridSearchEngine`] chunks and stores documents, rebuilds an
//! [`IndexSnapshot`] after every batch and answers queries with the fused
//! ranking in [`fusion`].

pub mod engine;
pub mod fusion;
pub mod snapshot;

pub use engine::{DocumentInfo, HybridSearchEngine, IngestStatus};
pub use snapshot::IndexSnapshot;
