use crate::error::Result;
use crate::types::{DocumentInput, Neighbor, SearchResult};

/// Maps text to fixed-width, L2-normalized vectors, one row per input in input order.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Term-statistics scorer over the valid chunks of one snapshot.
///
/// `score` returns one value per indexed chunk, in index order. Higher is more
/// relevant; the scale is scorer specific.
pub trait LexicalScorer: Send + Sync {
    fn len(&self) -> usize;
    fn score(&self, query_tokens: &[String]) -> anyhow::Result<Vec<f32>>;

    fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Exact inner-product search over one embedding per valid chunk.
pub trait VectorSearcher: Send + Sync {
    fn len(&self) -> usize;
    fn dim(&self) -> usize;
    /// The `k` rows closest to `query`, best first.
    fn search(&self, query: &[f32], k: usize) -> anyhow::Result<Vec<Neighbor>>;
    /// Inner product of row `position` with `query`, `None` when out of range.
    fn similarity(&self, position: usize, query: &[f32]) -> Option<f32>;

    fn is_empty(&self) -> bool { self.len() == 0 }
}

pub trait SearchEngine: Send + Sync {
    fn ingest_batch(&self, documents: &[DocumentInput]) -> usize;
    fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>>;
}
