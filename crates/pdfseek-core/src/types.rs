//! Domain types shared by the chunker, the store, the retrievers and the ranker.

use serde::{Deserialize, Serialize};

pub type DocId = String;

/// One item of an ingestion batch as handed over by a front-end.
///
/// `id` uniqueness is the caller's responsibility. `name` is the display key
/// and is used verbatim in results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInput {
    pub id: DocId,
    pub name: String,
    pub text: String,
}

impl DocumentInput {
    pub fn new(id: impl Into<DocId>, name: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), text: text.into() }
    }
}

/// An ingested document. Immutable once stored.
///
/// - `chunks`: the overlapping word windows produced at ingestion, in order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub name: String,
    pub text: String,
    pub chunks: Vec<String>,
}

/// Half-open range `[start, end)` of global chunk positions owned by the
/// document at `doc_index` in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocSpan {
    pub doc_index: usize,
    pub start: usize,
    pub end: usize,
}

impl DocSpan {
    pub fn contains(&self, position: usize) -> bool { self.start <= position && position < self.end }

    pub fn len(&self) -> usize { self.end - self.start }

    pub fn is_empty(&self) -> bool { self.start == self.end }
}

/// A nearest-neighbour hit from the vector index. `position` is local to the
/// index (row number), `score` is the inner product with the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub position: usize,
    pub score: f32,
}

/// Which document attribute groups results during deduplication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupKey {
    /// Group by display name; two documents sharing a name collapse into one hit.
    #[default]
    Name,
    Id,
}

/// One ranked passage returned to the query caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub filename: String,
    pub doc_id: DocId,
    /// Fused score rounded to four decimals.
    pub score: f32,
    pub snippet: String,
}
