//! Append-only document store with the global chunk sequence and the
//! chunk-to-document interval map.

use std::sync::Arc;

use crate::chunker::ChunkingConfig;
use crate::types::{DocSpan, Document};

/// Holds every ingested document, the concatenation of their chunks and one
/// [`DocSpan`] per document.
///
/// Spans are contiguous, non-overlapping and cover `0..chunk_count()` in
/// insertion order. Cloning is cheap: documents and chunks are shared.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    chunking: ChunkingConfig,
    docs: Vec<Arc<Document>>,
    chunks: Vec<Arc<str>>,
    spans: Vec<DocSpan>,
}

impl DocumentStore {
    pub fn new(chunking: ChunkingConfig) -> Self {
        Self { chunking, ..Self::default() }
    }

    /// Chunk and append one document. Returns `false` (and leaves the store
    /// untouched) when the text is blank or produces no chunks.
    pub fn add(&mut self, id: &str, name: &str, text: &str) -> bool {
        if text.trim().is_empty() {
            tracing::warn!(doc_id = id, doc_name = name, "skipping document with empty text");
            return false;
        }
        let chunks = match self.chunking.chunk(text) {
            Ok(chunks) if !chunks.is_empty() => chunks,
            Ok(_) => {
                tracing::warn!(doc_id = id, doc_name = name, "skipping document that produced no chunks");
                return false;
            }
            Err(e) => {
                tracing::warn!(doc_id = id, doc_name = name, error = %e, "skipping document that failed to chunk");
                return false;
            }
        };
        let start = self.chunks.len();
        self.chunks.extend(chunks.iter().map(|c| Arc::<str>::from(c.as_str())));
        self.docs.push(Arc::new(Document { id: id.to_string(), name: name.to_string(), text: text.to_string(), chunks }));
        self.spans.push(DocSpan { doc_index: self.docs.len() - 1, start, end: self.chunks.len() });
        true
    }

    /// Owning document of a global chunk position, by forward scan of the spans.
    pub fn resolve(&self, position: usize) -> Option<&Document> {
        self.spans.iter().find(|s| s.contains(position)).and_then(|s| self.docs.get(s.doc_index)).map(|d| &**d)
    }

    pub fn chunk(&self, position: usize) -> Option<&str> { self.chunks.get(position).map(|c| &**c) }

    pub fn chunks(&self) -> &[Arc<str>] { &self.chunks }

    pub fn documents(&self) -> &[Arc<Document>] { &self.docs }

    pub fn spans(&self) -> &[DocSpan] { &self.spans }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn chunk_count(&self) -> usize { self.chunks.len() }

    pub fn chunking(&self) -> ChunkingConfig { self.chunking }
}
