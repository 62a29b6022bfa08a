//! Immutable, internally consistent view of the derived indexes.

use std::sync::Arc;

use pdfseek_core::chunker::tokenize;
use pdfseek_core::store::DocumentStore;
use pdfseek_core::traits::{Embedder, LexicalScorer, VectorSearcher};
use pdfseek_core::{Error, Result};
use pdfseek_text::TantivyLexicalIndex;
use pdfseek_vector::build_with_embedder;

/// Frozen document store plus the lexical and vector indexes built over its
/// valid chunks.
///
/// Position `i` of either index corresponds to global chunk
/// `valid_chunk_indices[i]`. A component that could not be built is `None`.
pub struct IndexSnapshot {
    store: Arc<DocumentStore>,
    valid_chunk_indices: Vec<usize>,
    lexical: Option<Box<dyn LexicalScorer>>,
    vector: Option<Box<dyn VectorSearcher>>,
}

impl std::fmt::Debug for IndexSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexSnapshot")
            .field("documents", &self.store.len())
            .field("chunks", &self.store.chunk_count())
            .field("valid_chunks", &self.valid_chunk_indices.len())
            .field("lexical", &self.lexical.is_some())
            .field("vector", &self.vector.is_some())
            .finish()
    }
}

impl Default for IndexSnapshot {
    fn default() -> Self { Self::empty() }
}

impl IndexSnapshot {
    pub fn empty() -> Self {
        Self { store: Arc::new(DocumentStore::default()), valid_chunk_indices: Vec::new(), lexical: None, vector: None }
    }

    /// Assemble a snapshot from prebuilt parts, checking that every present
    /// index has exactly one entry per valid chunk.
    pub fn from_parts(
        store: Arc<DocumentStore>,
        valid_chunk_indices: Vec<usize>,
        lexical: Option<Box<dyn LexicalScorer>>,
        vector: Option<Box<dyn VectorSearcher>>,
    ) -> Result<Self> {
        if let Some(&bad) = valid_chunk_indices.iter().find(|&&pos| pos >= store.chunk_count()) {
            return Err(Error::Index(format!("valid chunk {bad} is outside the {} stored chunks", store.chunk_count())));
        }
        if let Some(l) = &lexical {
            if l.len() != valid_chunk_indices.len() {
                return Err(Error::Index(format!("lexical index has {} entries for {} valid chunks", l.len(), valid_chunk_indices.len())));
            }
        }
        if let Some(v) = &vector {
            if v.len() != valid_chunk_indices.len() {
                return Err(Error::Index(format!("vector index has {} rows for {} valid chunks", v.len(), valid_chunk_indices.len())));
            }
        }
        Ok(Self { store, valid_chunk_indices, lexical, vector })
    }

    /// Full rebuild over every chunk of `store`. Never fails: a component whose
    /// build errors is logged and left out.
    #[tracing::instrument(skip_all, fields(documents = store.len(), chunks = store.chunk_count()))]
    pub fn build(store: Arc<DocumentStore>, embedder: &dyn Embedder, batch_size: usize) -> Self {
        let mut valid_chunk_indices = Vec::new();
        let mut token_rows = Vec::new();
        let mut texts = Vec::new();
        for (pos, chunk) in store.chunks().iter().enumerate() {
            let tokens = tokenize(chunk);
            if tokens.is_empty() { continue; }
            valid_chunk_indices.push(pos);
            token_rows.push(tokens);
            texts.push(chunk.to_string());
        }
        if valid_chunk_indices.is_empty() {
            tracing::warn!("no valid chunks, indexes left empty");
            return Self { store, valid_chunk_indices, lexical: None, vector: None };
        }

        let lexical: Option<Box<dyn LexicalScorer>> = match TantivyLexicalIndex::build(&token_rows) {
            Ok(index) => Some(Box::new(index)),
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "lexical index build failed");
                None
            }
        };
        let vector: Option<Box<dyn VectorSearcher>> = match build_with_embedder(embedder, &texts, batch_size) {
            Ok(index) => Some(Box::new(index)),
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "vector index build failed, search is disabled until the next rebuild");
                None
            }
        };
        tracing::info!(
            valid_chunks = valid_chunk_indices.len(),
            lexical = lexical.is_some(),
            vector = vector.is_some(),
            "index snapshot rebuilt"
        );
        Self { store, valid_chunk_indices, lexical, vector }
    }

    pub fn store(&self) -> &DocumentStore { &self.store }

    pub fn valid_chunk_indices(&self) -> &[usize] { &self.valid_chunk_indices }

    pub fn lexical(&self) -> Option<&dyn LexicalScorer> { self.lexical.as_deref() }

    pub fn vector(&self) -> Option<&dyn VectorSearcher> { self.vector.as_deref() }

    /// Both indexes are present, which is what a query needs.
    pub fn is_searchable(&self) -> bool { self.lexical.is_some() && self.vector.is_some() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfseek_core::chunker::ChunkingConfig;

    struct UnitEmbedder;

    impl Embedder for UnitEmbedder {
        fn dim(&self) -> usize { 2 }
        fn max_len(&self) -> usize { 64 }
        fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> { Ok(vec![vec![1.0, 0.0]; texts.len()]) }
    }

    struct DownEmbedder;

    impl Embedder for DownEmbedder {
        fn dim(&self) -> usize { 2 }
        fn max_len(&self) -> usize { 64 }
        fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> { anyhow::bail!("model unavailable") }
    }

    fn store() -> Arc<DocumentStore> {
        let mut store = DocumentStore::new(ChunkingConfig::default());
        assert!(store.add("1", "a.pdf", "alpha beta"));
        assert!(store.add("2", "b.pdf", "gamma"));
        Arc::new(store)
    }

    #[test]
    fn both_indexes_align_with_valid_chunks() {
        let snap = IndexSnapshot::build(store(), &UnitEmbedder, 1);
        assert_eq!(snap.valid_chunk_indices(), &[0, 1]);
        assert_eq!(snap.lexical().map(|l| l.len()), Some(2));
        assert_eq!(snap.vector().map(|v| v.len()), Some(2));
        assert!(snap.is_searchable());
    }

    #[test]
    fn embedder_failure_keeps_lexical_index() {
        let snap = IndexSnapshot::build(store(), &DownEmbedder, 8);
        assert!(snap.lexical().is_some());
        assert!(snap.vector().is_none());
        assert!(!snap.is_searchable());
    }

    #[test]
    fn empty_store_has_no_indexes() {
        let snap = IndexSnapshot::build(Arc::new(DocumentStore::default()), &UnitEmbedder, 8);
        assert!(snap.valid_chunk_indices().is_empty());
        assert!(snap.lexical().is_none() && snap.vector().is_none());
    }

    #[test]
    fn misaligned_parts_are_rejected() {
        let index = pdfseek_vector::FlatIndex::from_rows(vec![vec![1.0, 0.0]]).expect("index");
        let err = IndexSnapshot::from_parts(store(), vec![0, 1], None, Some(Box::new(index))).expect_err("misaligned");
        assert!(matches!(err, Error::Index(_)));
        assert!(IndexSnapshot::from_parts(store(), vec![0, 5], None, None).is_err());
    }
}
