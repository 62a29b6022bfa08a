//! Ingestion and query controller.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use pdfseek_core::config::Settings;
use pdfseek_core::store::DocumentStore;
use pdfseek_core::traits::{Embedder, SearchEngine};
use pdfseek_core::types::{DocId, DocumentInput, SearchResult};
use pdfseek_core::{Error, Result};

use crate::fusion;
use crate::snapshot::IndexSnapshot;

/// Progress of the most recent background ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IngestStatus {
    #[default]
    Idle,
    Processing { total: usize },
    Complete { total: usize, added: usize, message: String },
    Failed { message: String },
}

impl IngestStatus {
    pub fn is_finished(&self) -> bool { matches!(self, Self::Complete { .. } | Self::Failed { .. }) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub id: DocId,
    pub name: String,
    pub chunks: usize,
}

/// Owns the document store and publishes [`IndexSnapshot`]s.
///
/// Ingestion is serialised by the writer lock and ends with a full rebuild
/// that replaces the published snapshot in one swap. Queries clone the
/// current snapshot `Arc` and never wait for a rebuild.
pub struct HybridSearchEngine {
    settings: Settings,
    embedder: Box<dyn Embedder>,
    writer: Mutex<DocumentStore>,
    published: RwLock<Arc<IndexSnapshot>>,
    status: watch::Sender<IngestStatus>,
}

impl HybridSearchEngine {
    pub fn new(settings: Settings, embedder: Box<dyn Embedder>) -> Result<Self> {
        settings.validate()?;
        let (status, _) = watch::channel(IngestStatus::Idle);
        Ok(Self {
            writer: Mutex::new(DocumentStore::new(settings.chunking)),
            published: RwLock::new(Arc::new(IndexSnapshot::empty())),
            settings,
            embedder,
            status,
        })
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    /// Add every valid document and rebuild if at least one was added.
    /// Invalid documents are skipped. Returns the number added.
    pub fn ingest_batch(&self, documents: &[DocumentInput]) -> usize {
        let mut store = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.ingest_locked(&mut store, documents)
    }

    /// Like [`ingest_batch`](Self::ingest_batch), but refuses the whole batch
    /// when it would take the engine past `ingest.max_documents`.
    pub fn try_ingest_batch(&self, documents: &[DocumentInput]) -> Result<usize> {
        let mut store = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let max = self.settings.ingest.max_documents;
        if store.len() + documents.len() > max {
            return Err(Error::CapacityExceeded { current: store.len(), requested: documents.len(), max });
        }
        Ok(self.ingest_locked(&mut store, documents))
    }

    fn ingest_locked(&self, store: &mut DocumentStore, documents: &[DocumentInput]) -> usize {
        let mut added = 0;
        for doc in documents {
            if store.add(&doc.id, &doc.name, &doc.text) {
                added += 1;
            }
        }
        tracing::info!(requested = documents.len(), added, total = store.len(), "ingested batch");
        if added > 0 {
            let snapshot = IndexSnapshot::build(Arc::new(store.clone()), self.embedder.as_ref(), self.settings.embedding.batch_size);
            *self.published.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
        }
        added
    }

    /// Run [`try_ingest_batch`](Self::try_ingest_batch) on the blocking pool,
    /// reporting progress through [`subscribe`](Self::subscribe).
    pub fn spawn_ingest(self: &Arc<Self>, documents: Vec<DocumentInput>) -> JoinHandle<Result<usize>> {
        let engine = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            if documents.is_empty() {
                engine.status.send_replace(IngestStatus::Failed { message: "no documents to index".into() });
                return Err(Error::InvalidInput("no documents to index".into()));
            }
            let total = documents.len();
            engine.status.send_replace(IngestStatus::Processing { total });
            match engine.try_ingest_batch(&documents) {
                Ok(added) => {
                    let message = format!("Indexed {added} of {total} documents");
                    engine.status.send_replace(IngestStatus::Complete { total, added, message });
                    Ok(added)
                }
                Err(e) => {
                    tracing::error!(error = %e, "background ingestion failed");
                    engine.status.send_replace(IngestStatus::Failed { message: e.to_string() });
                    Err(e)
                }
            }
        })
    }

    /// Query the published snapshot.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let snapshot = self.snapshot();
        fusion::fuse(&snapshot, self.embedder.as_ref(), query, top_k, &self.settings.search)
    }

    /// [`search`](Self::search) for callers that must not fail: errors are
    /// logged and turned into an empty list.
    pub fn search_or_empty(&self, query: &str, top_k: usize) -> Vec<SearchResult> {
        self.search(query, top_k).unwrap_or_else(|e| {
            tracing::error!(error = %e, "search failed");
            Vec::new()
        })
    }

    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        Arc::clone(&self.published.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn document_count(&self) -> usize { self.snapshot().store().len() }

    pub fn chunk_count(&self) -> usize { self.snapshot().store().chunk_count() }

    pub fn documents(&self) -> Vec<DocumentInfo> {
        self.snapshot()
            .store()
            .documents()
            .iter()
            .map(|d| DocumentInfo { id: d.id.clone(), name: d.name.clone(), chunks: d.chunks.len() })
            .collect()
    }

    pub fn status(&self) -> IngestStatus { self.status.borrow().clone() }

    pub fn subscribe(&self) -> watch::Receiver<IngestStatus> { self.status.subscribe() }
}

impl SearchEngine for HybridSearchEngine {
    fn ingest_batch(&self, documents: &[DocumentInput]) -> usize { Self::ingest_batch(self, documents) }

    fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> { Self::search(self, query, top_k) }
}
