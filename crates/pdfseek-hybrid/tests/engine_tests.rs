use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};

use anyhow::Result as AnyResult;
use pdfseek_core::config::Settings;
use pdfseek_core::traits::{Embedder, SearchEngine};
use pdfseek_core::types::{DedupKey, DocumentInput};
use pdfseek_core::Error;
use pdfseek_embed::HashEmbedder;
use pdfseek_hybrid::{HybridSearchEngine, IngestStatus};

fn engine_with(settings: Settings) -> HybridSearchEngine {
    HybridSearchEngine::new(settings, Box::new(HashEmbedder::new(256))).expect("engine")
}

fn engine() -> HybridSearchEngine { engine_with(Settings::default()) }

fn words(prefix: &str, n: usize) -> String {
    (0..n).map(|i| format!("{prefix}{i}")).collect::<Vec<_>>().join(" ")
}

struct Unreachable;

impl Embedder for Unreachable {
    fn dim(&self) -> usize { 16 }
    fn max_len(&self) -> usize { 128 }
    fn embed_batch(&self, _texts: &[String]) -> AnyResult<Vec<Vec<f32>>> { anyhow::bail!("model server unreachable") }
}

/// Wraps [`HashEmbedder`]; once armed, the next `embed_batch` call reports
/// that it started and waits for a release signal.
struct Gate {
    armed: AtomicBool,
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

struct GatedEmbedder { inner: HashEmbedder, gate: Arc<Gate> }

impl Embedder for GatedEmbedder {
    fn dim(&self) -> usize { self.inner.dim() }
    fn max_len(&self) -> usize { self.inner.max_len() }
    fn embed_batch(&self, texts: &[String]) -> AnyResult<Vec<Vec<f32>>> {
        if self.gate.armed.swap(false, Ordering::SeqCst) {
            let _ = self.gate.entered.lock().expect("lock").send(());
            let _ = self.gate.release.lock().expect("lock").recv();
        }
        self.inner.embed_batch(texts)
    }
}

fn assert_aligned(snap: &pdfseek_hybrid::IndexSnapshot) {
    let n = snap.valid_chunk_indices().len();
    assert_eq!(snap.lexical().map(|l| l.len()), Some(n));
    assert_eq!(snap.vector().map(|v| v.len()), Some(n));
}

#[test]
fn single_document_is_found() {
    let engine = engine();
    let text = "The quick brown fox jumps over the lazy dog";
    assert_eq!(engine.ingest_batch(&[DocumentInput::new("1", "a.pdf", text)]), 1);
    assert_eq!(engine.chunk_count(), 1);

    let hits = engine.search("fox", 5).expect("search");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].filename, "a.pdf");
    assert_eq!(hits[0].doc_id, "1");
    assert_eq!(hits[0].snippet, text);
    assert!(hits[0].score > 0.5 && hits[0].score <= 1.1, "score {}", hits[0].score);
}

#[test]
fn documents_sharing_a_name_collapse() {
    let docs = vec![
        DocumentInput::new("r1", "report.pdf", "annual solar report with revenue figures"),
        DocumentInput::new("r2", "report.pdf", "solar report appendix tables"),
        DocumentInput::new("o1", "other.pdf", "goat cheese recipes"),
    ];
    let engine = engine();
    assert_eq!(engine.ingest_batch(&docs), 3);
    let hits = engine.search("solar report", 5).expect("search");
    assert_eq!(hits.iter().filter(|h| h.filename == "report.pdf").count(), 1);
    assert_eq!(hits[0].filename, "report.pdf");

    let mut settings = Settings::default();
    settings.search.dedup_key = DedupKey::Id;
    let engine = engine_with(settings);
    engine.ingest_batch(&docs);
    let hits = engine.search("solar report", 5).expect("search");
    assert_eq!(hits.iter().filter(|h| h.filename == "report.pdf").count(), 2);
}

#[test]
fn results_are_bounded_distinct_and_descending() {
    let engine = engine_with(Settings { ingest: pdfseek_core::config::IngestConfig { max_documents: 50 }, ..Settings::default() });
    let docs: Vec<DocumentInput> = (0..20)
        .map(|i| DocumentInput::new(format!("id{i}"), format!("doc{i}.pdf"), format!("shared topic words {} {}", words("w", i % 4 + 1), words("x", 30))))
        .collect();
    assert_eq!(engine.ingest_batch(&docs), 20);
    for top_k in [1, 3, 7] {
        let hits = engine.search("shared topic w0 w2", top_k).expect("search");
        assert_eq!(hits.len(), top_k);
        for pair in hits.windows(2) { assert!(pair[0].score >= pair[1].score); }
        let mut names: Vec<&str> = hits.iter().map(|h| h.filename.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), top_k);
    }
}

#[test]
fn degenerate_inputs_give_empty_results() {
    let engine = engine();
    assert!(engine.search("anything", 5).expect("search").is_empty(), "nothing ingested");
    engine.ingest_batch(&[DocumentInput::new("1", "a.pdf", "alpha beta gamma")]);
    assert!(engine.search("", 5).expect("search").is_empty());
    assert!(engine.search("   \n", 5).expect("search").is_empty());
    assert!(engine.search("alpha", 0).expect("search").is_empty());
}

#[test]
fn invalid_documents_are_skipped_without_rebuild() {
    let engine = engine();
    let before = engine.snapshot();
    assert_eq!(engine.ingest_batch(&[DocumentInput::new("1", "blank.pdf", " \n "), DocumentInput::new("2", "empty.pdf", "")]), 0);
    assert!(Arc::ptr_eq(&before, &engine.snapshot()));
    assert_eq!(engine.document_count(), 0);

    assert_eq!(engine.ingest_batch(&[DocumentInput::new("3", "ok.pdf", "real words"), DocumentInput::new("4", "blank.pdf", "")]), 1);
    assert!(!Arc::ptr_eq(&before, &engine.snapshot()));
    assert_eq!(engine.documents().iter().map(|d| d.name.as_str()).collect::<Vec<_>>(), vec!["ok.pdf"]);
}

#[test]
fn rebuild_covers_every_ingested_document() {
    let engine = engine();
    engine.ingest_batch(&[DocumentInput::new("a", "long.pdf", &words("lw", 420))]);
    engine.ingest_batch(&[DocumentInput::new("b", "short.pdf", "beekeeping notes for spring")]);
    assert_eq!(engine.document_count(), 2);
    assert_eq!(engine.chunk_count(), 4);

    let snap = engine.snapshot();
    assert_eq!(snap.valid_chunk_indices(), &[0, 1, 2, 3]);
    assert_eq!(snap.lexical().map(|l| l.len()), Some(4));
    assert_eq!(snap.vector().map(|v| v.len()), Some(4));

    assert_eq!(engine.search("lw7", 1).expect("search")[0].filename, "long.pdf");
    assert_eq!(engine.search("beekeeping", 1).expect("search")[0].filename, "short.pdf");
}

#[test]
fn embedding_outage_degrades_to_no_results() {
    let engine = HybridSearchEngine::new(Settings::default(), Box::new(Unreachable)).expect("engine");
    assert_eq!(engine.ingest_batch(&[DocumentInput::new("1", "a.pdf", "alpha beta")]), 1);
    let snap = engine.snapshot();
    assert!(snap.lexical().is_some());
    assert!(snap.vector().is_none());
    assert!(engine.search("alpha", 5).expect("search").is_empty());
    assert!(engine.search_or_empty("alpha", 5).is_empty());
}

#[test]
fn capacity_is_enforced_per_engine() {
    let mut settings = Settings::default();
    settings.ingest.max_documents = 2;
    let engine = engine_with(settings);
    let batch: Vec<DocumentInput> = (0..3).map(|i| DocumentInput::new(i.to_string(), format!("{i}.pdf"), "some text")).collect();
    match engine.try_ingest_batch(&batch) {
        Err(Error::CapacityExceeded { current, requested, max }) => assert_eq!((current, requested, max), (0, 3, 2)),
        other => panic!("expected capacity error, got {other:?}"),
    }
    assert_eq!(engine.document_count(), 0);
    assert_eq!(engine.try_ingest_batch(&batch[..2]).expect("ingest"), 2);
    assert!(engine.try_ingest_batch(&batch[2..]).is_err());
}

#[test]
fn usable_through_the_trait() {
    let engine = engine();
    let dyn_engine: &dyn SearchEngine = &engine;
    assert_eq!(dyn_engine.ingest_batch(&[DocumentInput::new("1", "a.pdf", "trait objects work")]), 1);
    assert_eq!(dyn_engine.search("trait", 3).expect("search").len(), 1);
}

#[tokio::test]
async fn background_ingest_reports_status() {
    let engine = Arc::new(engine());
    let mut rx = engine.subscribe();
    assert_eq!(engine.status(), IngestStatus::Idle);

    let docs = vec![DocumentInput::new("1", "a.pdf", "alpha"), DocumentInput::new("2", "b.pdf", "beta")];
    let added = engine.spawn_ingest(docs).await.expect("join").expect("ingest");
    assert_eq!(added, 2);
    rx.changed().await.expect("status update");
    match engine.status() {
        IngestStatus::Complete { total, added, message } => {
            assert_eq!((total, added), (2, 2));
            assert!(message.contains('2'));
        }
        other => panic!("unexpected status {other:?}"),
    }
    assert!(engine.status().is_finished());

    let over: Vec<DocumentInput> = (0..9).map(|i| DocumentInput::new(format!("x{i}"), format!("x{i}.pdf"), "extra text")).collect();
    let err = engine.spawn_ingest(over).await.expect("join");
    assert!(matches!(err, Err(Error::CapacityExceeded { current: 2, requested: 9, max: 10 })));
    match engine.status() {
        IngestStatus::Failed { message } => assert!(message.contains("Document limit of 10"), "{message}"),
        other => panic!("unexpected status {other:?}"),
    }
    assert_eq!(engine.document_count(), 2);

    let err = engine.spawn_ingest(Vec::new()).await.expect("join");
    assert!(matches!(err, Err(Error::InvalidInput(_))));
    assert_eq!(engine.status(), IngestStatus::Failed { message: "no documents to index".into() });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn queries_during_rebuild_see_the_previous_snapshot() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let gate = Arc::new(Gate { armed: AtomicBool::new(false), entered: Mutex::new(entered_tx), release: Mutex::new(release_rx) });
    let embedder = GatedEmbedder { inner: HashEmbedder::new(256), gate: Arc::clone(&gate) };
    let engine = Arc::new(HybridSearchEngine::new(Settings::default(), Box::new(embedder)).expect("engine"));

    assert_eq!(engine.ingest_batch(&[DocumentInput::new("1", "orchard.pdf", "apple orchard pruning notes")]), 1);
    let before = engine.snapshot();

    gate.armed.store(true, Ordering::SeqCst);
    let handle = engine.spawn_ingest(vec![
        DocumentInput::new("2", "greenhouse.pdf", "greenhouse tomato seedlings"),
        DocumentInput::new("3", "hives.pdf", "spring hive inspection"),
    ]);
    tokio::task::spawn_blocking(move || entered_rx.recv()).await.expect("join").expect("rebuild started");

    // Rebuild is parked inside the embedder: the store already holds three
    // documents, but readers still get the old snapshot as a whole.
    assert!(matches!(engine.status(), IngestStatus::Processing { total: 2 }));
    let during = engine.snapshot();
    assert!(Arc::ptr_eq(&before, &during));
    assert_eq!(engine.document_count(), 1);
    assert_aligned(&during);
    let hits = engine.search("greenhouse tomato", 5).expect("search");
    assert!(hits.iter().all(|h| h.filename == "orchard.pdf"), "{hits:?}");

    release_tx.send(()).expect("release");
    assert_eq!(handle.await.expect("join").expect("ingest"), 2);

    let after = engine.snapshot();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(engine.document_count(), 3);
    assert_eq!(after.valid_chunk_indices().len(), 3);
    assert_aligned(&after);
    assert_eq!(engine.search("greenhouse tomato", 1).expect("search")[0].filename, "greenhouse.pdf");
}
