use std::path::Path;

use anyhow::{Context, Result};
use uuid::Uuid;
use walkdir::WalkDir;

use pdfseek_core::chunker::clean_text;
use pdfseek_core::types::DocumentInput;

const EXTENSIONS: [&str; 2] = ["pdf", "txt"];

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// Plain text of one file, whitespace-normalized. PDFs go through `pdf-extract`.
pub fn extract_text(path: &Path) -> Result<String> {
    let is_pdf = path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    let raw = if is_pdf {
        // pdf-extract panics on some malformed files.
        std::panic::catch_unwind(|| pdf_extract::extract_text(path))
            .map_err(|_| anyhow::anyhow!("PDF parser panicked on {}", path.display()))?
            .map_err(|e| anyhow::anyhow!("Failed to extract text from {}: {}", path.display(), e))?
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?
    };
    Ok(clean_text(&raw))
}

/// Every `.pdf`/`.txt` file directly under `dir`, sorted by file name, as an
/// ingestion batch with fresh ids. Unreadable files are skipped with a warning.
pub fn load_directory(dir: &Path) -> Result<Vec<DocumentInput>> {
    if !dir.is_dir() {
        anyhow::bail!("{} is not a directory", dir.display());
    }
    let mut docs = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_supported(path) { continue; }
        let name = entry.file_name().to_string_lossy().into_owned();
        match extract_text(path) {
            Ok(text) => docs.push(DocumentInput::new(Uuid::new_v4().to_string(), name, text)),
            Err(e) => tracing::warn!(file = %path.display(), error = %format!("{e:#}"), "skipping unreadable file"),
        }
    }
    tracing::info!(dir = %dir.display(), files = docs.len(), "loaded documents");
    Ok(docs)
}
