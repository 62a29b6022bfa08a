use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};

use pdfseek_core::traits::Embedder;

use crate::FlatIndex;

/// Embed `texts` in batches of `batch_size` and stack the rows into a
/// [`FlatIndex`]. Row `i` corresponds to `texts[i]`.
///
/// Fails when the provider errors, returns the wrong number of rows, or
/// returns rows whose width differs from `embedder.dim()`.
#[tracing::instrument(skip_all, fields(texts = texts.len(), batch_size = batch_size))]
pub fn build_with_embedder(embedder: &dyn Embedder, texts: &[String], batch_size: usize) -> Result<FlatIndex> {
    let batch_size = batch_size.max(1);
    let pb = ProgressBar::new(texts.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks embedded") {
        pb.set_style(style.progress_chars("#>-"));
    }
    let mut rows = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size) {
        let embedded = embedder.embed_batch(batch)?;
        if embedded.len() != batch.len() {
            bail!("embedder returned {} rows for {} texts", embedded.len(), batch.len());
        }
        if let Some(bad) = embedded.iter().find(|row| row.len() != embedder.dim()) {
            bail!("embedder returned a row of width {}, expected {}", bad.len(), embedder.dim());
        }
        rows.extend(embedded);
        pb.inc(batch.len() as u64);
    }
    pb.finish_and_clear();
    let index = FlatIndex::from_rows(rows)?;
    tracing::info!(rows = index.rows(), dim = index.width(), "vector index built");
    Ok(index)
}
