//! Score fusion over one [`IndexSnapshot`].
//!
//! Lexical and vector candidates are merged into one pool, every pooled chunk
//! gets an exact vector similarity, and the blended score
//! `w_lex * normalized_lexical + w_rank / (1 + rank) + w_vec * max(0, similarity)`
//! ranks them. Results are then collapsed to one per document.

use std::collections::HashMap;

use pdfseek_core::chunker::tokenize;
use pdfseek_core::config::SearchConfig;
use pdfseek_core::traits::Embedder;
use pdfseek_core::types::{DedupKey, SearchResult};
use pdfseek_core::{Error, Result};

use crate::snapshot::IndexSnapshot;

const EPSILON: f64 = 1e-8;

/// Scores keyed by index position, remembering first-insertion order.
#[derive(Default)]
struct OrderedScores {
    order: Vec<usize>,
    values: HashMap<usize, f64>,
}

impl OrderedScores {
    fn add(&mut self, position: usize, delta: f64) {
        match self.values.get_mut(&position) {
            Some(v) => *v += delta,
            None => {
                self.order.push(position);
                self.values.insert(position, delta);
            }
        }
    }

    /// Insert, or overwrite when `value` is larger than what is recorded.
    fn raise(&mut self, position: usize, value: f64) {
        match self.values.get_mut(&position) {
            Some(v) if value > *v => *v = value,
            Some(_) => {}
            None => {
                self.order.push(position);
                self.values.insert(position, value);
            }
        }
    }

    fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.order.iter().filter_map(|p| self.values.get(p).map(|v| (*p, *v)))
    }
}

/// Positions of the `pool` highest scores, best first. Ties keep index order.
pub fn top_lexical(scores: &[f32], pool: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order.truncate(pool.min(scores.len()));
    order
}

/// First `max_chars` characters of `text`, with `...` appended when cut.
pub fn snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte, _)) => format!("{}...", &text[..byte]),
        None => text.to_string(),
    }
}

/// Scale to unit length so inner products against the index rows are cosines.
fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() { *x /= norm; }
    }
}

fn round4(x: f64) -> f32 { ((x * 10_000.0).round() / 10_000.0) as f32 }

/// Rank the chunks of `snapshot` against `query` and return at most `top_k`
/// results, one per document key, best first.
///
/// A blank query, `top_k == 0` or a snapshot missing either index yields an
/// empty list. Scorer, provider and index failures are returned as errors.
#[tracing::instrument(skip_all, fields(top_k = top_k))]
pub fn fuse(snapshot: &IndexSnapshot, embedder: &dyn Embedder, query: &str, top_k: usize, config: &SearchConfig) -> Result<Vec<SearchResult>> {
    let tokens = tokenize(query);
    if top_k == 0 || tokens.is_empty() {
        return Ok(Vec::new());
    }
    let valid = snapshot.valid_chunk_indices();
    let (Some(lexical), Some(vector)) = (snapshot.lexical(), snapshot.vector()) else {
        tracing::debug!(
            lexical = snapshot.lexical().is_some(),
            vector = snapshot.vector().is_some(),
            "index incomplete, no results"
        );
        return Ok(Vec::new());
    };
    if valid.is_empty() {
        return Ok(Vec::new());
    }

    let scores = lexical.score(&tokens).map_err(|e| Error::index(&e))?;
    if scores.len() != valid.len() {
        return Err(Error::Index(format!("lexical scorer returned {} scores for {} chunks", scores.len(), valid.len())));
    }
    let bm25_top = top_lexical(&scores, config.lexical_pool);
    let max_score = f64::from(scores.iter().copied().fold(f32::NEG_INFINITY, f32::max));

    let mut query_vec = embedder
        .embed_batch(&[query.to_string()])
        .map_err(|e| Error::embedding(&e))?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Embedding("provider returned no vector for the query".into()))?;
    l2_normalize(&mut query_vec);
    let search_k = top_k.saturating_mul(config.vector_overfetch).min(vector.len());
    let neighbors = if search_k > 0 { vector.search(&query_vec, search_k).map_err(|e| Error::index(&e))? } else { Vec::new() };

    let mut similarities = OrderedScores::default();
    for n in &neighbors {
        similarities.raise(n.position, f64::from(n.score));
    }
    let mut pool: Vec<usize> = Vec::new();
    for pos in bm25_top.iter().take(config.candidate_pool).copied().chain(neighbors.iter().take(config.candidate_pool).map(|n| n.position)) {
        if !pool.contains(&pos) { pool.push(pos); }
    }
    for &pos in &pool {
        if let Some(sim) = vector.similarity(pos, &query_vec) {
            similarities.raise(pos, f64::from(sim));
        }
    }

    let mut fused = OrderedScores::default();
    for (rank, &pos) in bm25_top.iter().enumerate() {
        let normalized = if max_score > 0.0 { f64::from(scores[pos]) / (max_score + EPSILON) } else { 0.0 };
        fused.add(pos, config.lexical_weight * normalized + config.rank_weight / (rank as f64 + 1.0));
    }
    for (pos, sim) in similarities.iter() {
        fused.add(pos, config.vector_weight * sim.max(0.0));
    }

    let mut ranked: Vec<(usize, f64)> = fused.iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(top_k.saturating_mul(config.dedup_overfetch));
    tracing::debug!(
        lexical = bm25_top.len(),
        vector = neighbors.len(),
        pooled = pool.len(),
        fused = ranked.len(),
        "fused candidates"
    );

    let store = snapshot.store();
    let mut results = Vec::with_capacity(ranked.len());
    for (pos, score) in ranked {
        let Some(&global) = valid.get(pos) else { continue };
        let (Some(chunk), Some(doc)) = (store.chunk(global), store.resolve(global)) else { continue };
        results.push(SearchResult {
            filename: doc.name.clone(),
            doc_id: doc.id.clone(),
            score: round4(score),
            snippet: snippet(chunk, config.snippet_chars),
        });
    }
    Ok(dedup(results, config.dedup_key, top_k))
}

/// Keep the best result per key (a later one wins only when strictly
/// higher), order by score and cut to `top_k`.
pub fn dedup(results: Vec<SearchResult>, key: DedupKey, top_k: usize) -> Vec<SearchResult> {
    let mut kept: Vec<SearchResult> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    for r in results {
        let k = match key {
            DedupKey::Name => r.filename.clone(),
            DedupKey::Id => r.doc_id.clone(),
        };
        match seen.get(&k) {
            Some(&i) => {
                if r.score > kept[i].score { kept[i] = r; }
            }
            None => {
                seen.insert(k, kept.len());
                kept.push(r);
            }
        }
    }
    kept.sort_by(|a, b| b.score.total_cmp(&a.score));
    kept.truncate(top_k);
    kept
}
