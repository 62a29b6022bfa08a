use anyhow::{bail, Result};
use ndarray::ArrayView1;

use pdfseek_core::traits::VectorSearcher;
use pdfseek_core::types::Neighbor;

use crate::FlatIndex;

impl VectorSearcher for FlatIndex {
	fn len(&self) -> usize { self.rows() }

	fn dim(&self) -> usize { self.width() }

	/// Scores every row; ties keep row order.
	fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
		if query.len() != self.width() { bail!("query width {} does not match index width {}", query.len(), self.width()); }
		let k = k.min(self.rows());
		if k == 0 { return Ok(Vec::new()); }
		let scores = self.matrix.dot(&ArrayView1::from(query));
		let mut order: Vec<usize> = (0..scores.len()).collect();
		order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
		order.truncate(k);
		Ok(order.into_iter().map(|position| Neighbor { position, score: scores[position] }).collect())
	}

	fn similarity(&self, position: usize, query: &[f32]) -> Option<f32> {
		if query.len() != self.width() { return None; }
		self.row(position).map(|row| row.dot(&ArrayView1::from(query)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn index() -> FlatIndex {
		FlatIndex::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.6, 0.8], vec![-1.0, 0.0], vec![0.0, 1.0]]).expect("index")
	}

	#[test]
	fn nearest_rows_come_first() {
		let hits = index().search(&[0.0, 1.0], 3).expect("search");
		let positions: Vec<usize> = hits.iter().map(|h| h.position).collect();
		assert_eq!(positions, vec![1, 4, 2], "ties keep row order");
		assert!((hits[2].score - 0.8).abs() < 1e-6);
	}

	#[test]
	fn k_is_clamped_and_scores_descend() {
		let hits = index().search(&[1.0, 0.0], 50).expect("search");
		assert_eq!(hits.len(), 5);
		for pair in hits.windows(2) { assert!(pair[0].score >= pair[1].score); }
		assert!((hits[4].score + 1.0).abs() < 1e-6, "cosine is bounded below by -1");
	}

	#[test]
	fn similarity_matches_search_score() {
		let index = index();
		let q = [0.6f32, 0.8];
		for hit in index.search(&q, 5).expect("search") {
			assert_eq!(index.similarity(hit.position, &q), Some(hit.score));
		}
		assert_eq!(index.similarity(9, &q), None);
		assert_eq!(index.similarity(0, &[1.0]), None);
	}

	#[test]
	fn wrong_query_width_is_an_error() {
		assert!(index().search(&[1.0, 0.0, 0.0], 1).is_err());
		assert!(index().search(&[1.0, 0.0], 0).expect("search").is_empty());
	}
}
