//! Exact inner-product vector index.
//!
//! One L2-normalized row per valid chunk, in the same order as the snapshot's
//! `valid_chunk_indices`. Search is brute force over the whole matrix, which is
//! the intended strategy for a bounded corpus.

use anyhow::{bail, Result};
use ndarray::{Array2, ArrayView1};

pub mod index_build;
pub mod search;

pub use index_build::build_with_embedder;

#[derive(Debug, Clone)]
pub struct FlatIndex { matrix: Array2<f32> }

impl FlatIndex {
    /// Stack `rows` into a matrix, normalizing each row to unit length.
    /// All rows must share one non-zero width.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let n = rows.len();
        let dim = rows.first().map_or(0, Vec::len);
        if n > 0 && dim == 0 { bail!("embedding rows are empty"); }
        let mut flat = Vec::with_capacity(n * dim);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != dim { bail!("embedding row {} has width {}, expected {}", i, row.len(), dim); }
            flat.extend(row);
        }
        let mut matrix = Array2::from_shape_vec((n, dim), flat)?;
        for mut row in matrix.rows_mut() {
            let norm = row.dot(&row).sqrt();
            if norm > 0.0 { row.mapv_inplace(|x| x / norm); }
        }
        Ok(Self { matrix })
    }

    pub fn rows(&self) -> usize { self.matrix.nrows() }

    pub fn width(&self) -> usize { self.matrix.ncols() }

    pub fn row(&self, position: usize) -> Option<ArrayView1<'_, f32>> {
        (position < self.rows()).then(|| self.matrix.row(position))
    }
}
