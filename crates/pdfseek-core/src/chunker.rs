//! Word-window chunking and the shared whitespace tokenizer.
//!
//! A document is split on whitespace and emitted as windows of `size` words,
//! each window starting `size - overlap` words after the previous one. The
//! last window is the first one that reaches the end of the word sequence, so
//! `N > 0` words yield `ceil(max(0, N - size) / (size - overlap)) + 1` chunks.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_CHUNK_SIZE: usize = 200;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { size: DEFAULT_CHUNK_SIZE, overlap: DEFAULT_CHUNK_OVERLAP }
    }
}

impl ChunkingConfig {
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        let config = Self { size, overlap };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(Error::InvalidConfig("chunking.size must be positive".into()));
        }
        if self.overlap >= self.size {
            return Err(Error::InvalidConfig(format!(
                "chunking.overlap ({}) must be smaller than chunking.size ({})",
                self.overlap, self.size
            )));
        }
        Ok(())
    }

    /// Number of words between the starts of two consecutive windows.
    pub fn step(&self) -> usize { self.size - self.overlap }

    pub fn chunk(&self, text: &str) -> Result<Vec<String>> { chunk_text(text, self.size, self.overlap) }
}

/// Split `text` into overlapping windows of at most `size` words.
///
/// Empty or whitespace-only input yields no chunks. Words are never split.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Result<Vec<String>> {
    let config = ChunkingConfig::new(size, overlap)?;
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < words.len() {
        let end = (start + config.size).min(words.len());
        chunks.push(words[start..end].join(" "));
        if end >= words.len() { break; }
        start += config.step();
    }
    Ok(chunks)
}

/// Lower-case whitespace tokenization used for both chunks and queries.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
