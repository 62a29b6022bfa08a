//! pdfseek-text
//!
//! Lexical retriever: BM25 over the valid chunks of a snapshot, backed by an
//! in-RAM Tantivy index built from pre-tokenized text.

pub mod tantivy_utils;
pub mod index;
pub mod search;

pub use index::TantivyLexicalIndex;
