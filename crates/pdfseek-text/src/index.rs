use anyhow::Result;
use tantivy::schema::Field;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};

use crate::tantivy_utils::{build_schema, pre_tokenize, ORDINAL_FIELD, TOKENS_FIELD};

const WRITER_MEMORY_BYTES: usize = 50_000_000;

/// BM25 index over one snapshot's valid chunks.
///
/// Row `i` of the input becomes the document with ordinal `i`; scores are
/// reported in that order regardless of how Tantivy lays out segments.
pub struct TantivyLexicalIndex {
	pub(crate) reader: IndexReader,
	pub(crate) tokens_field: Field,
	pub(crate) ordinal_field: Field,
	pub(crate) len: usize,
}

impl TantivyLexicalIndex {
	pub fn build(rows: &[Vec<String>]) -> Result<Self> {
		let schema = build_schema();
		let index = Index::create_in_ram(schema.clone());
		let tokens_field = schema.get_field(TOKENS_FIELD)?;
		let ordinal_field = schema.get_field(ORDINAL_FIELD)?;
		let mut writer: IndexWriter = index.writer_with_num_threads(1, WRITER_MEMORY_BYTES)?;
		for (ordinal, tokens) in rows.iter().enumerate() {
			let mut doc = TantivyDocument::default();
			doc.add_pre_tokenized_text(tokens_field, pre_tokenize(tokens));
			doc.add_u64(ordinal_field, ordinal as u64);
			writer.add_document(doc)?;
		}
		writer.commit()?;
		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
		tracing::debug!(rows = rows.len(), "lexical index built");
		Ok(Self { reader, tokens_field, ordinal_field, len: rows.len() })
	}
}
