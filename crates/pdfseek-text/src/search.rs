use anyhow::{anyhow, Result};
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{TantivyDocument, Term};

use pdfseek_core::traits::LexicalScorer;

use crate::index::TantivyLexicalIndex;

impl LexicalScorer for TantivyLexicalIndex {
	fn len(&self) -> usize { self.len }

	/// One `Should` clause per query token, duplicates included, so a word
	/// repeated in the query contributes once per occurrence.
	fn score(&self, query_tokens: &[String]) -> Result<Vec<f32>> {
		let mut scores = vec![0f32; self.len];
		if query_tokens.is_empty() || self.len == 0 { return Ok(scores); }
		let clauses: Vec<(Occur, Box<dyn Query>)> = query_tokens
			.iter()
			.map(|t| {
				let term = Term::from_field_text(self.tokens_field, t);
				(Occur::Should, Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)) as Box<dyn Query>)
			})
			.collect();
		let query = BooleanQuery::new(clauses);
		let searcher = self.reader.searcher();
		let top_docs = searcher.search(&query, &TopDocs::with_limit(self.len))?;
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr)?;
			let ordinal = doc
				.get_first(self.ordinal_field)
				.and_then(|v| v.as_u64())
				.ok_or_else(|| anyhow!("lexical document {:?} has no ordinal", addr))?;
			match scores.get_mut(ordinal as usize) {
				Some(slot) => *slot = score,
				None => return Err(anyhow!("lexical ordinal {} out of range {}", ordinal, self.len)),
			}
		}
		Ok(scores)
	}
}
