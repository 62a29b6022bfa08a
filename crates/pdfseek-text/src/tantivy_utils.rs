use tantivy::schema::{IndexRecordOption, Schema, TextFieldIndexing, TextOptions, FAST, STORED};
use tantivy::tokenizer::{PreTokenizedString, Token};

pub const TOKENS_FIELD: &str = "tokens";
pub const ORDINAL_FIELD: &str = "ordinal";

/// Tokens are supplied pre-tokenized, so the field uses the `raw` tokenizer and
/// only needs frequencies (BM25 has no use for positions).
pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	let indexing = TextFieldIndexing::default().set_tokenizer("raw").set_index_option(IndexRecordOption::WithFreqs);
	let _tokens_field = schema_builder.add_text_field(TOKENS_FIELD, TextOptions::default().set_indexing_options(indexing));
	let _ordinal_field = schema_builder.add_u64_field(ORDINAL_FIELD, STORED | FAST);
	schema_builder.build()
}

/// Wrap already-normalized tokens so Tantivy indexes them verbatim.
pub fn pre_tokenize(tokens: &[String]) -> PreTokenizedString {
	let mut offset = 0;
	let mut out = Vec::with_capacity(tokens.len());
	for (position, text) in tokens.iter().enumerate() {
		out.push(Token { offset_from: offset, offset_to: offset + text.len(), position, text: text.clone(), position_length: 1 });
		offset += text.len() + 1;
	}
	PreTokenizedString { text: tokens.join(" "), tokens: out }
}
