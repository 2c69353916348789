use anyhow::Result;
use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, FAST, INDEXED, STORED, STRING};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};
use tantivy::Index;

pub const TOKENIZER: &str = "searchable";

pub const KEY: &str = "key";
pub const RECORD_TYPE: &str = "record_type";
pub const RECORD_ID: &str = "record_id";
pub const INDEX_ID: &str = "index_id";
pub const TITLE: &str = "title";
pub const CONTENT: &str = "content";
pub const TITLE_CONTENT: &str = "title_content";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// Default stopword list of MySQL InnoDB full-text indexes.
const STOP_WORDS: [&str; 35] = [
	"a", "about", "an", "are", "as", "at", "be", "by", "com", "de", "en", "for", "from", "how", "i", "in", "is", "it",
	"la", "of", "on", "or", "that", "the", "this", "to", "was", "what", "when", "where", "who", "will", "with", "und",
	"www",
];

/// One document per index row. `key` ("type#id") is the unique term rows
/// are replaced and deleted by; `title_content` is the combined match field.
pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	schema_builder.add_text_field(KEY, STRING | STORED);
	schema_builder.add_text_field(RECORD_TYPE, STRING | STORED);
	schema_builder.add_u64_field(RECORD_ID, INDEXED | STORED | FAST);
	schema_builder.add_u64_field(INDEX_ID, STORED | FAST);
	let indexing = TextFieldIndexing::default().set_tokenizer(TOKENIZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let stored_text = TextOptions::default().set_indexing_options(indexing.clone()).set_stored();
	schema_builder.add_text_field(TITLE, stored_text.clone());
	schema_builder.add_text_field(CONTENT, stored_text);
	schema_builder.add_text_field(TITLE_CONTENT, TextOptions::default().set_indexing_options(indexing));
	schema_builder.add_i64_field(CREATED_AT, STORED);
	schema_builder.add_i64_field(UPDATED_AT, STORED);
	schema_builder.build()
}

pub fn register_tokenizer(index: &Index) {
	let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(STOP_WORDS.iter().map(|s| s.to_string())))
		.build();
	index.tokenizers().register(TOKENIZER, tokenizer);
}

#[derive(Debug, Clone, Copy)]
pub struct IndexFields {
	pub key: Field,
	pub record_type: Field,
	pub record_id: Field,
	pub index_id: Field,
	pub title: Field,
	pub content: Field,
	pub title_content: Field,
	pub created_at: Field,
	pub updated_at: Field,
}

impl IndexFields {
	pub fn from_schema(schema: &Schema) -> Result<Self> {
		Ok(Self {
			key: schema.get_field(KEY)?,
			record_type: schema.get_field(RECORD_TYPE)?,
			record_id: schema.get_field(RECORD_ID)?,
			index_id: schema.get_field(INDEX_ID)?,
			title: schema.get_field(TITLE)?,
			content: schema.get_field(CONTENT)?,
			title_content: schema.get_field(TITLE_CONTENT)?,
			created_at: schema.get_field(CREATED_AT)?,
			updated_at: schema.get_field(UPDATED_AT)?,
		})
	}
}

/// Lowercased, stopword-filtered tokens of `text`, in order, without repeats.
pub fn analyze(index: &Index, field: Field, text: &str) -> Result<Vec<String>> {
	let mut analyzer = index.tokenizer_for_field(field)?;
	let mut stream = analyzer.token_stream(text);
	let mut terms: Vec<String> = Vec::new();
	while stream.advance() {
		let term = &stream.token().text;
		if !terms.contains(term) {
			terms.push(term.clone());
		}
	}
	Ok(terms)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn analyzer_lowercases_and_drops_stop_words() {
		let index = Index::create_in_ram(build_schema());
		register_tokenizer(&index);
		let fields = IndexFields::from_schema(&index.schema()).expect("fields");
		let terms = analyze(&index, fields.title_content, "The Rust book, the RUST way: contact x y com").expect("analyze");
		assert_eq!(terms, vec!["rust", "book", "way", "contact", "x", "y"]);
	}
}
