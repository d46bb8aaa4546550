//! Tantivy-backed full-text index
//!
//! One Tantivy index holds every searchable collection. Each document carries
//! its collection name, its record id and the collection's text fields; the
//! schema is derived from [`SEARCHABLE_COLLECTIONS`]. Queries use Tantivy's
//! query parser over the collection's fields, filtered to the collection.
//!
//! The index lives in RAM or in a directory on disk, depending on
//! configuration. Every write is committed immediately and the reader is
//! reloaded, so a write is visible to the next query.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::Mutex;
use tantivy::collector::{Count, TopDocs};
use tantivy::directory::MmapDirectory;
use tantivy::query::{BooleanQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{
    Field, IndexRecordOption, Schema, Value, FAST, INDEXED, STORED, STRING, TEXT,
};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};

use crate::domain::search::{
    searchable_collection, IndexError, SearchHits, SearchIndex, SEARCHABLE_COLLECTIONS,
};

/// Smallest writer memory budget Tantivy accepts for one indexing thread.
pub const MIN_WRITER_MEMORY_BYTES: usize = 15_000_000;

/// Tantivy search index shared by all searchable collections
pub struct TantivySearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    /// Collection name, stored as-is
    collection_field: Field,
    /// `collection:id`, the unique key used for upserts and deletes
    key_field: Field,
    id_field: Field,
    /// Text fields by name, shared across collections
    text_fields: HashMap<&'static str, Field>,
}

impl TantivySearchIndex {
    /// Create an index held entirely in memory.
    pub fn new_in_ram(writer_memory_bytes: usize) -> Result<Self, IndexError> {
        let (schema, _) = Self::build_schema();
        let index = Index::create_in_ram(schema);
        Self::from_index(index, writer_memory_bytes)
    }

    /// Open the index stored under `path`, creating it if missing.
    pub fn open(path: impl AsRef<Path>, writer_memory_bytes: usize) -> Result<Self, IndexError> {
        let path = path.as_ref();
        std::fs::create_dir_all(path).map_err(|e| IndexError::Storage(e.to_string()))?;

        let directory = MmapDirectory::open(path).map_err(|e| IndexError::Storage(e.to_string()))?;
        let (schema, _) = Self::build_schema();
        let index = Index::open_or_create(directory, schema)
            .map_err(|e| IndexError::Storage(e.to_string()))?;

        tracing::info!(path = %path.display(), "Opened search index");
        Self::from_index(index, writer_memory_bytes)
    }

    fn build_schema() -> (Schema, Vec<&'static str>) {
        let mut builder = Schema::builder();
        builder.add_text_field("collection", STRING | STORED);
        builder.add_text_field("key", STRING);
        builder.add_i64_field("id", INDEXED | STORED | FAST);

        let mut names: Vec<&'static str> = Vec::new();
        for collection in SEARCHABLE_COLLECTIONS {
            for &field in collection.fields {
                if !names.contains(&field) {
                    builder.add_text_field(field, TEXT);
                    names.push(field);
                }
            }
        }

        (builder.build(), names)
    }

    fn from_index(index: Index, writer_memory_bytes: usize) -> Result<Self, IndexError> {
        let schema = index.schema();
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|e| IndexError::Storage(format!("schema is missing {name}: {e}")))
        };

        let collection_field = field("collection")?;
        let key_field = field("key")?;
        let id_field = field("id")?;

        let (_, names) = Self::build_schema();
        let mut text_fields = HashMap::new();
        for name in names {
            text_fields.insert(name, field(name)?);
        }

        let writer: IndexWriter = index
            .writer_with_num_threads(1, writer_memory_bytes.max(MIN_WRITER_MEMORY_BYTES))
            .map_err(|e| IndexError::Storage(e.to_string()))?;

        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e: tantivy::TantivyError| IndexError::Storage(e.to_string()))?;

        Ok(Self {
            index,
            reader,
            writer: Mutex::new(writer),
            collection_field,
            key_field,
            id_field,
            text_fields,
        })
    }

    fn key_term(&self, collection: &str, id: i64) -> Term {
        Term::from_field_text(self.key_field, &format!("{collection}:{id}"))
    }

    /// Commit the writer and make the change visible to searchers.
    fn commit(&self, writer: &mut IndexWriter) -> Result<(), IndexError> {
        writer
            .commit()
            .map_err(|e| IndexError::Write(e.to_string()))?;
        self.reader
            .reload()
            .map_err(|e| IndexError::Storage(e.to_string()))
    }

    fn build_query(
        &self,
        collection: &str,
        fields: &[&'static str],
        expression: &str,
    ) -> Option<Box<dyn Query>> {
        let search_fields: Vec<Field> = fields
            .iter()
            .filter_map(|name| self.text_fields.get(name).copied())
            .collect();

        let parser = QueryParser::for_index(&self.index, search_fields);
        let parsed = match parser.parse_query(expression) {
            Ok(query) => query,
            Err(e) => {
                tracing::warn!(collection, expression, error = %e, "Malformed search expression");
                return None;
            }
        };

        let in_collection = TermQuery::new(
            Term::from_field_text(self.collection_field, collection),
            IndexRecordOption::Basic,
        );

        Some(Box::new(BooleanQuery::new(vec![
            (Occur::Must, Box::new(in_collection) as Box<dyn Query>),
            (Occur::Must, parsed),
        ])))
    }
}

impl SearchIndex for TantivySearchIndex {
    fn add_or_update(
        &self,
        collection: &str,
        id: i64,
        fields: &[(&'static str, String)],
    ) -> Result<(), IndexError> {
        let searchable = searchable_collection(collection)
            .ok_or_else(|| IndexError::UnknownCollection(collection.to_string()))?;

        let mut doc = TantivyDocument::new();
        doc.add_text(self.collection_field, searchable.name);
        doc.add_text(self.key_field, format!("{collection}:{id}"));
        doc.add_i64(self.id_field, id);
        for (name, value) in fields {
            if let Some(field) = self.text_fields.get(name) {
                doc.add_text(*field, value);
            }
        }

        let mut writer = self.writer.lock();
        writer.delete_term(self.key_term(collection, id));
        writer
            .add_document(doc)
            .map_err(|e| IndexError::Write(e.to_string()))?;
        self.commit(&mut writer)?;

        tracing::debug!(collection, id, "Indexed document");
        Ok(())
    }

    fn remove(&self, collection: &str, id: i64) -> Result<(), IndexError> {
        if searchable_collection(collection).is_none() {
            return Err(IndexError::UnknownCollection(collection.to_string()));
        }

        let mut writer = self.writer.lock();
        writer.delete_term(self.key_term(collection, id));
        self.commit(&mut writer)?;

        tracing::debug!(collection, id, "Removed document");
        Ok(())
    }

    fn query(
        &self,
        collection: &str,
        expression: &str,
        page: usize,
        page_size: usize,
    ) -> SearchHits {
        let Some(searchable) = searchable_collection(collection) else {
            tracing::warn!(collection, "Query on unknown collection");
            return SearchHits::empty();
        };
        if expression.trim().is_empty() || page_size == 0 {
            return SearchHits::empty();
        }

        let Some(query) = self.build_query(collection, searchable.fields, expression) else {
            return SearchHits::empty();
        };

        let offset = page.saturating_sub(1).saturating_mul(page_size);
        let searcher = self.reader.searcher();
        if offset as u64 >= searcher.num_docs() {
            // Past the last document: only the total is needed.
            return match searcher.search(&query, &Count) {
                Ok(total) => SearchHits {
                    ids: Vec::new(),
                    total: total as u64,
                },
                Err(e) => {
                    tracing::error!(collection, error = %e, "Search failed");
                    SearchHits::empty()
                }
            };
        }

        let (top_docs, total) = match searcher.search(
            &query,
            &(TopDocs::with_limit(page_size).and_offset(offset), Count),
        ) {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(collection, error = %e, "Search failed");
                return SearchHits::empty();
            }
        };

        let mut ids = Vec::with_capacity(top_docs.len());
        for (_score, address) in top_docs {
            match searcher.doc::<TantivyDocument>(address) {
                Ok(doc) => {
                    if let Some(id) = doc.get_first(self.id_field).and_then(|v| v.as_i64()) {
                        ids.push(id);
                    }
                }
                Err(e) => tracing::error!(error = %e, "Failed to retrieve document"),
            }
        }

        SearchHits {
            ids,
            total: total as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn index_with(posts: &[(i64, &str)]) -> TantivySearchIndex {
        let index = TantivySearchIndex::new_in_ram(MIN_WRITER_MEMORY_BYTES).unwrap();
        for &(id, body) in posts {
            index
                .add_or_update("posts", id, &[("body", body.to_string())])
                .unwrap();
        }
        index
    }

    #[test]
    fn test_query_finds_matching_posts() {
        let index = index_with(&[
            (1, "learning rust today"),
            (2, "python is nice"),
            (3, "rust and tantivy"),
        ]);

        let hits = index.query("posts", "rust", 1, 10);
        assert_eq!(hits.total, 2);
        let mut ids = hits.ids.clone();
        ids.sort();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_upsert_replaces_previous_document() {
        let index = index_with(&[(1, "old words")]);
        index
            .add_or_update("posts", 1, &[("body", "new words".to_string())])
            .unwrap();

        assert_eq!(index.query("posts", "old", 1, 10).total, 0);
        assert_eq!(index.query("posts", "new", 1, 10).ids, vec![1]);
        assert_eq!(index.query("posts", "words", 1, 10).total, 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let index = index_with(&[(1, "hello there")]);
        index.remove("posts", 1).unwrap();
        index.remove("posts", 1).unwrap();

        assert_eq!(index.query("posts", "hello", 1, 10), SearchHits::empty());
    }

    #[test]
    fn test_pagination_reports_full_total() {
        let posts: Vec<(i64, String)> = (1..=5).map(|i| (i, format!("common word {i}"))).collect();
        let index = TantivySearchIndex::new_in_ram(MIN_WRITER_MEMORY_BYTES).unwrap();
        for (id, body) in &posts {
            index.add_or_update("posts", *id, &[("body", body.clone())]).unwrap();
        }

        let first = index.query("posts", "common", 1, 2);
        let third = index.query("posts", "common", 3, 2);
        assert_eq!(first.total, 5);
        assert_eq!(first.ids.len(), 2);
        assert_eq!(third.ids.len(), 1);
        assert_eq!(index.query("posts", "common", 4, 2).ids, Vec::<i64>::new());
    }

    #[test]
    fn test_page_far_past_the_end_is_empty() {
        let index = index_with(&[(1, "common word"), (2, "common ground")]);

        let hits = index.query("posts", "common", usize::MAX, 25);
        assert_eq!(hits.ids, Vec::<i64>::new());
        assert_eq!(hits.total, 2);
    }

    #[test]
    fn test_malformed_expression_yields_no_hits() {
        let index = index_with(&[(1, "anything")]);
        assert_eq!(index.query("posts", "nosuchfield:anything", 1, 10), SearchHits::empty());
    }

    #[test]
    fn test_unknown_collection() {
        let index = index_with(&[(1, "anything")]);
        assert_eq!(index.query("users", "anything", 1, 10), SearchHits::empty());
        assert!(matches!(
            index.add_or_update("users", 1, &[]),
            Err(IndexError::UnknownCollection(_))
        ));
        assert!(index.remove("users", 1).is_err());
    }

    #[test]
    fn test_blank_expression_yields_no_hits() {
        let index = index_with(&[(1, "anything")]);
        assert_eq!(index.query("posts", "   ", 1, 10).total, 0);
    }

    #[test]
    fn test_on_disk_index_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let index = TantivySearchIndex::open(dir.path(), MIN_WRITER_MEMORY_BYTES).unwrap();
            index
                .add_or_update("posts", 7, &[("body", "persisted body".to_string())])
                .unwrap();
        }

        let reopened = TantivySearchIndex::open(dir.path(), MIN_WRITER_MEMORY_BYTES).unwrap();
        assert_eq!(reopened.query("posts", "persisted", 1, 10).ids, vec![7]);
    }
}
