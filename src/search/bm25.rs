//! Lexical retrieval leg: a BM25 index built on tantivy.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexWriter, ReloadPolicy, TantivyDocument};

use crate::models::Document;
use crate::search::LexicalIndex;

/// BM25 search index over the document corpus.
pub struct Bm25Index {
    index: Index,
    f_content: Field,
    /// Document metadata, stored verbatim as a JSON string.
    f_metadata: Field,
}

impl Bm25Index {
    /// Create or open a BM25 index at the given directory.
    pub fn open_or_create(index_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(index_dir)?;

        let mut schema_builder = Schema::builder();
        let f_content = schema_builder.add_text_field("content", TEXT | STORED);
        let f_metadata = schema_builder.add_text_field("metadata", STRING | STORED);
        let schema = schema_builder.build();

        let index = if index_dir.join("meta.json").exists() {
            Index::open_in_dir(index_dir).context("Failed to open existing tantivy index")?
        } else {
            Index::create_in_dir(index_dir, schema).context("Failed to create tantivy index")?
        };

        Ok(Self {
            index,
            f_content,
            f_metadata,
        })
    }

    /// Index a batch of documents.
    pub fn index_documents(&self, documents: &[Document]) -> Result<()> {
        let mut writer: IndexWriter = self
            .index
            .writer(50_000_000)
            .context("Failed to create index writer")?;

        for document in documents {
            let metadata_json = serde_json::to_string(&document.metadata)?;
            writer.add_document(doc!(
                self.f_content => document.content.clone(),
                self.f_metadata => metadata_json,
            ))?;
        }

        writer.commit().context("Failed to commit index")?;
        Ok(())
    }

    /// Search the index and return documents ranked by BM25 score.
    pub fn search(&self, query_str: &str, limit: usize) -> Result<Vec<Document>> {
        let reader = self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .context("Failed to create reader")?;

        let searcher = reader.searcher();

        let query_parser = QueryParser::for_index(&self.index, vec![self.f_content]);
        let query = query_parser
            .parse_query(query_str)
            .context("Failed to parse search query")?;

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit))
            .context("Search failed")?;

        let mut results = Vec::new();

        for (_score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(doc_address)
                .context("Failed to retrieve document")?;

            let content = doc
                .get_first(self.f_content)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();

            let metadata = doc
                .get_first(self.f_metadata)
                .and_then(|v| v.as_str())
                .and_then(|s| serde_json::from_str(s).ok())
                .unwrap_or_default();

            results.push(Document { content, metadata });
        }

        Ok(results)
    }
}

/// [`LexicalIndex`] over [`Bm25Index`]. Tantivy queries are synchronous,
/// so they run on the blocking pool.
pub struct Bm25Lexical(pub Arc<Bm25Index>);

#[async_trait]
impl LexicalIndex for Bm25Lexical {
    async fn query(&self, text: &str, limit: usize) -> Result<Vec<Document>> {
        let index = self.0.clone();
        let text = text.to_string();
        tokio::task::spawn_blocking(move || index.search(&text, limit))
            .await
            .context("BM25 search task failed")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetaValue;

    #[test]
    fn test_index_and_search_ranks_matches() {
        let dir = tempfile::tempdir().unwrap();
        let index = Bm25Index::open_or_create(dir.path()).unwrap();

        let docs = vec![
            Document::new("agent memory comes in short-term and long-term forms"),
            Document::new("prompt engineering techniques for better completions"),
            Document::new("adversarial attacks on language models"),
        ];
        index.index_documents(&docs).unwrap();

        let results = index.search("agent memory", 10).unwrap();
        assert!(!results.is_empty());
        assert!(results[0].content.contains("memory"));
    }

    #[test]
    fn test_metadata_round_trips_through_index() {
        let dir = tempfile::tempdir().unwrap();
        let index = Bm25Index::open_or_create(dir.path()).unwrap();

        let mut doc = Document::new("retrieval augmented generation overview");
        doc.metadata
            .insert("source".to_string(), MetaValue::Str("blog".to_string()));
        doc.metadata.insert("page".to_string(), MetaValue::Num(3.0));
        index.index_documents(&[doc.clone()]).unwrap();

        let results = index.search("retrieval", 10).unwrap();
        assert_eq!(results[0].metadata, doc.metadata);
    }

    #[test]
    fn test_search_limit_respected() {
        let dir = tempfile::tempdir().unwrap();
        let index = Bm25Index::open_or_create(dir.path()).unwrap();

        let docs: Vec<Document> = (0..20)
            .map(|i| Document::new(format!("memory systems note number {i}")))
            .collect();
        index.index_documents(&docs).unwrap();

        let results = index.search("memory", 5).unwrap();
        assert_eq!(results.len(), 5);
    }
}
