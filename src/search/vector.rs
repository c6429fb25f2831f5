//! In-memory vector store with disk persistence, plus the embedding-backed
//! semantic index built on it.

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::config::LlmConfig;
use crate::llm::embeddings::embed_single;
use crate::models::Document;
use crate::search::SemanticIndex;

/// A stored vector entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VectorEntry {
    document: Document,
    embedding: Vec<f32>,
}

/// In-memory vector store with JSON disk persistence and cosine
/// similarity search.
pub struct VectorStore {
    entries: RwLock<Vec<VectorEntry>>,
    persist_path: std::path::PathBuf,
}

impl VectorStore {
    pub fn open_or_create(vector_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(vector_dir)?;
        let persist_path = vector_dir.join("vectors.json");

        let entries = if persist_path.exists() {
            let data =
                std::fs::read_to_string(&persist_path).context("Failed to read vector store")?;
            match serde_json::from_str(&data) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(
                        "Discarding unreadable vector store at {}: {e}",
                        persist_path.display()
                    );
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Ok(Self {
            entries: RwLock::new(entries),
            persist_path,
        })
    }

    /// Add documents with their embeddings. `embeddings` must be parallel
    /// with `documents`.
    pub fn add_documents(
        &self,
        documents: &[Document],
        embeddings: Vec<Vec<f32>>,
    ) -> Result<()> {
        let mut entries = self.entries.write();

        for (i, document) in documents.iter().enumerate() {
            if let Some(embedding) = embeddings.get(i) {
                entries.push(VectorEntry {
                    document: document.clone(),
                    embedding: embedding.clone(),
                });
            }
        }

        let data = serde_json::to_string(&*entries)?;
        std::fs::write(&self.persist_path, data)?;

        Ok(())
    }

    /// Search by cosine similarity against a query embedding, best first.
    pub fn search(&self, query_embedding: &[f32], limit: usize) -> Vec<Document> {
        let entries = self.entries.read();

        let mut scored: Vec<(f32, &VectorEntry)> = entries
            .iter()
            .map(|e| (cosine_similarity(query_embedding, &e.embedding), e))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        scored.into_iter().map(|(_, e)| e.document.clone()).collect()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.read().len()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

/// [`SemanticIndex`] that embeds the query text and searches the store.
/// Embedding or search faults propagate; the retrieval engine treats the
/// semantic leg as load-bearing.
pub struct EmbeddingIndex {
    store: Arc<VectorStore>,
    http: reqwest::Client,
    llm: LlmConfig,
}

impl EmbeddingIndex {
    pub fn new(store: Arc<VectorStore>, http: reqwest::Client, llm: LlmConfig) -> Self {
        Self { store, http, llm }
    }
}

#[async_trait]
impl SemanticIndex for EmbeddingIndex {
    async fn query(&self, text: &str, limit: usize) -> Result<Vec<Document>> {
        let query_embedding = embed_single(&self.http, &self.llm, text)
            .await
            .context("Failed to embed query")?;
        Ok(self.store.search(&query_embedding, limit))
    }
}
