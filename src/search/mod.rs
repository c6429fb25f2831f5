//! Retrieval: the semantic and lexical legs, rank fusion, and reranking.

pub mod bm25;
pub mod hybrid;
pub mod rerank;
pub mod vector;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Document;

/// Embedding-similarity retrieval over the corpus.
#[async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Return documents ranked by semantic similarity, best first.
    async fn query(&self, text: &str, limit: usize) -> Result<Vec<Document>>;
}

/// Keyword-ranking retrieval over the same corpus.
#[async_trait]
pub trait LexicalIndex: Send + Sync {
    /// Return documents ranked by lexical score, best first.
    async fn query(&self, text: &str, limit: usize) -> Result<Vec<Document>>;
}

/// The retrieval seam the workflow engine depends on.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return at most `final_k` documents for `query`, best first.
    async fn retrieve(&self, query: &str, top_k: usize, final_k: usize)
        -> Result<Vec<Document>>;
}

#[async_trait]
impl Retriever for hybrid::HybridRetriever {
    async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        final_k: usize,
    ) -> Result<Vec<Document>> {
        hybrid::HybridRetriever::retrieve(self, query, top_k, final_k).await
    }
}
