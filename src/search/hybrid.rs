//! Hybrid retrieval: weighted rank fusion of the semantic and lexical
//! legs, followed by independent pairwise rescoring.
//!
//! Failure policy: a fault in fusion or rescoring degrades the result to
//! semantic-only, truncated to `final_k`. A fault in the semantic leg
//! itself propagates; without it there is nothing to degrade to.

use anyhow::Result;
use futures_util::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::Document;
use crate::search::rerank::PairwiseScorer;
use crate::search::{LexicalIndex, SemanticIndex};

/// Reciprocal-rank constant. Flattens the score gap between adjacent
/// ranks so both legs contribute beyond their first few hits.
const RRF_K: f32 = 60.0;

/// Transient (document, fused score) pair. Lives only inside this engine.
struct ScoredDocument {
    document: Document,
    score: f32,
}

pub struct HybridRetriever {
    semantic: Arc<dyn SemanticIndex>,
    lexical: Arc<dyn LexicalIndex>,
    scorer: Arc<dyn PairwiseScorer>,
    semantic_weight: f32,
    lexical_weight: f32,
}

impl HybridRetriever {
    pub fn new(
        semantic: Arc<dyn SemanticIndex>,
        lexical: Arc<dyn LexicalIndex>,
        scorer: Arc<dyn PairwiseScorer>,
        semantic_weight: f32,
        lexical_weight: f32,
    ) -> Self {
        Self {
            semantic,
            lexical,
            scorer,
            semantic_weight,
            lexical_weight,
        }
    }

    /// Retrieve up to `final_k` documents for `query`, best first.
    ///
    /// Both legs run concurrently; fusion keeps the top `top_k` candidates
    /// which are then rescored pairwise and cut to `final_k`.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        final_k: usize,
    ) -> Result<Vec<Document>> {
        let final_k = final_k.min(top_k);

        let (semantic_res, lexical_res) = tokio::join!(
            self.semantic.query(query, top_k),
            self.lexical.query(query, top_k),
        );

        // The semantic leg is load-bearing: its faults propagate.
        let semantic_hits = semantic_res?;

        let lexical_hits = match lexical_res {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!("Lexical leg failed, degrading to semantic-only: {e}");
                return Ok(truncated(semantic_hits, final_k));
            }
        };

        let fused = weighted_rank_fusion(
            &semantic_hits,
            &lexical_hits,
            self.semantic_weight,
            self.lexical_weight,
            top_k,
        );

        match self.rescore(query, fused, final_k).await {
            Ok(docs) => Ok(docs),
            Err(e) => {
                tracing::warn!("Rerank failed, degrading to semantic-only: {e}");
                Ok(truncated(semantic_hits, final_k))
            }
        }
    }

    /// Score each (query, candidate) pair independently, then stable-sort
    /// descending so ties keep their fusion order.
    async fn rescore(
        &self,
        query: &str,
        fused: Vec<ScoredDocument>,
        final_k: usize,
    ) -> Result<Vec<Document>> {
        let scores = try_join_all(
            fused
                .iter()
                .map(|sd| self.scorer.score(query, &sd.document.content)),
        )
        .await?;

        let mut rescored: Vec<(f32, ScoredDocument)> =
            scores.into_iter().zip(fused).collect();
        rescored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        rescored.truncate(final_k);

        Ok(rescored.into_iter().map(|(_, sd)| sd.document).collect())
    }
}

fn truncated(mut docs: Vec<Document>, k: usize) -> Vec<Document> {
    docs.truncate(k);
    docs
}

/// Fuse two ranked lists with weighted reciprocal-rank scores. The
/// weights are score multipliers, not a probability split. Candidates
/// are deduplicated by content identity; a document appearing in both
/// legs accumulates both contributions. Returns at most `top_k`
/// candidates sorted descending, ties in first-seen order.
fn weighted_rank_fusion(
    semantic: &[Document],
    lexical: &[Document],
    semantic_weight: f32,
    lexical_weight: f32,
    top_k: usize,
) -> Vec<ScoredDocument> {
    let mut candidates: Vec<ScoredDocument> = Vec::new();
    let mut by_content: HashMap<String, usize> = HashMap::new();

    let mut absorb = |hits: &[Document], weight: f32| {
        for (rank, doc) in hits.iter().enumerate() {
            let rrf = weight * (1.0 / (RRF_K + rank as f32 + 1.0));
            match by_content.get(&doc.content) {
                Some(&i) => candidates[i].score += rrf,
                None => {
                    by_content.insert(doc.content.clone(), candidates.len());
                    candidates.push(ScoredDocument {
                        document: doc.clone(),
                        score: rrf,
                    });
                }
            }
        }
    };

    absorb(semantic, semantic_weight);
    absorb(lexical, lexical_weight);

    // Stable sort: equal scores keep first-seen (fusion) order
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    candidates.truncate(top_k);
    candidates
}
