//! Pairwise reranking: each (query, candidate) pair is scored
//! independently by an LLM yes/no relevance judgment with confidence.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::llm::LanguageModel;

/// Scores a single (query, document) pair, independent of other candidates.
#[async_trait]
pub trait PairwiseScorer: Send + Sync {
    async fn score(&self, query: &str, document: &str) -> Result<f32>;
}

/// [`PairwiseScorer`] backed by an LLM yes/no judgment. Concurrent calls
/// are capped so a rerank burst cannot saturate the model server.
pub struct LlmPairwiseScorer {
    llm: Arc<dyn LanguageModel>,
    semaphore: Arc<Semaphore>,
}

const MAX_CONCURRENT_SCORES: usize = 4;

impl LlmPairwiseScorer {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            llm,
            semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_SCORES)),
        }
    }
}

#[async_trait]
impl PairwiseScorer for LlmPairwiseScorer {
    async fn score(&self, query: &str, document: &str) -> Result<f32> {
        let _permit = self.semaphore.acquire().await;
        let prompt = build_yesno_prompt(query, document);
        let response = self.llm.complete(&prompt).await?;
        Ok(parse_relevance_score(&response))
    }
}

/// Build a yes/no relevance prompt for a single document.
fn build_yesno_prompt(query: &str, content: &str) -> String {
    let snippet = truncate_content(content, 800);
    format!(
        "Judge whether the following passage is relevant to the search query. \
         Answer with ONLY a JSON object: {{\"relevant\": true/false, \"confidence\": 0.0-1.0}}\n\n\
         Query: {query}\n\nPassage:\n{snippet}"
    )
}

fn truncate_content(content: &str, max_chars: usize) -> String {
    if content.len() <= max_chars {
        content.to_string()
    } else {
        let mut end = max_chars;
        while !content.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &content[..end])
    }
}

#[derive(Deserialize)]
struct RelevanceResponse {
    relevant: bool,
    #[serde(default = "default_confidence")]
    confidence: f32,
}

fn default_confidence() -> f32 {
    0.5
}

/// Map the model's judgment onto [0, 1]: relevant answers land in the
/// upper half, scaled by confidence. Lenient by design; a response that
/// defies parsing scores as uncertain rather than failing the rerank.
fn parse_relevance_score(content: &str) -> f32 {
    if let Ok(v) = serde_json::from_str::<RelevanceResponse>(content) {
        let base = if v.relevant { 0.5 } else { 0.0 };
        return base + v.confidence * 0.5;
    }

    // Try to extract JSON from a prose-wrapped response
    if let Some(start) = content.find('{') {
        if let Some(end) = content.rfind('}') {
            if end > start {
                if let Ok(v) = serde_json::from_str::<RelevanceResponse>(&content[start..=end]) {
                    let base = if v.relevant { 0.5 } else { 0.0 };
                    return base + v.confidence * 0.5;
                }
            }
        }
    }

    // Fallback: keyword check
    let lower = content.to_lowercase();
    if lower.contains("\"relevant\": true") || lower.contains("yes") {
        0.7
    } else if lower.contains("\"relevant\": false") || lower.contains("no") {
        0.2
    } else {
        0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clean_json() {
        let score = parse_relevance_score(r#"{"relevant": true, "confidence": 0.8}"#);
        assert!((score - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_parse_irrelevant_scores_low() {
        let score = parse_relevance_score(r#"{"relevant": false, "confidence": 0.9}"#);
        assert!((score - 0.45).abs() < 1e-6);
    }

    #[test]
    fn test_parse_json_embedded_in_prose() {
        let score =
            parse_relevance_score("Sure: {\"relevant\": true, \"confidence\": 1.0} there you go");
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_missing_confidence_defaults() {
        let score = parse_relevance_score(r#"{"relevant": true}"#);
        assert!((score - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_parse_keyword_fallback() {
        assert!((parse_relevance_score("yes, it is relevant") - 0.7).abs() < 1e-6);
        assert!((parse_relevance_score("no") - 0.2).abs() < 1e-6);
        assert!((parse_relevance_score("unclear") - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_prompt_truncates_long_content() {
        let long = "x".repeat(5_000);
        let prompt = build_yesno_prompt("query", &long);
        assert!(prompt.len() < 1_200);
        assert!(prompt.contains("..."));
    }
}
