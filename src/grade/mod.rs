//! LLM graders: four independent judgment services sharing one contract.
//!
//! Each grader builds a fixed prompt that mandates a single-key JSON
//! response, calls the model, extracts the key, and maps it onto a typed
//! verdict. A response that violates the contract is a [`GradingError`];
//! graders never retry internally. The router is the one exception to
//! the propagation rule: it absorbs its own failures into a default
//! route (see [`router`]).

pub mod groundedness;
pub mod relevance;
pub mod router;
pub mod usefulness;

use async_trait::async_trait;

use crate::error::GradingError;
use crate::llm::LanguageModel;
use crate::models::{BinaryScore, RouteDecision};

/// Is the document relevant to the question?
#[async_trait]
pub trait RelevanceJudge: Send + Sync {
    async fn judge(&self, question: &str, document: &str) -> Result<BinaryScore, GradingError>;
}

/// Is the generation supported by the documents?
#[async_trait]
pub trait GroundednessJudge: Send + Sync {
    async fn judge(
        &self,
        documents: &str,
        generation: &str,
        question: &str,
    ) -> Result<BinaryScore, GradingError>;
}

/// Does the generation resolve the question?
#[async_trait]
pub trait UsefulnessJudge: Send + Sync {
    async fn judge(&self, generation: &str, question: &str) -> Result<BinaryScore, GradingError>;
}

/// Which datasource should answer the question. Infallible by contract:
/// implementations fall back to [`RouteDecision::VectorStore`].
#[async_trait]
pub trait QuestionRouter: Send + Sync {
    async fn route(&self, question: &str) -> RouteDecision;
}

/// Run a prompt and extract the mandated key as a string.
pub(crate) async fn structured_verdict(
    llm: &dyn LanguageModel,
    prompt: &str,
    key: &'static str,
) -> Result<String, GradingError> {
    let value = llm
        .complete_structured(prompt)
        .await
        .map_err(GradingError::Model)?;
    let raw = value
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or(GradingError::MissingKey(key))?;
    Ok(raw.to_string())
}

/// Map a raw verdict string onto the canonical yes/no shape.
pub(crate) fn parse_binary(raw: &str) -> Result<BinaryScore, GradingError> {
    match raw.trim().to_lowercase().as_str() {
        "yes" => Ok(BinaryScore::Yes),
        "no" => Ok(BinaryScore::No),
        other => Err(GradingError::InvalidVerdict(other.to_string())),
    }
}
