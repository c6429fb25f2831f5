//! Answer generation over a set of evidence documents.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::llm::LanguageModel;
use crate::models::Document;

/// Produces the answer text from a question and a document set. No retry
/// or validation here; the graders judge the output downstream.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, question: &str, documents: &[Document]) -> Result<String>;
}

/// Join document contents in order, blank-line separated, for use as
/// prompt context or grading input.
pub fn format_docs(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|d| d.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub struct LlmGenerator {
    llm: Arc<dyn LanguageModel>,
}

impl LlmGenerator {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "You are an assistant for question-answering tasks. Use the following pieces of \
         retrieved context to answer the question. If you don't know the answer, just \
         say that you don't know. Use three sentences maximum and keep the answer \
         concise.\n\n\
         Question: {question}\n\n\
         Context:\n{context}\n\n\
         Answer:"
    )
}

#[async_trait]
impl AnswerGenerator for LlmGenerator {
    async fn generate(&self, question: &str, documents: &[Document]) -> Result<String> {
        let context = format_docs(documents);
        self.llm.complete(&build_prompt(question, &context)).await
    }
}
