//! Relevance grading: filters retrieved documents against the question.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::GradingError;
use crate::grade::{parse_binary, structured_verdict, RelevanceJudge};
use crate::llm::LanguageModel;
use crate::models::BinaryScore;

pub struct RelevanceGrader {
    llm: Arc<dyn LanguageModel>,
}

impl RelevanceGrader {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

fn build_prompt(question: &str, document: &str) -> String {
    format!(
        "You are a grader assessing the relevance of a retrieved document to a user \
         question. If the document contains keywords related to the question, grade it \
         as relevant. This is not a stringent test; the goal is to filter out erroneous \
         retrievals. Give a binary score 'yes' or 'no'. Respond with a JSON object with \
         a single key 'score' and no preamble or explanation.\n\n\
         Retrieved document:\n{document}\n\n\
         User question: {question}"
    )
}

#[async_trait]
impl RelevanceJudge for RelevanceGrader {
    async fn judge(&self, question: &str, document: &str) -> Result<BinaryScore, GradingError> {
        let prompt = build_prompt(question, document);
        let raw = structured_verdict(self.llm.as_ref(), &prompt, "score").await?;
        parse_binary(&raw)
    }
}
