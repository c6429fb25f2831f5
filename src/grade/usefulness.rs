//! Usefulness grading: does the answer actually resolve the question?

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::GradingError;
use crate::grade::{parse_binary, structured_verdict, UsefulnessJudge};
use crate::llm::LanguageModel;
use crate::models::BinaryScore;

pub struct UsefulnessGrader {
    llm: Arc<dyn LanguageModel>,
}

impl UsefulnessGrader {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

fn build_prompt(generation: &str, question: &str) -> String {
    format!(
        "You are a grader assessing whether an answer is useful to resolve a question. \
         Give a binary score 'yes' or 'no'. Respond with a JSON object with a single \
         key 'score' and no preamble or explanation.\n\n\
         Answer: {generation}\n\n\
         Question: {question}"
    )
}

#[async_trait]
impl UsefulnessJudge for UsefulnessGrader {
    async fn judge(&self, generation: &str, question: &str) -> Result<BinaryScore, GradingError> {
        let prompt = build_prompt(generation, question);
        let raw = structured_verdict(self.llm.as_ref(), &prompt, "score").await?;
        parse_binary(&raw)
    }
}
