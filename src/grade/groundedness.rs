//! Groundedness grading: is the answer supported by the evidence?

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::GradingError;
use crate::grade::{parse_binary, structured_verdict, GroundednessJudge};
use crate::llm::LanguageModel;
use crate::models::BinaryScore;

pub struct GroundednessGrader {
    llm: Arc<dyn LanguageModel>,
}

impl GroundednessGrader {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

fn build_prompt(documents: &str, generation: &str, question: &str) -> String {
    format!(
        "You are a grader assessing whether an answer is grounded in and supported by \
         a set of retrieved facts. Give a binary score 'yes' or 'no'. Respond with a \
         JSON object with a single key 'score' and no preamble or explanation.\n\n\
         Facts:\n{documents}\n\n\
         Answer: {generation}\n\n\
         Question: {question}"
    )
}

#[async_trait]
impl GroundednessJudge for GroundednessGrader {
    async fn judge(
        &self,
        documents: &str,
        generation: &str,
        question: &str,
    ) -> Result<BinaryScore, GradingError> {
        let prompt = build_prompt(documents, generation, question);
        let raw = structured_verdict(self.llm.as_ref(), &prompt, "score").await?;
        parse_binary(&raw)
    }
}
