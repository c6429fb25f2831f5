//! Question routing: indexed-corpus questions go to the vector store,
//! everything else to web search.

use async_trait::async_trait;
use std::sync::Arc;

use crate::grade::{structured_verdict, QuestionRouter};
use crate::llm::LanguageModel;
use crate::models::RouteDecision;

pub struct LlmRouter {
    llm: Arc<dyn LanguageModel>,
}

impl LlmRouter {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

fn build_prompt(question: &str) -> String {
    format!(
        "You are an expert at routing a user question to a vectorstore or web search. \
         Use the vectorstore for questions on LLM agents, prompt engineering, prompting, \
         and adversarial attacks, including questions using similar wording. Otherwise \
         use web search. Give a binary choice 'web_search' or 'vectorstore'. Respond \
         with a JSON object with a single key 'datasource' and no preamble or \
         explanation.\n\n\
         Examples:\n\
         Question: When will the Euro of Football take place?\n\
         Answer: {{\"datasource\": \"web_search\"}}\n\n\
         Question: What are the types of agent memory?\n\
         Answer: {{\"datasource\": \"vectorstore\"}}\n\n\
         Question: What are the basic approaches for prompt engineering?\n\
         Answer: {{\"datasource\": \"vectorstore\"}}\n\n\
         Question to route: {question}"
    )
}

#[async_trait]
impl QuestionRouter for LlmRouter {
    /// Route the question. Any internal failure (model fault, contract
    /// violation, unknown datasource) falls back to the vector store.
    async fn route(&self, question: &str) -> RouteDecision {
        let prompt = build_prompt(question);
        let raw = match structured_verdict(self.llm.as_ref(), &prompt, "datasource").await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Routing failed, defaulting to vectorstore: {e}");
                return RouteDecision::VectorStore;
            }
        };

        match raw.trim().to_lowercase().as_str() {
            "web_search" => RouteDecision::WebSearch,
            "vectorstore" => RouteDecision::VectorStore,
            other => {
                tracing::warn!("Unknown datasource `{other}`, defaulting to vectorstore");
                RouteDecision::VectorStore
            }
        }
    }
}
