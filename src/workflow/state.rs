//! Per-run state and the partial-update merge each node produces.

use serde::Serialize;

use crate::models::Document;

/// The state of one question-answering run. Created at run start,
/// discarded at run end; never shared across runs.
#[derive(Debug, Clone, Serialize)]
pub struct RunState {
    /// The user question. Immutable for the run.
    pub question: String,
    /// Evidence documents, relevance-descending as of the last node that
    /// touched them. `None` until retrieval or web search populates it.
    pub documents: Option<Vec<Document>>,
    /// Set only by document grading; consumed only by the
    /// generate-or-search decision.
    pub need_web_search: bool,
    /// The generated answer. Present only after a generate step.
    pub generation: Option<String>,
}

impl RunState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            documents: None,
            need_web_search: false,
            generation: None,
        }
    }

    /// Merge a partial update: set fields overwrite, unset fields persist.
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(documents) = update.documents {
            self.documents = Some(documents);
        }
        if let Some(need_web_search) = update.need_web_search {
            self.need_web_search = need_web_search;
        }
        if let Some(generation) = update.generation {
            self.generation = Some(generation);
        }
    }
}

/// A partial state update returned by a workflow node.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub documents: Option<Vec<Document>>,
    pub need_web_search: Option<bool>,
    pub generation: Option<String>,
}
