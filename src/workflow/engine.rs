//! The workflow engine: an explicit trampoline over node values.
//!
//! Entry evaluates the router and jumps straight to `Retrieve` or
//! `WebSearch`; the loop then executes one node per iteration, merges its
//! partial update, emits a snapshot, and computes the next node. The
//! generation check runs inline after every `Generate` and is where the
//! correction cycle budget is spent: each regenerate or augment-evidence
//! decision consumes one cycle, and exhausting the budget is a terminal
//! failure rather than an unbounded loop on a persistently ungrounded
//! generator.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::WorkflowError;
use crate::generate::{format_docs, AnswerGenerator};
use crate::grade::{GroundednessJudge, QuestionRouter, RelevanceJudge, UsefulnessJudge};
use crate::models::{Document, RouteDecision};
use crate::search::Retriever;
use crate::websearch::WebSearcher;
use crate::workflow::state::{RunState, StateUpdate};

/// A resting state of the machine. `Route` and the generation check are
/// transient decisions, not nodes: they execute no step of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Retrieve,
    GradeDocuments,
    WebSearch,
    Generate,
    End,
}

/// Retrieval fan-out parameters passed to the retriever on every
/// `Retrieve` node.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalParams {
    pub top_k: usize,
    pub final_k: usize,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self { top_k: 10, final_k: 5 }
    }
}

/// The workflow engine. Construct one instance and share it across runs;
/// all owned services are read-only at run time.
pub struct RagWorkflow {
    retriever: Arc<dyn Retriever>,
    router: Arc<dyn QuestionRouter>,
    relevance: Arc<dyn RelevanceJudge>,
    groundedness: Arc<dyn GroundednessJudge>,
    usefulness: Arc<dyn UsefulnessJudge>,
    generator: Arc<dyn AnswerGenerator>,
    web: Arc<dyn WebSearcher>,
    retrieval: RetrievalParams,
    max_correction_cycles: usize,
}

impl RagWorkflow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        retriever: Arc<dyn Retriever>,
        router: Arc<dyn QuestionRouter>,
        relevance: Arc<dyn RelevanceJudge>,
        groundedness: Arc<dyn GroundednessJudge>,
        usefulness: Arc<dyn UsefulnessJudge>,
        generator: Arc<dyn AnswerGenerator>,
        web: Arc<dyn WebSearcher>,
        retrieval: RetrievalParams,
        max_correction_cycles: usize,
    ) -> Self {
        Self {
            retriever,
            router,
            relevance,
            groundedness,
            usefulness,
            generator,
            web,
            retrieval,
            max_correction_cycles,
        }
    }

    /// Run a question to completion and return the final state.
    pub async fn run(&self, question: &str) -> Result<RunState, WorkflowError> {
        self.drive(question, None).await
    }

    /// Run a question, emitting one state snapshot after every completed
    /// node. The receiver sees `Ok` snapshots and, on a fatal fault, one
    /// terminal `Err` before the channel closes. Dropping the receiver
    /// cancels the run at the next node boundary.
    pub fn run_stream(
        self: Arc<Self>,
        question: String,
    ) -> mpsc::Receiver<Result<RunState, WorkflowError>> {
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            let snapshots = tx.clone();
            if let Err(e) = self.drive(&question, Some(&snapshots)).await {
                let _ = tx.send(Err(e)).await;
            }
        });
        rx
    }

    async fn drive(
        &self,
        question: &str,
        snapshots: Option<&mpsc::Sender<Result<RunState, WorkflowError>>>,
    ) -> Result<RunState, WorkflowError> {
        let mut state = RunState::new(question);
        let mut cycles = 0usize;

        tracing::info!("--- ROUTE ---");
        let mut node = match self.router.route(question).await {
            RouteDecision::WebSearch => {
                tracing::info!("routing question to web search");
                Node::WebSearch
            }
            RouteDecision::VectorStore => {
                tracing::info!("routing question to vectorstore");
                Node::Retrieve
            }
        };

        loop {
            let next = match node {
                Node::Retrieve => {
                    tracing::info!("--- RETRIEVE ---");
                    let update = self.retrieve(&state).await?;
                    state.apply(update);
                    Node::GradeDocuments
                }
                Node::GradeDocuments => {
                    tracing::info!("--- GRADE DOCUMENTS ---");
                    let update = self.grade_documents(&state).await?;
                    state.apply(update);
                    if state.need_web_search {
                        tracing::info!("documents insufficient, adding web search");
                        Node::WebSearch
                    } else {
                        Node::Generate
                    }
                }
                Node::WebSearch => {
                    tracing::info!("--- WEB SEARCH ---");
                    let update = self.web_search(&state).await;
                    state.apply(update);
                    Node::Generate
                }
                Node::Generate => {
                    tracing::info!("--- GENERATE ---");
                    let update = self.generate(&state).await?;
                    state.apply(update);
                    let decision = self.check_generation(&state).await?;
                    if decision != Node::End {
                        cycles += 1;
                        if cycles > self.max_correction_cycles {
                            return Err(WorkflowError::CyclesExhausted(
                                self.max_correction_cycles,
                            ));
                        }
                    }
                    decision
                }
                Node::End => unreachable!("End is handled before re-entering the loop"),
            };

            if let Some(tx) = snapshots {
                if tx.send(Ok(state.clone())).await.is_err() {
                    tracing::info!("snapshot receiver dropped, cancelling run");
                    return Ok(state);
                }
            }

            if next == Node::End {
                tracing::info!("--- END ---");
                return Ok(state);
            }
            node = next;
        }
    }

    async fn retrieve(&self, state: &RunState) -> Result<StateUpdate, WorkflowError> {
        let documents = self
            .retriever
            .retrieve(&state.question, self.retrieval.top_k, self.retrieval.final_k)
            .await
            .map_err(WorkflowError::Index)?;
        tracing::info!("retrieved {} documents", documents.len());
        Ok(StateUpdate {
            documents: Some(documents),
            ..Default::default()
        })
    }

    /// Keep each document the relevance grader approves; any rejection
    /// flags the run for web search augmentation.
    async fn grade_documents(&self, state: &RunState) -> Result<StateUpdate, WorkflowError> {
        let documents = state
            .documents
            .as_deref()
            .ok_or(WorkflowError::InvalidState("documents absent before grading"))?;

        let mut kept: Vec<Document> = Vec::with_capacity(documents.len());
        let mut need_web_search = false;

        for doc in documents {
            let verdict = self.relevance.judge(&state.question, &doc.content).await?;
            if verdict.is_yes() {
                tracing::info!("grade: document relevant");
                kept.push(doc.clone());
            } else {
                tracing::info!("grade: document not relevant");
                need_web_search = true;
            }
        }

        Ok(StateUpdate {
            documents: Some(kept),
            need_web_search: Some(need_web_search),
            generation: None,
        })
    }

    async fn web_search(&self, state: &RunState) -> StateUpdate {
        let web_doc = self.web.search(&state.question).await;
        let mut documents = state.documents.clone().unwrap_or_default();
        documents.push(web_doc);
        StateUpdate {
            documents: Some(documents),
            ..Default::default()
        }
    }

    async fn generate(&self, state: &RunState) -> Result<StateUpdate, WorkflowError> {
        let documents = state
            .documents
            .as_deref()
            .ok_or(WorkflowError::InvalidState("documents absent before generate"))?;

        let generation = self
            .generator
            .generate(&state.question, documents)
            .await
            .map_err(WorkflowError::Generation)?;

        Ok(StateUpdate {
            generation: Some(generation),
            ..Default::default()
        })
    }

    /// The post-generate decision: not grounded → regenerate; grounded
    /// but not useful → augment evidence; grounded and useful → done.
    async fn check_generation(&self, state: &RunState) -> Result<Node, WorkflowError> {
        let generation = state
            .generation
            .as_deref()
            .ok_or(WorkflowError::InvalidState("generation absent before check"))?;
        let documents = state
            .documents
            .as_deref()
            .ok_or(WorkflowError::InvalidState("documents absent before check"))?;

        tracing::info!("--- CHECK GENERATION ---");
        let documents_text = format_docs(documents);
        let grounded = self
            .groundedness
            .judge(&documents_text, generation, &state.question)
            .await?;

        if !grounded.is_yes() {
            tracing::info!("decision: generation not grounded, regenerating");
            return Ok(Node::Generate);
        }

        let useful = self.usefulness.judge(generation, &state.question).await?;
        if useful.is_yes() {
            tracing::info!("decision: generation is useful");
            Ok(Node::End)
        } else {
            tracing::info!("decision: generation not useful, augmenting evidence");
            Ok(Node::WebSearch)
        }
    }
}
