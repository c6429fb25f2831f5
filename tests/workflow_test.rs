//! Integration tests for the adaptive answer workflow.
//!
//! Every external service is stubbed so these exercise the state machine
//! itself: routing, grading, the web-search fallback, the regenerate
//! loop, and the correction-cycle budget.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;

use adaptive_rag::error::{GradingError, WorkflowError};
use adaptive_rag::generate::AnswerGenerator;
use adaptive_rag::grade::{GroundednessJudge, QuestionRouter, RelevanceJudge, UsefulnessJudge};
use adaptive_rag::models::{BinaryScore, Document, RouteDecision};
use adaptive_rag::search::Retriever;
use adaptive_rag::websearch::WebSearcher;
use adaptive_rag::workflow::engine::RetrievalParams;
use adaptive_rag::workflow::RagWorkflow;

// ─── Stub services ───────────────────────────────────────

struct StubRetriever {
    docs: Vec<Document>,
    calls: AtomicUsize,
}

impl StubRetriever {
    fn with_docs(docs: Vec<Document>) -> Arc<Self> {
        Arc::new(Self {
            docs,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Retriever for StubRetriever {
    async fn retrieve(
        &self,
        _query: &str,
        _top_k: usize,
        final_k: usize,
    ) -> Result<Vec<Document>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.docs.iter().take(final_k).cloned().collect())
    }
}

struct StubRouter(RouteDecision);

#[async_trait]
impl QuestionRouter for StubRouter {
    async fn route(&self, _question: &str) -> RouteDecision {
        self.0
    }
}

/// Pops scripted verdicts in order; falls back to the default once the
/// script runs out.
struct Scripted {
    script: Mutex<VecDeque<BinaryScore>>,
    default: BinaryScore,
    calls: AtomicUsize,
}

impl Scripted {
    fn always(default: BinaryScore) -> Arc<Self> {
        Self::with_script(vec![], default)
    }

    fn with_script(script: Vec<BinaryScore>, default: BinaryScore) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            default,
            calls: AtomicUsize::new(0),
        })
    }

    fn next(&self) -> BinaryScore {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script.lock().pop_front().unwrap_or(self.default)
    }
}

#[async_trait]
impl RelevanceJudge for Scripted {
    async fn judge(&self, _q: &str, _d: &str) -> Result<BinaryScore, GradingError> {
        Ok(self.next())
    }
}

#[async_trait]
impl GroundednessJudge for Scripted {
    async fn judge(&self, _d: &str, _g: &str, _q: &str) -> Result<BinaryScore, GradingError> {
        Ok(self.next())
    }
}

#[async_trait]
impl UsefulnessJudge for Scripted {
    async fn judge(&self, _g: &str, _q: &str) -> Result<BinaryScore, GradingError> {
        Ok(self.next())
    }
}

/// A relevance judge whose responses violate the grading contract.
struct BrokenJudge;

#[async_trait]
impl RelevanceJudge for BrokenJudge {
    async fn judge(&self, _q: &str, _d: &str) -> Result<BinaryScore, GradingError> {
        Err(GradingError::MissingKey("score"))
    }
}

struct StubGenerator {
    calls: AtomicUsize,
}

impl StubGenerator {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl AnswerGenerator for StubGenerator {
    async fn generate(&self, _question: &str, _documents: &[Document]) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("answer attempt {n}"))
    }
}

struct FailingGenerator;

#[async_trait]
impl AnswerGenerator for FailingGenerator {
    async fn generate(&self, _question: &str, _documents: &[Document]) -> Result<String> {
        anyhow::bail!("model unavailable")
    }
}

struct StubWeb {
    calls: AtomicUsize,
}

impl StubWeb {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl WebSearcher for StubWeb {
    async fn search(&self, _query: &str) -> Document {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Document::new("web evidence")
    }
}

fn docs(n: usize) -> Vec<Document> {
    (0..n).map(|i| Document::new(format!("document {i}"))).collect()
}

#[allow(clippy::too_many_arguments)]
fn build_workflow(
    retriever: Arc<StubRetriever>,
    route: RouteDecision,
    relevance: Arc<dyn RelevanceJudge>,
    groundedness: Arc<Scripted>,
    usefulness: Arc<Scripted>,
    generator: Arc<dyn AnswerGenerator>,
    web: Arc<StubWeb>,
    max_cycles: usize,
) -> RagWorkflow {
    RagWorkflow::new(
        retriever,
        Arc::new(StubRouter(route)),
        relevance,
        groundedness,
        usefulness,
        generator,
        web,
        RetrievalParams::default(),
        max_cycles,
    )
}

// ─── Scenarios ───────────────────────────────────────────

/// Scenario A: routed to the vectorstore, every document relevant; the
/// run generates directly and web search never fires.
#[tokio::test]
async fn test_all_relevant_documents_generate_directly() {
    let retriever = StubRetriever::with_docs(docs(3));
    let web = StubWeb::new();
    let generator = StubGenerator::new();
    let workflow = build_workflow(
        retriever.clone(),
        RouteDecision::VectorStore,
        Scripted::always(BinaryScore::Yes),
        Scripted::always(BinaryScore::Yes),
        Scripted::always(BinaryScore::Yes),
        generator.clone(),
        web.clone(),
        5,
    );

    let state = workflow.run("What are the types of agent memory?").await.unwrap();

    assert_eq!(retriever.calls.load(Ordering::SeqCst), 1);
    assert_eq!(web.calls.load(Ordering::SeqCst), 0);
    assert!(!state.need_web_search);
    assert_eq!(state.documents.unwrap().len(), 3);
    assert_eq!(state.generation.as_deref(), Some("answer attempt 1"));
}

/// Scenario B: routed to web search; retrieval never runs.
#[tokio::test]
async fn test_web_search_route_skips_retrieval() {
    let retriever = StubRetriever::with_docs(docs(3));
    let web = StubWeb::new();
    let workflow = build_workflow(
        retriever.clone(),
        RouteDecision::WebSearch,
        Scripted::always(BinaryScore::Yes),
        Scripted::always(BinaryScore::Yes),
        Scripted::always(BinaryScore::Yes),
        StubGenerator::new(),
        web.clone(),
        5,
    );

    let state = workflow
        .run("When is the next international football tournament?")
        .await
        .unwrap();

    assert_eq!(retriever.calls.load(Ordering::SeqCst), 0);
    assert_eq!(web.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        state.documents.unwrap(),
        vec![Document::new("web evidence")]
    );
    assert!(state.generation.is_some());
}

/// Scenario C: first generation is not grounded, the second is; the
/// generator runs exactly twice and the run terminates useful.
#[tokio::test]
async fn test_ungrounded_generation_regenerates_once() {
    let generator = StubGenerator::new();
    let workflow = build_workflow(
        StubRetriever::with_docs(docs(2)),
        RouteDecision::VectorStore,
        Scripted::always(BinaryScore::Yes),
        Scripted::with_script(vec![BinaryScore::No, BinaryScore::Yes], BinaryScore::Yes),
        Scripted::always(BinaryScore::Yes),
        generator.clone(),
        StubWeb::new(),
        5,
    );

    let state = workflow.run("question").await.unwrap();

    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    assert_eq!(state.generation.as_deref(), Some("answer attempt 2"));
}

/// Scenario D: every document graded irrelevant; the kept set is empty
/// and web search supplies the evidence.
#[tokio::test]
async fn test_all_irrelevant_documents_trigger_web_search() {
    let web = StubWeb::new();
    let workflow = build_workflow(
        StubRetriever::with_docs(docs(2)),
        RouteDecision::VectorStore,
        Scripted::always(BinaryScore::No),
        Scripted::always(BinaryScore::Yes),
        Scripted::always(BinaryScore::Yes),
        StubGenerator::new(),
        web.clone(),
        5,
    );

    let state = workflow.run("question").await.unwrap();

    assert!(state.need_web_search);
    assert_eq!(web.calls.load(Ordering::SeqCst), 1);
    // Only the synthetic web document survives
    assert_eq!(
        state.documents.unwrap(),
        vec![Document::new("web evidence")]
    );
}

/// One irrelevant document among relevant ones is dropped, and the run
/// still augments with web search.
#[tokio::test]
async fn test_single_rejection_drops_document_and_flags_search() {
    let web = StubWeb::new();
    let workflow = build_workflow(
        StubRetriever::with_docs(docs(3)),
        RouteDecision::VectorStore,
        Scripted::with_script(
            vec![BinaryScore::Yes, BinaryScore::No, BinaryScore::Yes],
            BinaryScore::Yes,
        ),
        Scripted::always(BinaryScore::Yes),
        Scripted::always(BinaryScore::Yes),
        StubGenerator::new(),
        web.clone(),
        5,
    );

    let state = workflow.run("question").await.unwrap();

    assert!(state.need_web_search);
    let documents = state.documents.unwrap();
    // Two kept plus the web document, rejected one excluded
    assert_eq!(documents.len(), 3);
    assert!(!documents.iter().any(|d| d.content == "document 1"));
    assert_eq!(documents.last().unwrap().content, "web evidence");
}

/// Grounded but not useful: evidence is augmented via web search and the
/// downstream pipeline retried.
#[tokio::test]
async fn test_not_useful_generation_augments_evidence() {
    let web = StubWeb::new();
    let generator = StubGenerator::new();
    let workflow = build_workflow(
        StubRetriever::with_docs(docs(2)),
        RouteDecision::VectorStore,
        Scripted::always(BinaryScore::Yes),
        Scripted::always(BinaryScore::Yes),
        Scripted::with_script(vec![BinaryScore::No], BinaryScore::Yes),
        generator.clone(),
        web.clone(),
        5,
    );

    let state = workflow.run("question").await.unwrap();

    assert_eq!(web.calls.load(Ordering::SeqCst), 1);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    assert_eq!(state.documents.unwrap().len(), 3);
}

/// A persistently ungrounded generator exhausts the correction budget
/// instead of looping forever.
#[tokio::test]
async fn test_correction_cycle_budget_exhaustion() {
    let generator = StubGenerator::new();
    let workflow = build_workflow(
        StubRetriever::with_docs(docs(1)),
        RouteDecision::VectorStore,
        Scripted::always(BinaryScore::Yes),
        Scripted::always(BinaryScore::No),
        Scripted::always(BinaryScore::Yes),
        generator.clone(),
        StubWeb::new(),
        2,
    );

    let err = workflow.run("question").await.unwrap_err();

    assert!(matches!(err, WorkflowError::CyclesExhausted(2)));
    // Initial attempt plus two budgeted retries
    assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
}

/// A grading contract violation aborts the whole run.
#[tokio::test]
async fn test_grading_fault_is_fatal() {
    let workflow = RagWorkflow::new(
        StubRetriever::with_docs(docs(1)),
        Arc::new(StubRouter(RouteDecision::VectorStore)),
        Arc::new(BrokenJudge),
        Scripted::always(BinaryScore::Yes),
        Scripted::always(BinaryScore::Yes),
        StubGenerator::new(),
        StubWeb::new(),
        RetrievalParams::default(),
        5,
    );

    let err = workflow.run("question").await.unwrap_err();
    assert!(matches!(err, WorkflowError::Grading(_)));
}

/// A generator fault aborts the whole run; no best-effort answer.
#[tokio::test]
async fn test_generator_fault_is_fatal() {
    let workflow = build_workflow(
        StubRetriever::with_docs(docs(1)),
        RouteDecision::VectorStore,
        Scripted::always(BinaryScore::Yes),
        Scripted::always(BinaryScore::Yes),
        Scripted::always(BinaryScore::Yes),
        Arc::new(FailingGenerator),
        StubWeb::new(),
        5,
    );

    let err = workflow.run("question").await.unwrap_err();
    assert!(matches!(err, WorkflowError::Generation(_)));
}

/// The streaming contract: one snapshot per completed node, final
/// snapshot carries the answer.
#[tokio::test]
async fn test_run_stream_emits_snapshot_per_node() {
    let workflow = Arc::new(build_workflow(
        StubRetriever::with_docs(docs(2)),
        RouteDecision::VectorStore,
        Scripted::always(BinaryScore::Yes),
        Scripted::always(BinaryScore::Yes),
        Scripted::always(BinaryScore::Yes),
        StubGenerator::new(),
        StubWeb::new(),
        5,
    ));

    let mut rx = workflow.run_stream("question".to_string());
    let mut snapshots = Vec::new();
    while let Some(snapshot) = rx.recv().await {
        snapshots.push(snapshot.unwrap());
    }

    // Retrieve, GradeDocuments, Generate
    assert_eq!(snapshots.len(), 3);
    assert!(snapshots[0].documents.is_some());
    assert!(snapshots[0].generation.is_none());
    assert!(snapshots[2].generation.is_some());
}

/// A fatal fault surfaces once on the stream, then the channel closes.
#[tokio::test]
async fn test_run_stream_surfaces_fatal_fault() {
    let workflow = Arc::new(build_workflow(
        StubRetriever::with_docs(docs(1)),
        RouteDecision::VectorStore,
        Scripted::always(BinaryScore::Yes),
        Scripted::always(BinaryScore::Yes),
        Scripted::always(BinaryScore::Yes),
        Arc::new(FailingGenerator),
        StubWeb::new(),
        5,
    ));

    let mut rx = workflow.run_stream("question".to_string());
    let mut last = None;
    while let Some(event) = rx.recv().await {
        last = Some(event);
    }
    assert!(matches!(
        last,
        Some(Err(WorkflowError::Generation(_)))
    ));
}
