use thiserror::Error;

/// A grader contract violation: the model call failed or its response
/// did not parse as the mandated single-key structure. Fatal to the run;
/// never retried inside the grader.
#[derive(Debug, Error)]
pub enum GradingError {
    #[error("grader model call failed: {0}")]
    Model(anyhow::Error),
    #[error("grader response missing key `{0}`")]
    MissingKey(&'static str),
    #[error("grader returned unexpected verdict `{0}`")]
    InvalidVerdict(String),
}

/// A fatal workflow fault. Non-fatal faults (rerank, routing, web search)
/// are absorbed at their own layer and never surface here.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Grading(#[from] GradingError),
    #[error("answer generation failed: {0}")]
    Generation(anyhow::Error),
    #[error("retrieval index failure: {0}")]
    Index(anyhow::Error),
    #[error("generation still not grounded or useful after {0} correction cycles")]
    CyclesExhausted(usize),
    #[error("run state invariant violated: {0}")]
    InvalidState(&'static str),
}
