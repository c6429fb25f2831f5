use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::models::{AskRequest, AskResponse, SourceSnippet};
use crate::state::AppState;
use crate::workflow::RunState;

/// Number of sources shown with the answer.
const MAX_SOURCES: usize = 3;
/// Display length each source is truncated to.
const SOURCE_PREVIEW_CHARS: usize = 300;

/// POST /api/ask: run the adaptive workflow for one question.
///
/// A run either completes with an answer and its evidence, or the whole
/// request fails; there is no partial-answer path.
pub async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, (StatusCode, String)> {
    let question = req.question.trim().to_string();
    if question.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Question is required".to_string()));
    }

    let final_state = state.workflow.run(&question).await.map_err(|e| {
        tracing::error!("Workflow failed: {e}");
        (StatusCode::INTERNAL_SERVER_ERROR, format!("Workflow failed: {e}"))
    })?;

    Ok(Json(build_response(final_state)))
}

fn build_response(state: RunState) -> AskResponse {
    let sources = state
        .documents
        .unwrap_or_default()
        .into_iter()
        .take(MAX_SOURCES)
        .map(|d| SourceSnippet {
            content: truncate_preview(&d.content),
            metadata: d.metadata,
        })
        .collect();

    AskResponse {
        question: state.question,
        answer: state.generation.unwrap_or_default(),
        sources,
    }
}

fn truncate_preview(content: &str) -> String {
    if content.len() <= SOURCE_PREVIEW_CHARS {
        return content.to_string();
    }
    let mut end = SOURCE_PREVIEW_CHARS;
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &content[..end])
}
