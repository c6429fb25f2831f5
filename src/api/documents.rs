use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::collections::BTreeMap;

use crate::llm::embeddings::embed_batch;
use crate::models::{Document, IngestRequest, IngestResponse, MetaValue};
use crate::state::AppState;

/// POST /api/documents: index pre-chunked documents into both retrieval
/// legs. Metadata values that are not string/number/boolean are dropped.
pub async fn ingest(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, (StatusCode, String)> {
    if req.documents.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No documents supplied".to_string()));
    }

    let documents: Vec<Document> = req
        .documents
        .into_iter()
        .map(|d| Document {
            content: d.content,
            metadata: filter_scalar_metadata(&d.metadata),
        })
        .collect();

    let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
    let embeddings = embed_batch(&state.http_client, &state.config.llm, &texts)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Embedding failed: {e}"),
            )
        })?;

    state.vectors.add_documents(&documents, embeddings).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Vector indexing failed: {e}"),
        )
    })?;

    let bm25 = state.bm25.clone();
    let docs_for_bm25 = documents.clone();
    tokio::task::spawn_blocking(move || bm25.index_documents(&docs_for_bm25))
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("BM25 indexing failed: {e}"),
            )
        })?
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("BM25 indexing failed: {e}"),
            )
        })?;

    tracing::info!("Indexed {} documents", documents.len());
    Ok(Json(IngestResponse {
        indexed: documents.len(),
    }))
}

fn filter_scalar_metadata(
    raw: &serde_json::Map<String, serde_json::Value>,
) -> BTreeMap<String, MetaValue> {
    raw.iter()
        .filter_map(|(k, v)| MetaValue::from_json(v).map(|mv| (k.clone(), mv)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_drops_nested_values() {
        let raw = serde_json::json!({
            "source": "blog",
            "page": 2,
            "draft": false,
            "tags": ["a", "b"],
            "extra": {"nested": true}
        });
        let map = filter_scalar_metadata(raw.as_object().unwrap());
        assert_eq!(map.len(), 3);
        assert_eq!(map["source"], MetaValue::Str("blog".to_string()));
        assert_eq!(map["page"], MetaValue::Num(2.0));
        assert_eq!(map["draft"], MetaValue::Bool(false));
    }
}
