use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A scalar metadata value. Non-scalar values are dropped at ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Str(String),
    Num(f64),
    Bool(bool),
}

impl MetaValue {
    /// Convert a JSON value to a scalar metadata value, if it is one.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(MetaValue::Str(s.clone())),
            serde_json::Value::Number(n) => n.as_f64().map(MetaValue::Num),
            serde_json::Value::Bool(b) => Some(MetaValue::Bool(*b)),
            _ => None,
        }
    }
}

/// A single evidence document. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, MetaValue>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }
}

/// The canonical verdict shape every grader must produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryScore {
    Yes,
    No,
}

impl BinaryScore {
    pub fn is_yes(self) -> bool {
        self == BinaryScore::Yes
    }
}

/// Where the router sends a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteDecision {
    #[serde(rename = "web_search")]
    WebSearch,
    #[serde(rename = "vectorstore")]
    VectorStore,
}

/// Ask request
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// A source reference returned alongside the answer.
#[derive(Debug, Clone, Serialize)]
pub struct SourceSnippet {
    pub content: String,
    pub metadata: BTreeMap<String, MetaValue>,
}

/// Ask response
#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub question: String,
    pub answer: String,
    pub sources: Vec<SourceSnippet>,
}

/// A document submitted for indexing. Metadata arrives as arbitrary JSON
/// and is filtered down to scalar values.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestDocument {
    pub content: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestRequest {
    pub documents: Vec<IngestDocument>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub indexed: usize,
}
