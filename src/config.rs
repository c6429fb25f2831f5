use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the BM25 index and vector store are persisted
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// LLM provider configuration
    pub llm: LlmConfig,
    /// Hybrid retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Web search fallback configuration
    pub web_search: WebSearchConfig,
    /// Maximum correction cycles (regenerate / augment-evidence) per run
    /// before the workflow gives up.
    pub max_correction_cycles: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for generation and grading
    pub chat_model: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Embedding vector dimension
    pub embedding_dim: usize,
    /// Sampling temperature. Graders require 0.0 for stable verdicts.
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Fusion score multiplier for the semantic leg
    pub semantic_weight: f32,
    /// Fusion score multiplier for the lexical leg
    pub lexical_weight: f32,
    /// Candidates kept after fusion, before reranking
    pub top_k: usize,
    /// Documents returned after reranking
    pub final_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    /// Base URL for the search API (Tavily-compatible)
    pub base_url: String,
    /// API key. If None, web search always degrades to the placeholder.
    pub api_key: Option<String>,
    /// Number of result snippets folded into the synthetic document
    pub max_results: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:9100".to_string(),
            llm: LlmConfig::default(),
            retrieval: RetrievalConfig::default(),
            web_search: WebSearchConfig::default(),
            max_correction_cycles: 5,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.1:8b".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            api_key: None,
            embedding_dim: 768,
            temperature: 0.0,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            semantic_weight: 0.7,
            lexical_weight: 0.3,
            top_k: 10,
            final_k: 5,
        }
    }
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.tavily.com".to_string(),
            api_key: None,
            max_results: 3,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("ADAPTIVE_RAG_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("ADAPTIVE_RAG_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(val) = std::env::var("ADAPTIVE_RAG_MAX_CORRECTION_CYCLES") {
            if let Ok(v) = val.parse() {
                config.max_correction_cycles = v;
            }
        }

        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(model) = std::env::var("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(dim) = std::env::var("LLM_EMBEDDING_DIM") {
            if let Ok(d) = dim.parse() {
                config.llm.embedding_dim = d;
            }
        }
        if let Ok(t) = std::env::var("LLM_TEMPERATURE") {
            if let Ok(v) = t.parse() {
                config.llm.temperature = v;
            }
        }

        if let Ok(val) = std::env::var("RETRIEVAL_SEMANTIC_WEIGHT") {
            if let Ok(v) = val.parse() {
                config.retrieval.semantic_weight = v;
            }
        }
        if let Ok(val) = std::env::var("RETRIEVAL_LEXICAL_WEIGHT") {
            if let Ok(v) = val.parse() {
                config.retrieval.lexical_weight = v;
            }
        }
        if let Ok(val) = std::env::var("RETRIEVAL_TOP_K") {
            if let Ok(v) = val.parse() {
                config.retrieval.top_k = v;
            }
        }
        if let Ok(val) = std::env::var("RETRIEVAL_FINAL_K") {
            if let Ok(v) = val.parse() {
                config.retrieval.final_k = v;
            }
        }
        // final_k never exceeds top_k
        config.retrieval.final_k = config.retrieval.final_k.min(config.retrieval.top_k);

        if let Ok(url) = std::env::var("WEB_SEARCH_BASE_URL") {
            config.web_search.base_url = url;
        }
        if let Ok(key) = std::env::var("WEB_SEARCH_API_KEY") {
            config.web_search.api_key = Some(key);
        }
        if let Ok(val) = std::env::var("WEB_SEARCH_MAX_RESULTS") {
            if let Ok(v) = val.parse() {
                config.web_search.max_results = v;
            }
        }

        config
    }

    pub fn index_dir(&self) -> PathBuf {
        self.data_dir.join("index")
    }

    pub fn vector_dir(&self) -> PathBuf {
        self.data_dir.join("vectors")
    }
}
