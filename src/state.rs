use std::sync::Arc;

use crate::config::Config;
use crate::generate::LlmGenerator;
use crate::grade::groundedness::GroundednessGrader;
use crate::grade::relevance::RelevanceGrader;
use crate::grade::router::LlmRouter;
use crate::grade::usefulness::UsefulnessGrader;
use crate::llm::{ChatClient, LanguageModel};
use crate::search::bm25::{Bm25Index, Bm25Lexical};
use crate::search::hybrid::HybridRetriever;
use crate::search::rerank::LlmPairwiseScorer;
use crate::search::vector::{EmbeddingIndex, VectorStore};
use crate::websearch::TavilySearcher;
use crate::workflow::engine::RetrievalParams;
use crate::workflow::RagWorkflow;

/// Shared application state. The workflow engine and the services it
/// owns are constructed exactly once here and are read-only afterwards,
/// so concurrent runs can share them freely.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub vectors: Arc<VectorStore>,
    pub bm25: Arc<Bm25Index>,
    pub http_client: reqwest::Client,
    pub workflow: Arc<RagWorkflow>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(config.index_dir())?;
        std::fs::create_dir_all(config.vector_dir())?;

        let vectors = Arc::new(VectorStore::open_or_create(&config.vector_dir())?);
        let bm25 = Arc::new(Bm25Index::open_or_create(&config.index_dir())?);

        let http_client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        let llm: Arc<dyn LanguageModel> =
            Arc::new(ChatClient::new(http_client.clone(), config.llm.clone()));

        let retriever = HybridRetriever::new(
            Arc::new(EmbeddingIndex::new(
                vectors.clone(),
                http_client.clone(),
                config.llm.clone(),
            )),
            Arc::new(Bm25Lexical(bm25.clone())),
            Arc::new(LlmPairwiseScorer::new(llm.clone())),
            config.retrieval.semantic_weight,
            config.retrieval.lexical_weight,
        );

        let workflow = Arc::new(RagWorkflow::new(
            Arc::new(retriever),
            Arc::new(LlmRouter::new(llm.clone())),
            Arc::new(RelevanceGrader::new(llm.clone())),
            Arc::new(GroundednessGrader::new(llm.clone())),
            Arc::new(UsefulnessGrader::new(llm.clone())),
            Arc::new(LlmGenerator::new(llm.clone())),
            Arc::new(TavilySearcher::new(
                http_client.clone(),
                config.web_search.clone(),
            )),
            RetrievalParams {
                top_k: config.retrieval.top_k,
                final_k: config.retrieval.final_k,
            },
            config.max_correction_cycles,
        ));

        Ok(Self {
            config,
            vectors,
            bm25,
            http_client,
            workflow,
        })
    }
}
