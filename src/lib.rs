//! # adaptive-rag
//!
//! A self-corrective retrieval-augmented question answering engine:
//! hybrid retrieval with pairwise reranking feeds a cyclic workflow
//! that generates an answer, grades it, and retries or augments its
//! evidence until the answer is grounded and useful.
//!
//! ## Workflow
//!
//! ```text
//!                 ┌──────────────┐
//!                 │   Question    │
//!                 └──────┬───────┘
//!                        │ route
//!            ┌───────────┴───────────┐
//!            ▼                       ▼
//!    ┌──────────────┐        ┌──────────────┐
//!    │   Retrieve    │        │  Web Search  │◄─────────────┐
//!    │ (hybrid+rank) │        └──────┬───────┘              │
//!    └──────┬───────┘               │                      │
//!           ▼                       │                      │
//!    ┌──────────────┐               │                      │
//!    │ Grade Docs    │── any "no" ──┘                      │
//!    └──────┬───────┘                                      │
//!           │ all "yes"                                     │
//!           ▼                                               │
//!    ┌──────────────┐◄── not grounded ──┐                  │
//!    │   Generate    │                   │                  │
//!    └──────┬───────┘                   │                  │
//!           ▼                           │                  │
//!    ┌──────────────┐───────────────────┘                  │
//!    │ Check: is it  │── grounded, not useful ─────────────┘
//!    │ grounded and  │
//!    │   useful?     │── grounded and useful ──► End
//!    └──────────────┘
//! ```
//!
//! Retrieval fuses a semantic (embedding cosine) leg and a lexical
//! (tantivy BM25) leg with weighted reciprocal-rank scores, deduplicates
//! by content, then rescores each (query, candidate) pair with an LLM
//! relevance judgment. Fusion or rerank faults degrade to semantic-only
//! results; they never fail a run.
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration: fusion weights,
//!   retrieval depths, LLM and web-search settings, cycle budget
//! - [`models`] - Shared data types: `Document`, `BinaryScore`,
//!   `RouteDecision`, request/response types
//! - [`error`] - Typed fatal errors: grading contract violations and
//!   workflow faults
//! - [`llm`] - Chat completions and embeddings via Ollama or
//!   OpenAI-compatible APIs
//! - [`search`] - The retrieval engine: vector store, BM25 index, rank
//!   fusion, and pairwise reranking
//! - [`grade`] - The four LLM graders: relevance, groundedness,
//!   usefulness, and question routing
//! - [`generate`] - Answer generation over the evidence set
//! - [`websearch`] - Web search fallback producing synthetic evidence
//! - [`workflow`] - The state machine driving a run
//! - [`api`] - Axum HTTP handlers for asking and ingestion
//! - [`state`] - Shared application state wiring every service once

pub mod api;
pub mod config;
pub mod error;
pub mod generate;
pub mod grade;
pub mod llm;
pub mod models;
pub mod search;
pub mod state;
pub mod websearch;
pub mod workflow;
