//! The adaptive answer workflow: a cyclic state machine that routes,
//! retrieves, grades, generates, re-grades, and decides to retry or stop.

pub mod engine;
pub mod state;

pub use engine::{Node, RagWorkflow};
pub use state::{RunState, StateUpdate};
