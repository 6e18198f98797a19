//! RAG Router - query routing across specialised retrieval tools.
//!
//! A free-text query is routed by a language model, guided by few-shot
//! examples retrieved from an example store, to one or more retrieval
//! tools (or answered directly, or turned into a clarification question).
//! Tools run in parallel, their results are aggregated with attribution and
//! an answer is synthesised. User feedback flows back into the example
//! store.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
