//! Domain layer - pure types and rules of query routing.
//!
//! Nothing in here performs I/O. External collaborators (models, retrieval
//! backends, embedders, the example store) are reached through `ports`.

pub mod aggregation;
pub mod evaluation;
pub mod few_shot;
pub mod foundation;
pub mod query;
pub mod routing;
pub mod tools;
