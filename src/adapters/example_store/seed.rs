//! Seed examples and evaluation cases from data files.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::adapters::data_file::{load_data_file, DataFileError};
use crate::domain::evaluation::EvaluationCase;
use crate::domain::few_shot::ExampleSource;
use crate::domain::routing::RouteProposal;
use crate::ports::{ExampleStore, ExampleStoreError};

/// One curated example as written in a seed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedExample {
    pub query: String,
    pub route: RouteProposal,
}

pub async fn load_seed_examples(path: impl AsRef<Path>) -> Result<Vec<SeedExample>, DataFileError> {
    load_data_file(path).await
}

pub async fn load_evaluation_cases(
    path: impl AsRef<Path>,
) -> Result<Vec<EvaluationCase>, DataFileError> {
    load_data_file(path).await
}

/// Appends every seed example, in file order. Returns how many were added.
pub async fn seed_store(
    store: &dyn ExampleStore,
    examples: Vec<SeedExample>,
) -> Result<usize, ExampleStoreError> {
    let count = examples.len();
    for example in examples {
        store
            .add(&example.query, example.route, ExampleSource::Seed)
            .await?;
    }
    info!(count, "Seeded example store");
    Ok(count)
}
