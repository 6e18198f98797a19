//! Example store adapters.

mod in_memory;
mod seed;

pub use in_memory::InMemoryExampleStore;
pub use seed::{load_evaluation_cases, load_seed_examples, seed_store, SeedExample};
