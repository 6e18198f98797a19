//! Few-shot examples - the store's records and how they are selected.
//!
//! Retrieval is nearest-neighbour over embeddings; growing the example set
//! never requires retraining anything.

mod example_record;
mod leakage;
mod selector;
mod similarity;

pub use example_record::{ExampleRecord, ExampleSource};
pub use leakage::{normalize_query, LeakageGuard, QueryFingerprint};
pub use selector::{select_top_k, ScoredExample};
pub use similarity::{cosine_similarity, l2_normalize};
