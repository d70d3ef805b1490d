pub mod backend;
pub mod contract;
pub mod embed;
pub mod error;
pub mod factory;
pub mod hash;
pub mod lexical;
pub mod tiered;

pub use contract::{QueryFilters, StoreStats, StoredDocument, UpsertOutcome, VectorStore};
pub use error::StoreError;
pub use factory::build_backends;
pub use tiered::TieredStore;
