pub mod config;
pub mod report;
pub mod storage;

// Re-export engine types for convenience
pub use lookalike_engine::{
    Catalog, CatalogEntry, Embedding, Engine, FusionQuery, Method, Metric, Query, RankedMatch,
};
