//! Similarity matching and ranking of face embeddings against a reference
//! catalog.
//!
//! Scoring is exhaustive and synchronous. [`Engine`] bundles the caller's
//! threshold, result limit and fusion settings; the free functions in
//! [`metric`], [`normalize`], [`matcher`], [`fusion`] and [`rank`] are the
//! building blocks it composes.

pub mod catalog;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod fusion;
pub mod matcher;
pub mod metric;
pub mod normalize;
pub mod rank;

pub use catalog::{Catalog, CatalogEntry, Coverage, DisplayMetadata};
pub use embedding::{Embedding, Method};
pub use engine::{Engine, EngineConfig, Query};
pub use error::{MatchError, Result};
pub use fusion::{FusionConfig, FusionQuery, ScoreWeights};
pub use matcher::MatchResult;
pub use normalize::Metric;
pub use rank::RankedMatch;
