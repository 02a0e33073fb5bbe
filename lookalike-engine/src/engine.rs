use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogEntry;
use crate::embedding::{Embedding, Method};
use crate::error::{MatchError, Result};
use crate::fusion::{self, FusionConfig, FusionQuery};
use crate::matcher;
use crate::normalize::Metric;
use crate::rank::{rank, RankedMatch, DEFAULT_LIMIT, DEFAULT_THRESHOLD};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub threshold: f32,
    pub limit: usize,
    pub fusion: FusionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            limit: DEFAULT_LIMIT,
            fusion: FusionConfig::default(),
        }
    }
}

/// Embeddings extracted from one query image, keyed by method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Query {
    pub embeddings: BTreeMap<Method, Embedding>,
}

impl Query {
    pub fn get(&self, method: Method) -> Result<&Embedding> {
        self.embeddings
            .get(&method)
            .ok_or(MatchError::MissingQuery(method))
    }
}

impl TryFrom<Query> for FusionQuery {
    type Error = MatchError;

    fn try_from(mut query: Query) -> Result<Self> {
        let mut take = |m| {
            query
                .embeddings
                .remove(&m)
                .ok_or(MatchError::MissingQuery(m))
        };
        Ok(FusionQuery {
            descriptor: take(Method::Descriptor)?,
            landmarks: take(Method::Landmarks)?,
        })
    }
}

/// Caller-owned matching context: validated configuration, no hidden state.
///
/// Immutable once built, so one engine can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        if !config.threshold.is_finite() {
            return Err(MatchError::InvalidMetric(format!(
                "threshold must be finite, got {}",
                config.threshold
            )));
        }
        config.fusion.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Top-K entries for a single method.
    pub fn match_method<'a>(
        &self,
        query: &Embedding,
        catalog: &'a [CatalogEntry],
        method: Method,
        metric: Metric,
    ) -> Result<Vec<RankedMatch<'a>>> {
        metric.validate()?;
        let scored = matcher::match_method(query, catalog, method, metric);
        Ok(self.rank(scored))
    }

    /// Top-K entries by fused descriptor and landmark score.
    pub fn fuse<'a>(
        &self,
        query: &FusionQuery,
        catalog: &'a [CatalogEntry],
    ) -> Vec<RankedMatch<'a>> {
        let scored = fusion::fuse(query, catalog, &self.config.fusion);
        self.rank(scored)
    }

    fn rank<'a>(&self, scored: Vec<matcher::MatchResult<'a>>) -> Vec<RankedMatch<'a>> {
        let candidates = scored.len();
        let ranked = rank(scored, self.config.threshold, self.config.limit);
        debug!(
            "ranked {} of {} candidates above {}",
            ranked.len(),
            candidates,
            self.config.threshold
        );
        ranked
    }
}
