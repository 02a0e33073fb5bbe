//! Fusion of descriptor and landmark scores into a single similarity.

use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::catalog::CatalogEntry;
use crate::embedding::{Embedding, Method};
use crate::error::{MatchError, Result};
use crate::matcher::{score_entry, MatchResult};
use crate::normalize::Metric;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub descriptor: f32,
    pub landmarks: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            descriptor: 0.5,
            landmarks: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub weights: ScoreWeights,
    pub descriptor: Metric,
    pub landmarks: Metric,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            descriptor: Metric::cosine_power(),
            landmarks: Metric::DistanceLinear,
        }
    }
}

impl FusionConfig {
    pub fn validate(&self) -> Result<()> {
        let ScoreWeights {
            descriptor,
            landmarks,
        } = self.weights;
        if !(descriptor.is_finite() && landmarks.is_finite()) || descriptor < 0.0 || landmarks < 0.0
        {
            return Err(MatchError::InvalidMetric(format!(
                "fusion weights must be finite and non-negative, got {descriptor}/{landmarks}"
            )));
        }
        self.descriptor.validate()?;
        self.landmarks.validate()
    }
}

/// One query image seen through both extraction methods.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionQuery {
    pub descriptor: Embedding,
    pub landmarks: Embedding,
}

/// Scores entries carrying both methods; everything else is excluded so all
/// fused scores are comparable.
pub fn fuse<'a>(
    query: &FusionQuery,
    catalog: &'a [CatalogEntry],
    config: &FusionConfig,
) -> Vec<MatchResult<'a>> {
    let w = config.weights;
    let score = |entry: &'a CatalogEntry| {
        let d = score_entry(
            &query.descriptor,
            entry,
            Method::Descriptor,
            config.descriptor,
        )?;
        let l = score_entry(&query.landmarks, entry, Method::Landmarks, config.landmarks)?;
        let fused = (d * w.descriptor + l * w.landmarks).clamp(0.0, 100.0);
        Some(MatchResult {
            entry,
            score: if fused.is_finite() { fused } else { 0.0 },
        })
    };

    #[cfg(feature = "parallel")]
    let results: Vec<_> = catalog.par_iter().filter_map(score).collect();
    #[cfg(not(feature = "parallel"))]
    let results: Vec<_> = catalog.iter().filter_map(score).collect();

    debug!(
        "fusion ({} x{}, {} x{}): scored {} of {} entries",
        config.descriptor,
        w.descriptor,
        config.landmarks,
        w.landmarks,
        results.len(),
        catalog.len()
    );
    results
}
