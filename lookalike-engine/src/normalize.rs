//! Normalization policies turning a raw metric into a `[0, 100]` similarity.
//!
//! Each reference catalog was scored with the policy matching its extraction
//! method, so the formulas are kept apart rather than unified.

use std::fmt;
use std::str::FromStr;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::error::{MatchError, Result};
use crate::metric::{cosine_similarity, euclidean_distance};

pub const DEFAULT_DISTANCE_CUTOFF: f32 = 0.6;
pub const DEFAULT_COSINE_EXPONENT: f32 = 3.0;

fn bounded(score: f32) -> f32 {
    if score.is_finite() {
        score.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// `100 * (1 - d / sqrt(n))`, floored at zero. Assumes roughly unit-scale coordinates.
pub fn distance_linear(distance: f32, dim: usize) -> f32 {
    if dim == 0 {
        return 0.0;
    }
    bounded(100.0 * (1.0 - distance / (dim as f32).sqrt()))
}

/// Zero beyond `cutoff`, otherwise linear in `d / cutoff`.
pub fn distance_cutoff(distance: f32, cutoff: f32) -> f32 {
    if cutoff <= 0.0 || distance > cutoff {
        return 0.0;
    }
    bounded(100.0 * (1.0 - distance / cutoff))
}

/// `100 * (1 - sqrt(d / sqrt(n * m^2)))` with `m` the largest coordinate of
/// both vectors. The square root spreads mid-range distances apart.
pub fn distance_scaled(distance: f32, dim: usize, max_coord: f32) -> f32 {
    let max_distance = (dim as f32 * max_coord * max_coord).sqrt();
    if max_distance == 0.0 || !max_distance.is_finite() {
        return if distance == 0.0 { 100.0 } else { 0.0 };
    }
    let normalized = distance / max_distance;
    bounded(100.0 * (1.0 - normalized.sqrt()))
}

/// Maps `[-1, 1]` linearly onto `[0, 100]`.
pub fn cosine_linear(cos: f32) -> f32 {
    bounded((cos + 1.0) / 2.0 * 100.0)
}

/// `((cos + 1) / 2)^p * 100`; suppresses mid-range scores for `p > 1`.
pub fn cosine_power(cos: f32, exponent: f32) -> f32 {
    bounded(((cos + 1.0) / 2.0).powf(exponent) * 100.0)
}

/// Integer percentage reported to presentation.
pub fn to_percent(score: f32) -> u8 {
    bounded(score).round() as u8
}

/// Metric plus normalization policy used to score one method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Metric {
    CosineLinear,
    CosinePower { exponent: f32 },
    DistanceLinear,
    DistanceCutoff { cutoff: f32 },
    DistanceScaled,
}

impl Metric {
    pub fn cosine_power() -> Self {
        Metric::CosinePower {
            exponent: DEFAULT_COSINE_EXPONENT,
        }
    }

    pub fn distance_cutoff() -> Self {
        Metric::DistanceCutoff {
            cutoff: DEFAULT_DISTANCE_CUTOFF,
        }
    }

    pub fn is_cosine(&self) -> bool {
        matches!(self, Metric::CosineLinear | Metric::CosinePower { .. })
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            Metric::CosinePower { exponent } if !(exponent.is_finite() && exponent > 1.0) => Err(
                MatchError::InvalidMetric(format!("cosine exponent must be > 1, got {exponent}")),
            ),
            Metric::DistanceCutoff { cutoff } if !(cutoff.is_finite() && cutoff > 0.0) => Err(
                MatchError::InvalidMetric(format!("distance cutoff must be > 0, got {cutoff}")),
            ),
            _ => Ok(()),
        }
    }

    /// Similarity of `a` and `b` in `[0, 100]`, unrounded.
    pub fn score(&self, a: ArrayView1<f32>, b: ArrayView1<f32>) -> Result<f32> {
        let score = match *self {
            Metric::CosineLinear => cosine_linear(cosine_similarity(a, b)?),
            Metric::CosinePower { exponent } => cosine_power(cosine_similarity(a, b)?, exponent),
            Metric::DistanceLinear => distance_linear(euclidean_distance(a, b)?, a.len()),
            Metric::DistanceCutoff { cutoff } => {
                distance_cutoff(euclidean_distance(a, b)?, cutoff)
            }
            Metric::DistanceScaled => {
                let distance = euclidean_distance(a, b)?;
                let max_coord = a
                    .iter()
                    .chain(b.iter())
                    .copied()
                    .fold(f32::NEG_INFINITY, f32::max);
                distance_scaled(distance, a.len(), max_coord)
            }
        };
        Ok(score)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::CosineLinear => f.write_str("cosine-linear"),
            Metric::CosinePower { exponent } => write!(f, "cosine-power:{exponent}"),
            Metric::DistanceLinear => f.write_str("distance-linear"),
            Metric::DistanceCutoff { cutoff } => write!(f, "distance-cutoff:{cutoff}"),
            Metric::DistanceScaled => f.write_str("distance-scaled"),
        }
    }
}

/// Parses `name` or `name:param`, e.g. `cosine-power:3` or `distance-cutoff:0.6`.
impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (name, param) = match s.split_once(':') {
            Some((name, param)) => (name, Some(param)),
            None => (s, None),
        };
        let param = param
            .map(|p| p.parse::<f32>().map_err(|e| format!("bad parameter {p:?}: {e}")))
            .transpose()?;
        let metric = match (name, param) {
            ("cosine-linear", None) => Metric::CosineLinear,
            ("cosine-power", p) => Metric::CosinePower {
                exponent: p.unwrap_or(DEFAULT_COSINE_EXPONENT),
            },
            ("distance-linear", None) => Metric::DistanceLinear,
            ("distance-cutoff", p) => Metric::DistanceCutoff {
                cutoff: p.unwrap_or(DEFAULT_DISTANCE_CUTOFF),
            },
            ("distance-scaled", None) => Metric::DistanceScaled,
            _ => return Err(format!("unknown metric {s:?}")),
        };
        metric.validate().map_err(|e| e.to_string())?;
        Ok(metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn cosine_policies() {
        assert_eq!(cosine_linear(1.0), 100.0);
        assert_eq!(cosine_linear(0.0), 50.0);
        assert_eq!(cosine_linear(-1.0), 0.0);
        assert_eq!(cosine_power(1.0, 3.0), 100.0);
        assert!((cosine_power(0.0, 3.0) - 12.5).abs() < 1e-4);
    }

    #[test]
    fn distance_linear_floors_at_zero() {
        assert_eq!(distance_linear(0.0, 4), 100.0);
        assert!((distance_linear(1.0, 4) - 50.0).abs() < 1e-4);
        assert_eq!(distance_linear(10.0, 4), 0.0);
    }

    #[test]
    fn cutoff_short_circuits() {
        assert_eq!(distance_cutoff(0.61, 0.6), 0.0);
        assert!((distance_cutoff(0.3, 0.6) - 50.0).abs() < 1e-4);
        assert_eq!(distance_cutoff(0.0, 0.6), 100.0);
        assert_eq!(distance_cutoff(0.6, 0.6), 0.0);
    }

    #[test]
    fn scaled_guards_zero_range() {
        assert_eq!(distance_scaled(0.0, 3, 0.0), 100.0);
        assert_eq!(distance_scaled(1.0, 3, 0.0), 0.0);
        // n = 4, m = 1 -> max distance 2; d = 0.5 -> 1 - sqrt(0.25) = 0.5
        assert!((distance_scaled(0.5, 4, 1.0) - 50.0).abs() < 1e-4);
    }

    #[test]
    fn percent_rounds_half_away_from_zero() {
        assert_eq!(to_percent(49.5), 50);
        assert_eq!(to_percent(49.49), 49);
        assert_eq!(to_percent(100.2), 100);
        assert_eq!(to_percent(f32::NAN), 0);
    }

    #[test]
    fn metric_score_dispatch() {
        let a = arr1(&[1.0f32, 0.0, 0.0]);
        let b = arr1(&[0.0f32, 1.0, 0.0]);
        assert_eq!(Metric::CosineLinear.score(a.view(), b.view()).unwrap(), 50.0);
        assert!((Metric::cosine_power().score(a.view(), b.view()).unwrap() - 12.5).abs() < 1e-4);
        // distance sqrt(2) > 0.6
        assert_eq!(Metric::distance_cutoff().score(a.view(), b.view()).unwrap(), 0.0);
        assert_eq!(Metric::DistanceLinear.score(a.view(), a.view()).unwrap(), 100.0);
    }

    #[test]
    fn parse_and_validate() {
        assert_eq!("cosine-linear".parse::<Metric>(), Ok(Metric::CosineLinear));
        assert_eq!(
            "cosine-power:2".parse::<Metric>(),
            Ok(Metric::CosinePower { exponent: 2.0 })
        );
        assert_eq!("distance-cutoff".parse::<Metric>(), Ok(Metric::distance_cutoff()));
        assert!("distance-cutoff:0".parse::<Metric>().is_err());
        assert!("cosine-power:1".parse::<Metric>().is_err());
        assert!("cosine-linear:2".parse::<Metric>().is_err());
        assert!("manhattan".parse::<Metric>().is_err());
        for m in [Metric::CosineLinear, Metric::cosine_power(), Metric::DistanceScaled] {
            assert_eq!(m.to_string().parse::<Metric>(), Ok(m));
        }
    }
}
