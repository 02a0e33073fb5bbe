//! Single-method matching: one query vector against every entry carrying the
//! same method.

use log::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::catalog::CatalogEntry;
use crate::embedding::{Embedding, Method};
use crate::error::MatchError;
use crate::normalize::Metric;

/// Unranked score of one catalog entry, in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult<'a> {
    pub entry: &'a CatalogEntry,
    pub score: f32,
}

/// Scores `query` against `entry`'s `method` embedding.
///
/// `None` when the entry has no such embedding or its length differs from
/// the query; the latter is logged since it usually means mixed-up data.
pub(crate) fn score_entry(
    query: &Embedding,
    entry: &CatalogEntry,
    method: Method,
    metric: Metric,
) -> Option<f32> {
    let reference = entry.embedding(method)?;
    match metric.score(query.view(), reference.view()) {
        Ok(score) => Some(score),
        Err(MatchError::DimensionMismatch { expected, actual }) => {
            warn!(
                "skipping {:?}: {} query has {} values, entry has {}",
                entry.id, method, expected, actual
            );
            None
        }
        Err(e) => {
            warn!("skipping {:?}: {}", entry.id, e);
            None
        }
    }
}

/// Scores every entry that has a `method` embedding, in catalog order.
///
/// Entries without one, or with a length differing from `query`, are left
/// out rather than scored as zero.
pub fn match_method<'a>(
    query: &Embedding,
    catalog: &'a [CatalogEntry],
    method: Method,
    metric: Metric,
) -> Vec<MatchResult<'a>> {
    let score = |entry: &'a CatalogEntry| {
        score_entry(query, entry, method, metric).map(|score| MatchResult { entry, score })
    };

    #[cfg(feature = "parallel")]
    let results: Vec<_> = catalog.par_iter().filter_map(score).collect();
    #[cfg(not(feature = "parallel"))]
    let results: Vec<_> = catalog.iter().filter_map(score).collect();

    debug!(
        "{} ({}): scored {} of {} entries",
        method,
        metric,
        results.len(),
        catalog.len()
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DisplayMetadata;

    fn entry(id: &str, method: Method, v: &[f32]) -> CatalogEntry {
        CatalogEntry::new(
            id,
            DisplayMetadata {
                name: id.to_string(),
                ..Default::default()
            },
        )
        .with_embedding(method, Embedding::new(v.to_vec()).unwrap())
    }

    #[test]
    fn skips_entries_without_method() {
        let catalog = vec![
            entry("a", Method::Descriptor, &[1.0, 0.0]),
            entry("b", Method::Landmarks, &[1.0, 0.0]),
            entry("c", Method::Descriptor, &[0.0, 1.0]),
        ];
        let q = Embedding::new(vec![1.0, 0.0]).unwrap();
        let results = match_method(&q, &catalog, Method::Descriptor, Metric::CosineLinear);
        let ids: Vec<_> = results.iter().map(|r| r.entry.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
        assert_eq!(results[0].score, 100.0);
        assert_eq!(results[1].score, 50.0);
    }

    #[test]
    fn mismatched_length_is_excluded_not_zeroed() {
        env_logger::try_init().ok();
        let catalog = vec![
            entry("short", Method::Descriptor, &[1.0, 0.0]),
            entry("ok", Method::Descriptor, &[1.0, 0.0, 0.0]),
        ];
        let q = Embedding::new(vec![1.0, 0.0, 0.0]).unwrap();
        let results = match_method(&q, &catalog, Method::Descriptor, Metric::CosineLinear);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entry.id, "ok");
    }

    #[test]
    fn empty_catalog() {
        let q = Embedding::new(vec![1.0]).unwrap();
        assert!(match_method(&q, &[], Method::Descriptor, Metric::DistanceLinear).is_empty());
    }
}
