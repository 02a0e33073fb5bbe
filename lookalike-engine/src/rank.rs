use crate::catalog::CatalogEntry;
use crate::matcher::MatchResult;
use crate::normalize::to_percent;

pub const DEFAULT_THRESHOLD: f32 = 40.0;
pub const DEFAULT_LIMIT: usize = 3;

/// A result that made the top-K, with the percentage shown to users.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedMatch<'a> {
    pub entry: &'a CatalogEntry,
    pub score: f32,
    pub percent: u8,
}

/// Keeps results whose reported percentage is strictly above `threshold`,
/// orders them by descending score and returns at most `limit`.
///
/// Ordering uses the unrounded score, so two matches reported with the same
/// percentage (84.6 and 85.2 both show as 85) still come out highest first.
/// The sort is stable: exactly equal unrounded scores keep their input order.
pub fn rank<'a>(
    results: impl IntoIterator<Item = MatchResult<'a>>,
    threshold: f32,
    limit: usize,
) -> Vec<RankedMatch<'a>> {
    let mut ranked: Vec<RankedMatch<'a>> = results
        .into_iter()
        .map(|r| RankedMatch {
            entry: r.entry,
            score: r.score,
            percent: to_percent(r.score),
        })
        .filter(|r| f32::from(r.percent) > threshold)
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(limit);
    ranked
}
