//! Distance and similarity between two vectors of the same method.

use ndarray::ArrayView1;

use crate::error::{MatchError, Result};

fn check_dims(a: &ArrayView1<f32>, b: &ArrayView1<f32>) -> Result<()> {
    if a.len() != b.len() {
        return Err(MatchError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

/// Euclidean (L2) distance, always `>= 0`.
pub fn euclidean_distance(a: ArrayView1<f32>, b: ArrayView1<f32>) -> Result<f32> {
    check_dims(&a, &b)?;
    let sum: f32 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum();
    Ok(sum.sqrt())
}

/// Cosine similarity clamped to `[-1, 1]`.
///
/// A zero-norm vector has no direction; the similarity is `0` in that case.
/// Sums are accumulated in `f64` so extreme but finite `f32` magnitudes
/// neither underflow nor overflow.
pub fn cosine_similarity(a: ArrayView1<f32>, b: ArrayView1<f32>) -> Result<f32> {
    check_dims(&a, &b)?;
    let (dot, norm_a, norm_b) = a.iter().zip(b.iter()).fold(
        (0.0f64, 0.0f64, 0.0f64),
        |(dot, na, nb), (&x, &y)| {
            let (x, y) = (f64::from(x), f64::from(y));
            (dot + x * y, na + x * x, nb + y * y)
        },
    );
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 || !denom.is_finite() || !dot.is_finite() {
        return Ok(0.0);
    }
    Ok((dot / denom).clamp(-1.0, 1.0) as f32)
}
