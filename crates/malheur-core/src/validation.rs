//! Eager validation of configuration values and resource limits.
//!
//! Everything here runs before the first report is read. A failure is a
//! [`MalheurError::Config`] (or [`MalheurError::Resource`] for buffer sizing),
//! never a mid-run surprise.
//!
//! # Limits
//!
//! | Resource            | Limit            | Constant                     |
//! |---------------------|------------------|------------------------------|
//! | Dimension bits      | 1 ..= 32         | [`MAX_DIMENSION_BITS`]       |
//! | N-gram length       | 1 ..= 64         | [`MAX_NGRAM_LEN`]            |
//! | Kernel matrix bytes | 256 MiB default  | [`DEFAULT_MAX_MATRIX_BYTES`] |

use std::f64::consts::SQRT_2;

use crate::error::{MalheurError, Result};
use crate::types::{KernelScheme, MetricDirection, Normalization};

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Smallest accepted feature-space size, `D = 2^1`.
pub const MIN_DIMENSION_BITS: u32 = 1;

/// Largest accepted feature-space size, `D = 2^32`.
pub const MAX_DIMENSION_BITS: u32 = 32;

/// Longest accepted token n-gram.
pub const MAX_NGRAM_LEN: usize = 64;

/// Default ceiling for a single kernel matrix buffer (256 MiB).
pub const DEFAULT_MAX_MATRIX_BYTES: usize = 256 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// Validate the feature-space dimension exponent.
pub fn validate_dimension_bits(bits: u32) -> Result<()> {
    if !(MIN_DIMENSION_BITS..=MAX_DIMENSION_BITS).contains(&bits) {
        return Err(MalheurError::config(format!(
            "dimension_bits = {} (expected {}..={})",
            bits, MIN_DIMENSION_BITS, MAX_DIMENSION_BITS
        )));
    }
    Ok(())
}

/// Validate the tokenizer n-gram length.
pub fn validate_ngram_len(ngram_len: usize) -> Result<()> {
    if ngram_len == 0 || ngram_len > MAX_NGRAM_LEN {
        return Err(MalheurError::config(format!(
            "ngram_len = {} (expected 1..={})",
            ngram_len, MAX_NGRAM_LEN
        )));
    }
    Ok(())
}

/// Upper bound on a valid threshold for the given metric, kernel and
/// normalization, or `None` when the range is unbounded above.
///
/// Weights are non-negative, so cosine lies in `[0, 1]` and any two
/// normalized vectors are at most `sqrt(2)` apart in kernel space.
pub fn threshold_upper_bound(
    metric: MetricDirection,
    scheme: KernelScheme,
    normalization: Normalization,
) -> Option<f64> {
    match (metric, scheme, normalization) {
        (MetricDirection::Similarity, KernelScheme::Cosine, _) => Some(1.0),
        (MetricDirection::Similarity, KernelScheme::Linear, Normalization::L2) => Some(1.0),
        (MetricDirection::Similarity, KernelScheme::Linear, _) => None,
        (MetricDirection::Distance, KernelScheme::Cosine, _) => Some(SQRT_2),
        (MetricDirection::Distance, KernelScheme::Linear, Normalization::None) => None,
        (MetricDirection::Distance, KernelScheme::Linear, _) => Some(SQRT_2),
    }
}

/// Validate the prototype acceptance threshold.
///
/// # Errors
///
/// Returns [`MalheurError::Config`] when the threshold is not finite, is
/// negative, or exceeds [`threshold_upper_bound`].
pub fn validate_threshold(
    threshold: f64,
    metric: MetricDirection,
    scheme: KernelScheme,
    normalization: Normalization,
) -> Result<()> {
    if !threshold.is_finite() {
        return Err(MalheurError::config(format!(
            "threshold = {} is not a finite number",
            threshold
        )));
    }
    let upper = threshold_upper_bound(metric, scheme, normalization);
    let in_range = threshold >= 0.0 && upper.map_or(true, |u| threshold <= u);
    if !in_range {
        let expected = match upper {
            Some(u) => format!("0..={:.4}", u),
            None => "0 or greater".to_string(),
        };
        return Err(MalheurError::config(format!(
            "threshold = {} out of range for {} metric with {} kernel and {} normalization (expected {})",
            threshold, metric, scheme, normalization, expected
        )));
    }
    Ok(())
}

/// Number of bytes a `rows x cols` matrix of `f64` needs, checked against `limit`.
///
/// # Errors
///
/// Returns [`MalheurError::Resource`] on arithmetic overflow or when the
/// buffer would exceed `limit`.
pub fn matrix_bytes(rows: usize, cols: usize, limit: usize) -> Result<usize> {
    let bytes = rows
        .checked_mul(cols)
        .and_then(|cells| cells.checked_mul(std::mem::size_of::<f64>()))
        .ok_or_else(|| {
            MalheurError::resource(format!("kernel matrix {}x{} overflows usize", rows, cols))
        })?;
    if bytes > limit {
        return Err(MalheurError::resource(format!(
            "kernel matrix {}x{} needs {} bytes (limit {} bytes)",
            rows, cols, bytes, limit
        )));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_bits_bounds() {
        assert!(validate_dimension_bits(0).is_err());
        assert!(validate_dimension_bits(1).is_ok());
        assert!(validate_dimension_bits(32).is_ok());
        assert!(validate_dimension_bits(33).is_err());
    }

    #[test]
    fn test_ngram_len_bounds() {
        assert!(validate_ngram_len(0).is_err());
        assert!(validate_ngram_len(3).is_ok());
        assert!(validate_ngram_len(MAX_NGRAM_LEN + 1).is_err());
    }

    #[test]
    fn test_threshold_similarity_cosine() {
        let check = |t| {
            validate_threshold(
                t,
                MetricDirection::Similarity,
                KernelScheme::Cosine,
                Normalization::None,
            )
        };
        assert!(check(0.0).is_ok());
        assert!(check(0.5).is_ok());
        assert!(check(1.0).is_ok());
        assert!(check(1.01).is_err());
        assert!(check(-0.1).is_err());
        assert!(check(f64::NAN).is_err());
    }

    #[test]
    fn test_threshold_distance() {
        let l2 = |t| {
            validate_threshold(
                t,
                MetricDirection::Distance,
                KernelScheme::Linear,
                Normalization::L2,
            )
        };
        assert!(l2(0.65).is_ok());
        assert!(l2(SQRT_2).is_ok());
        assert!(l2(1.5).is_err());

        let raw = validate_threshold(
            25.0,
            MetricDirection::Distance,
            KernelScheme::Linear,
            Normalization::None,
        );
        assert!(raw.is_ok());
        let inf = validate_threshold(
            f64::INFINITY,
            MetricDirection::Distance,
            KernelScheme::Linear,
            Normalization::None,
        );
        assert!(inf.unwrap_err().is_config());
    }

    #[test]
    fn test_matrix_bytes() {
        assert_eq!(matrix_bytes(10, 10, 1024).unwrap(), 800);
        assert!(matches!(
            matrix_bytes(100, 100, 1024),
            Err(MalheurError::Resource(_))
        ));
        assert!(matches!(
            matrix_bytes(usize::MAX, 2, usize::MAX),
            Err(MalheurError::Resource(_))
        ));
    }
}
