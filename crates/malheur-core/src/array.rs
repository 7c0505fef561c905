//! Ordered collections of per-report feature vectors.

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{MalheurError, Result};
use crate::hashing::FeatureSpace;
use crate::source::{ReportSource, Tokenizer};
use crate::types::Normalization;
use crate::vector::FeatureVector;

/// A report identity together with its feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// External identity of the report
    pub label: String,
    /// Hashed token counts
    pub vector: FeatureVector,
}

impl Report {
    /// Create a report
    pub fn new(label: impl Into<String>, vector: FeatureVector) -> Self {
        Self {
            label: label.into(),
            vector,
        }
    }
}

/// Ordered, owning sequence of reports
///
/// The order is the input order and is significant: prototype extraction
/// visits reports exactly in this order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureArray {
    reports: Vec<Report>,
    dimension_bits: u32,
}

impl FeatureArray {
    /// Empty array for vectors of a `2^dimension_bits` space
    pub fn new(dimension_bits: u32) -> Self {
        Self {
            reports: Vec::new(),
            dimension_bits,
        }
    }

    /// Build an array by hashing already-tokenized reports.
    ///
    /// Each vector is normalized with `normalization` as it is appended.
    pub fn from_tokenized<I, L, T, S>(
        reports: I,
        space: &FeatureSpace,
        normalization: Normalization,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (L, T)>,
        L: Into<String>,
        T: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut array = Self::new(space.bits());
        for (label, tokens) in reports {
            let vector = FeatureVector::from_tokens(tokens, space)?.normalized(normalization);
            array.push(Report::new(label, vector));
        }
        Ok(array)
    }

    /// Read, tokenize and hash every report under `path`.
    ///
    /// The first unreadable report aborts the whole extraction.
    pub fn from_source(path: impl AsRef<Path>, config: &Config, space: &FeatureSpace) -> Result<Self> {
        let path = path.as_ref();
        let start = Instant::now();
        let source = ReportSource::open(path, Tokenizer::from_config(&config.input))?;

        let mut array = Self::new(space.bits());
        for raw in source {
            let raw = raw?;
            let vector = FeatureVector::from_tokens(&raw.tokens, space)?
                .normalized(config.features.normalization);
            array.push(Report::new(raw.label, vector));
        }

        tracing::info!(
            "Extracted {} feature vectors from {} ({} entries, {:.2?})",
            array.len(),
            path.display(),
            array.nnz(),
            start.elapsed()
        );
        if space.lookup_enabled() {
            tracing::debug!("Lookup table holds {} indices", space.table_len());
        }
        Ok(array)
    }

    /// Append a report
    #[inline]
    pub fn push(&mut self, report: Report) {
        self.reports.push(report);
    }

    /// Number of reports
    #[inline]
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    /// True when the array holds no report
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Dimension exponent of the space the vectors live in
    pub fn dimension_bits(&self) -> u32 {
        self.dimension_bits
    }

    /// Report at `index`
    pub fn get(&self, index: usize) -> Option<&Report> {
        self.reports.get(index)
    }

    /// Vector of the report at `index`
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn vector(&self, index: usize) -> &FeatureVector {
        &self.reports[index].vector
    }

    /// Label of the report at `index`
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn label(&self, index: usize) -> &str {
        &self.reports[index].label
    }

    /// Iterate over reports in input order
    pub fn iter(&self) -> std::slice::Iter<'_, Report> {
        self.reports.iter()
    }

    /// Total number of stored entries over all vectors
    pub fn nnz(&self) -> usize {
        self.reports.iter().map(|r| r.vector.nnz()).sum()
    }

    /// Normalize every vector in place
    pub fn normalize(&mut self, scheme: Normalization) {
        for report in &mut self.reports {
            report.vector.normalize(scheme);
        }
    }

    /// Fail with [`MalheurError::DimensionMismatch`] unless `other` shares this space size
    pub fn ensure_compatible(&self, other_bits: u32) -> Result<()> {
        if self.dimension_bits != other_bits {
            return Err(MalheurError::DimensionMismatch {
                expected: self.dimension_bits,
                actual: other_bits,
            });
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a FeatureArray {
    type Item = &'a Report;
    type IntoIter = std::slice::Iter<'a, Report>;

    fn into_iter(self) -> Self::IntoIter {
        self.reports.iter()
    }
}
