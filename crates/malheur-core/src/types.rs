//! Core types shared by the feature space, kernels and prototype extraction

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a hashed feature, always in `[0, 2^dimension_bits)`
pub type FeatureIndex = u64;

/// Hash function used to map tokens onto feature indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// XXH3, 64-bit output
    #[default]
    Xxh3,
    /// SHA-256 truncated to its first 8 bytes
    Sha256,
    /// BLAKE3 truncated to its first 8 bytes
    Blake3,
}

/// Normalization applied to every feature vector of an array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// Raw token counts
    None,
    /// Sum of weights equals one
    L1,
    /// Euclidean norm equals one
    #[default]
    L2,
}

/// Kernel function evaluated between two feature vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelScheme {
    /// Plain dot product
    #[default]
    Linear,
    /// Dot product divided by both norms
    Cosine,
}

/// Whether prototype scores are compared as similarities or distances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricDirection {
    /// Higher is closer; accept when `score >= threshold`
    Similarity,
    /// Lower is closer; accept when `score <= threshold`
    #[default]
    Distance,
}

impl MetricDirection {
    /// Returns true when `candidate` is strictly better than `best`
    #[inline]
    pub fn improves(self, candidate: f64, best: f64) -> bool {
        match self {
            MetricDirection::Similarity => candidate > best,
            MetricDirection::Distance => candidate < best,
        }
    }

    /// Returns true when `score` satisfies `threshold`
    #[inline]
    pub fn accepts(self, score: f64, threshold: f64) -> bool {
        match self {
            MetricDirection::Similarity => score >= threshold,
            MetricDirection::Distance => score <= threshold,
        }
    }
}

/// Output encoding for exported results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Whitespace separated text with `#` comment headers
    #[default]
    Text,
    /// Pretty-printed JSON document
    Json,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Xxh3 => write!(f, "xxh3"),
            HashAlgorithm::Sha256 => write!(f, "sha256"),
            HashAlgorithm::Blake3 => write!(f, "blake3"),
        }
    }
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Normalization::None => write!(f, "none"),
            Normalization::L1 => write!(f, "l1"),
            Normalization::L2 => write!(f, "l2"),
        }
    }
}

impl fmt::Display for KernelScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelScheme::Linear => write!(f, "linear"),
            KernelScheme::Cosine => write!(f, "cosine"),
        }
    }
}

impl fmt::Display for MetricDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricDirection::Similarity => write!(f, "similarity"),
            MetricDirection::Distance => write!(f, "distance"),
        }
    }
}
