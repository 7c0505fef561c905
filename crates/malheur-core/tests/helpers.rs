//! Shared test helpers for the malheur-core integration test suite.
//!
//! Provides the canonical regression corpus, a deterministic random corpus
//! generator and small constructors used across the test modules.

#![allow(dead_code)]

use malheur_core::types::{HashAlgorithm, KernelScheme, MetricDirection, Normalization};
use malheur_core::{FeatureArray, FeatureSpace, KernelEngine, PrototypeExtractor};

// ---------------------------------------------------------------------------
// Random number generator (simple LCG for deterministic reproducibility)
// ---------------------------------------------------------------------------

/// A minimal linear congruential generator for deterministic test data.
pub struct Lcg {
    state: u64,
}

impl Lcg {
    /// Create a new LCG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate the next u64 value.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Uniform index in `[0, n)`.
    pub fn next_below(&mut self, n: usize) -> usize {
        ((self.next_u64() >> 33) % n as u64) as usize
    }
}

// ---------------------------------------------------------------------------
// Corpora
// ---------------------------------------------------------------------------

/// The five-report regression corpus in its canonical order.
///
/// R1 and R3 are identical, R2 shares most of their tokens, R4 and R5 live
/// on a disjoint vocabulary.
pub fn regression_reports() -> Vec<(&'static str, Vec<&'static str>)> {
    vec![
        ("R1", vec!["a", "a", "b"]),
        ("R2", vec!["a", "b", "c"]),
        ("R3", vec!["a", "a", "b"]),
        ("R4", vec!["z"]),
        ("R5", vec!["z", "z", "y"]),
    ]
}

/// Write the regression corpus as one file per report into `dir`.
pub fn write_regression_corpus(dir: &std::path::Path) {
    for (label, tokens) in regression_reports() {
        std::fs::write(dir.join(label), tokens.join(" ")).unwrap();
    }
}

/// Random reports over a small vocabulary, so that some of them overlap.
pub fn random_reports(n: usize, vocabulary: usize, seed: u64) -> Vec<(String, Vec<String>)> {
    let mut rng = Lcg::new(seed);
    (0..n)
        .map(|i| {
            let len = 1 + rng.next_below(12);
            let tokens = (0..len)
                .map(|_| format!("call{}", rng.next_below(vocabulary)))
                .collect();
            (format!("report{:03}", i), tokens)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

/// A 20-bit XXH3 space without lookup table.
pub fn space() -> FeatureSpace {
    FeatureSpace::new(HashAlgorithm::Xxh3, 20, false).unwrap()
}

/// Hash `reports` into an L2-normalized array.
pub fn array_from<L, T, S>(reports: Vec<(L, T)>, space: &FeatureSpace) -> FeatureArray
where
    L: Into<String>,
    T: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    FeatureArray::from_tokenized(reports, space, Normalization::L2).unwrap()
}

/// Cosine-similarity extractor with threshold `theta`, recording the
/// settings of [`space`] and [`array_from`].
pub fn cosine_extractor(theta: f64) -> PrototypeExtractor {
    PrototypeExtractor::new(
        KernelEngine::new(KernelScheme::Cosine),
        MetricDirection::Similarity,
        theta,
    )
    .unwrap()
    .with_features(HashAlgorithm::Xxh3, Normalization::L2)
}
