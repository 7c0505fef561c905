//! Sparse feature vectors built from hashed tokens.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hashing::FeatureSpace;
use crate::types::{FeatureIndex, Normalization};

/// Sparse feature vector stored as parallel index/weight arrays.
///
/// Indices are strictly increasing and unique. Construction merges
/// duplicate indices (hash collisions included) by summing their weights.
///
/// # Example
///
/// ```
/// use malheur_core::hashing::FeatureSpace;
/// use malheur_core::types::HashAlgorithm;
/// use malheur_core::vector::FeatureVector;
///
/// let space = FeatureSpace::new(HashAlgorithm::Xxh3, 20, false).unwrap();
/// let v = FeatureVector::from_tokens(["open", "read", "open"], &space).unwrap();
/// assert_eq!(v.get(space.resolve("open")), 2.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Sorted indices of non-zero features
    indices: Vec<FeatureIndex>,
    /// Weights corresponding to indices
    values: Vec<f32>,
}

impl FeatureVector {
    /// Empty (all-zero) vector
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash every token through `space` and count occurrences per index.
    ///
    /// Tokens are registered in the space's lookup table when it is enabled.
    ///
    /// # Errors
    ///
    /// Returns a resource error if the index buffer cannot be allocated.
    pub fn from_tokens<I, S>(tokens: I, space: &FeatureSpace) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens = tokens.into_iter();
        let mut hashed: Vec<FeatureIndex> = Vec::new();
        hashed.try_reserve(tokens.size_hint().0)?;
        for token in tokens {
            if hashed.len() == hashed.capacity() {
                hashed.try_reserve(hashed.len().max(16))?;
            }
            hashed.push(space.resolve_and_register(token.as_ref()));
        }
        hashed.sort_unstable();

        let mut indices: Vec<FeatureIndex> = Vec::new();
        let mut values: Vec<f32> = Vec::new();
        let unique = count_runs(&hashed);
        indices.try_reserve_exact(unique)?;
        values.try_reserve_exact(unique)?;

        // Run lengths are counted exactly and converted once per entry
        let mut start = 0;
        while start < hashed.len() {
            let index = hashed[start];
            let run = hashed[start..].iter().take_while(|&&i| i == index).count();
            indices.push(index);
            values.push(run as f32);
            start += run;
        }

        Ok(Self { indices, values })
    }

    /// Build from arbitrary `(index, weight)` pairs, summing duplicates.
    pub fn from_entries(mut entries: Vec<(FeatureIndex, f32)>) -> Self {
        entries.sort_by_key(|&(index, _)| index);

        let mut indices = Vec::with_capacity(entries.len());
        let mut values: Vec<f32> = Vec::with_capacity(entries.len());
        for (index, weight) in entries {
            if indices.last() == Some(&index) {
                if let Some(last) = values.last_mut() {
                    *last += weight;
                }
            } else {
                indices.push(index);
                values.push(weight);
            }
        }

        Self { indices, values }
    }

    /// Number of stored entries
    #[inline]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// True when no entry is stored
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// True when every weight is zero (including the empty vector)
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0)
    }

    /// Weight at `index` (O(log n) binary search), zero when absent
    #[inline]
    pub fn get(&self, index: FeatureIndex) -> f32 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Iterate over `(index, weight)` pairs in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = (FeatureIndex, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Sorted feature indices
    #[inline]
    pub fn indices(&self) -> &[FeatureIndex] {
        &self.indices
    }

    /// Weights matching [`indices`](Self::indices)
    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Largest stored index, if any
    pub fn max_index(&self) -> Option<FeatureIndex> {
        self.indices.last().copied()
    }

    /// Sum of absolute weights
    pub fn l1_norm(&self) -> f64 {
        self.values.iter().map(|&v| (v as f64).abs()).sum()
    }

    /// Euclidean norm
    pub fn l2_norm(&self) -> f64 {
        self.values
            .iter()
            .map(|&v| (v as f64) * (v as f64))
            .sum::<f64>()
            .sqrt()
    }

    /// Rescale in place; an all-zero vector is left untouched
    pub fn normalize(&mut self, scheme: Normalization) {
        let norm = match scheme {
            Normalization::None => return,
            Normalization::L1 => self.l1_norm(),
            Normalization::L2 => self.l2_norm(),
        };
        if norm == 0.0 {
            return;
        }
        for value in &mut self.values {
            *value = (*value as f64 / norm) as f32;
        }
    }

    /// Consuming variant of [`normalize`](Self::normalize)
    pub fn normalized(mut self, scheme: Normalization) -> Self {
        self.normalize(scheme);
        self
    }

    /// Entries sorted by descending weight, ties by ascending index
    pub fn heaviest(&self, k: usize) -> Vec<(FeatureIndex, f32)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        entries.truncate(k);
        entries
    }

    /// Approximate heap footprint in bytes
    pub fn memory_bytes(&self) -> usize {
        self.indices.capacity() * std::mem::size_of::<FeatureIndex>()
            + self.values.capacity() * std::mem::size_of::<f32>()
    }
}

/// Number of distinct values in a sorted slice
fn count_runs(sorted: &[FeatureIndex]) -> usize {
    if sorted.is_empty() {
        return 0;
    }
    1 + sorted.windows(2).filter(|w| w[0] != w[1]).count()
}
