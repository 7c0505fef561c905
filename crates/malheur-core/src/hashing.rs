//! Hashed feature space
//!
//! Maps arbitrary behavioral tokens onto a fixed set of `D = 2^bits`
//! feature indices. Distinct tokens landing on the same index are the same
//! feature from then on; memory stays independent of the vocabulary size.
//!
//! An optional lookup table remembers which tokens were seen at each index.
//! It exists for diagnostics only and never influences [`FeatureSpace::resolve`].

use std::collections::{BTreeSet, HashMap};

use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use xxhash_rust::xxh3::xxh3_64;

use crate::config::FeaturesConfig;
use crate::error::Result;
use crate::types::{FeatureIndex, HashAlgorithm};
use crate::validation::validate_dimension_bits;

/// Deterministic token to feature-index mapping with optional reverse lookup
///
/// A space is an explicit value owned by the caller; nothing is shared
/// between two spaces, so runs and tests cannot contaminate each other.
///
/// # Example
///
/// ```
/// use malheur_core::hashing::FeatureSpace;
/// use malheur_core::types::HashAlgorithm;
///
/// let space = FeatureSpace::new(HashAlgorithm::Xxh3, 16, true).unwrap();
/// let index = space.resolve("NtCreateFile");
/// assert!(index < space.dimension());
///
/// space.register("NtCreateFile", index);
/// assert!(space.lookup(index).contains("NtCreateFile"));
/// ```
#[derive(Debug)]
pub struct FeatureSpace {
    algorithm: HashAlgorithm,
    bits: u32,
    mask: u64,
    table: Option<RwLock<HashMap<FeatureIndex, BTreeSet<String>>>>,
}

impl FeatureSpace {
    /// Create a feature space of size `2^bits`
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `bits` is outside the supported range.
    pub fn new(algorithm: HashAlgorithm, bits: u32, lookup_table: bool) -> Result<Self> {
        validate_dimension_bits(bits)?;
        Ok(Self {
            algorithm,
            bits,
            mask: (1u64 << bits) - 1,
            table: lookup_table.then(|| RwLock::new(HashMap::new())),
        })
    }

    /// Create a feature space from the `[features]` configuration section
    pub fn from_config(config: &FeaturesConfig) -> Result<Self> {
        Self::new(config.hash, config.dimension_bits, config.lookup_table)
    }

    /// Hash algorithm in use
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Dimension exponent
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Number of distinct feature indices `D`
    pub fn dimension(&self) -> u64 {
        self.mask + 1
    }

    /// Whether the reverse lookup table is kept
    pub fn lookup_enabled(&self) -> bool {
        self.table.is_some()
    }

    /// Map a token to its feature index
    #[inline]
    pub fn resolve(&self, token: &str) -> FeatureIndex {
        hash64(self.algorithm, token.as_bytes()) & self.mask
    }

    /// Record `token` under `index` when the lookup table is enabled
    ///
    /// The index is taken as given; it need not be `resolve(token)`.
    pub fn register(&self, token: &str, index: FeatureIndex) {
        if let Some(table) = &self.table {
            let mut table = table.write();
            let tokens = table.entry(index).or_default();
            if !tokens.contains(token) {
                tokens.insert(token.to_string());
            }
        }
    }

    /// Resolve a token and register it in one step
    #[inline]
    pub fn resolve_and_register(&self, token: &str) -> FeatureIndex {
        let index = self.resolve(token);
        self.register(token, index);
        index
    }

    /// All tokens registered at `index`; empty when the table is disabled
    pub fn lookup(&self, index: FeatureIndex) -> BTreeSet<String> {
        self.table
            .as_ref()
            .and_then(|table| table.read().get(&index).cloned())
            .unwrap_or_default()
    }

    /// Number of indices with at least one registered token
    pub fn table_len(&self) -> usize {
        self.table.as_ref().map_or(0, |table| table.read().len())
    }
}

/// 64-bit digest of `bytes` under `algorithm`
fn hash64(algorithm: HashAlgorithm, bytes: &[u8]) -> u64 {
    match algorithm {
        HashAlgorithm::Xxh3 => xxh3_64(bytes),
        HashAlgorithm::Sha256 => {
            let digest = Sha256::digest(bytes);
            let mut head = [0u8; 8];
            head.copy_from_slice(&digest[..8]);
            u64::from_le_bytes(head)
        }
        HashAlgorithm::Blake3 => {
            let digest = blake3::hash(bytes);
            let mut head = [0u8; 8];
            head.copy_from_slice(&digest.as_bytes()[..8]);
            u64::from_le_bytes(head)
        }
    }
}
