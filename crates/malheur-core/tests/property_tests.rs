//! Property-based tests using proptest
//!
//! Kernel and vector invariants that must hold for arbitrary sparse input.

use proptest::prelude::*;

use malheur_core::array::Report;
use malheur_core::kernel::{distance, dot, kernel};
use malheur_core::types::{HashAlgorithm, KernelScheme, Normalization};
use malheur_core::{FeatureArray, FeatureSpace, FeatureVector, KernelEngine};

// Sparse vectors with non-negative weights over a small index range, so
// that pairs overlap often
fn sparse_strategy() -> impl Strategy<Value = FeatureVector> {
    prop::collection::vec((0u64..64, 0.0f32..10.0f32), 0..24).prop_map(FeatureVector::from_entries)
}

fn token_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,6}", 0..30)
}

proptest! {
    // Property: dot product is commutative
    #[test]
    fn test_dot_commutative(a in sparse_strategy(), b in sparse_strategy()) {
        prop_assert_eq!(dot(&a, &b), dot(&b, &a));
    }

    // Property: cosine of a vector with itself is one, or zero for the zero vector
    #[test]
    fn test_cosine_self_similarity(v in sparse_strategy()) {
        let c = kernel(KernelScheme::Cosine, &v, &v);
        if v.is_zero() {
            prop_assert_eq!(c, 0.0);
        } else {
            prop_assert!((c - 1.0).abs() < 1e-9, "cosine(v, v) = {}", c);
        }
    }

    // Property: cosine with non-negative weights stays within [0, 1]
    #[test]
    fn test_cosine_bounded(a in sparse_strategy(), b in sparse_strategy()) {
        let c = kernel(KernelScheme::Cosine, &a, &b);
        prop_assert!((-1e-12..=1.0 + 1e-9).contains(&c), "cosine = {}", c);
    }

    // Property: kernel-induced distance is symmetric and zero on the diagonal
    #[test]
    fn test_distance_symmetric(a in sparse_strategy(), b in sparse_strategy()) {
        for scheme in [KernelScheme::Linear, KernelScheme::Cosine] {
            let ab = distance(scheme, &a, &b);
            let ba = distance(scheme, &b, &a);
            prop_assert!((ab - ba).abs() < 1e-9);
            prop_assert!(ab >= 0.0);
            prop_assert!(distance(scheme, &a, &a) < 1e-6);
        }
    }

    // Property: self kernel matrices are exactly symmetric
    #[test]
    fn test_self_matrix_exactly_symmetric(vectors in prop::collection::vec(sparse_strategy(), 0..12)) {
        let mut array = FeatureArray::new(6);
        for (i, v) in vectors.into_iter().enumerate() {
            array.push(Report::new(format!("r{}", i), v));
        }
        for scheme in [KernelScheme::Linear, KernelScheme::Cosine] {
            let matrix = KernelEngine::new(scheme).compute_self(&array).unwrap();
            prop_assert!(matrix.is_symmetric());
            prop_assert_eq!(matrix.shape(), (array.len(), array.len()));
        }
    }

    // Property: hashing conserves the total token count and sorts indices
    #[test]
    fn test_token_mass_conserved(tokens in token_strategy(), bits in 1u32..12) {
        let space = FeatureSpace::new(HashAlgorithm::Xxh3, bits, false).unwrap();
        let v = FeatureVector::from_tokens(&tokens, &space).unwrap();

        prop_assert_eq!(v.values().iter().sum::<f32>(), tokens.len() as f32);
        prop_assert!(v.indices().windows(2).all(|w| w[0] < w[1]));
        prop_assert!(v.max_index().map_or(true, |i| i < space.dimension()));
    }

    // Property: L2 normalization yields unit norm unless the vector is zero
    #[test]
    fn test_l2_normalization(v in sparse_strategy()) {
        let n = v.clone().normalized(Normalization::L2);
        if v.is_zero() {
            prop_assert!(n.is_zero());
        } else {
            prop_assert!((n.l2_norm() - 1.0).abs() < 1e-5);
        }
    }
}

#[test]
fn test_collision_merges_weights() {
    // One bit forces at least two of three tokens onto the same index
    let space = FeatureSpace::new(HashAlgorithm::Sha256, 1, true).unwrap();
    let tokens = ["alpha", "beta", "gamma", "alpha"];
    let v = FeatureVector::from_tokens(tokens, &space).unwrap();

    assert!(v.nnz() <= 2);
    let shared = (0..2)
        .find(|&i| space.lookup(i).len() >= 2)
        .expect("two tokens share an index");
    let expected: f32 = tokens
        .iter()
        .filter(|t| space.resolve(t) == shared)
        .count() as f32;
    assert_eq!(v.get(shared), expected);
}
