//! Kernel functions over sparse feature vectors
//!
//! All scores are accumulated in `f64`. Matrices are computed row-parallel
//! into one pre-allocated buffer whose size is checked against a ceiling
//! before anything is allocated.

use std::time::Instant;

use rayon::prelude::*;

use crate::array::FeatureArray;
use crate::config::KernelConfig;
use crate::error::{MalheurError, Result};
use crate::types::KernelScheme;
use crate::validation::{matrix_bytes, DEFAULT_MAX_MATRIX_BYTES};
use crate::vector::FeatureVector;

/// Sparse dot product by merge-join over ascending indices
#[inline]
pub fn dot(a: &FeatureVector, b: &FeatureVector) -> f64 {
    let (ai, av) = (a.indices(), a.values());
    let (bi, bv) = (b.indices(), b.values());
    let (mut i, mut j) = (0, 0);
    let mut sum = 0.0f64;

    while i < ai.len() && j < bi.len() {
        if ai[i] == bi[j] {
            sum += av[i] as f64 * bv[j] as f64;
            i += 1;
            j += 1;
        } else if ai[i] < bi[j] {
            i += 1;
        } else {
            j += 1;
        }
    }

    sum
}

/// Evaluate `scheme` between two vectors
///
/// Cosine is defined as 0 when either vector is all-zero.
pub fn kernel(scheme: KernelScheme, a: &FeatureVector, b: &FeatureVector) -> f64 {
    match scheme {
        KernelScheme::Linear => dot(a, b),
        KernelScheme::Cosine => cosine_from(dot(a, b), dot(a, a), dot(b, b)),
    }
}

/// Kernel-induced distance `sqrt(k(a,a) + k(b,b) - 2 k(a,b))`
pub fn distance(scheme: KernelScheme, a: &FeatureVector, b: &FeatureVector) -> f64 {
    distance_from(
        kernel(scheme, a, a),
        kernel(scheme, b, b),
        kernel(scheme, a, b),
    )
}

#[inline]
pub(crate) fn cosine_from(ab: f64, aa: f64, bb: f64) -> f64 {
    let denom = (aa * bb).sqrt();
    if denom == 0.0 {
        0.0
    } else {
        ab / denom
    }
}

/// Kernel-induced distance from precomputed `k(a,a)`, `k(b,b)` and `k(a,b)`
#[inline]
pub(crate) fn distance_from(kaa: f64, kbb: f64, kab: f64) -> f64 {
    (kaa + kbb - 2.0 * kab).max(0.0).sqrt()
}

/// Dense row-major kernel matrix with explicit dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct KernelMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl KernelMatrix {
    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Value at `(i, j)`, `None` when out of bounds
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i < self.rows && j < self.cols {
            Some(self.data[i * self.cols + j])
        } else {
            None
        }
    }

    /// Row `i`, `None` when out of bounds
    pub fn row(&self, i: usize) -> Option<&[f64]> {
        if i < self.rows {
            Some(&self.data[i * self.cols..(i + 1) * self.cols])
        } else {
            None
        }
    }

    /// Iterate over rows in order
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.rows).map(move |i| &self.data[i * self.cols..(i + 1) * self.cols])
    }

    /// The underlying row-major buffer
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// True when square and `M[i][j] == M[j][i]` for every pair
    pub fn is_symmetric(&self) -> bool {
        if self.rows != self.cols {
            return false;
        }
        (0..self.rows).all(|i| {
            (i + 1..self.cols).all(|j| self.data[i * self.cols + j] == self.data[j * self.cols + i])
        })
    }
}

/// Evaluates a kernel scheme over feature arrays
#[derive(Debug, Clone, Copy)]
pub struct KernelEngine {
    scheme: KernelScheme,
    max_matrix_bytes: usize,
}

impl KernelEngine {
    /// Create an engine with the default matrix memory ceiling
    pub fn new(scheme: KernelScheme) -> Self {
        Self {
            scheme,
            max_matrix_bytes: DEFAULT_MAX_MATRIX_BYTES,
        }
    }

    /// Create an engine from the `[kernel]` configuration section
    pub fn from_config(config: &KernelConfig) -> Self {
        Self::new(config.scheme).with_memory_limit(config.max_matrix_bytes)
    }

    /// Override the matrix memory ceiling in bytes
    pub fn with_memory_limit(mut self, max_matrix_bytes: usize) -> Self {
        self.max_matrix_bytes = max_matrix_bytes;
        self
    }

    /// Kernel scheme in use
    pub fn scheme(&self) -> KernelScheme {
        self.scheme
    }

    /// Matrix memory ceiling in bytes
    pub fn memory_limit(&self) -> usize {
        self.max_matrix_bytes
    }

    /// `k(a, b)`
    #[inline]
    pub fn kernel(&self, a: &FeatureVector, b: &FeatureVector) -> f64 {
        kernel(self.scheme, a, b)
    }

    /// Kernel-induced distance between `a` and `b`
    #[inline]
    pub fn distance(&self, a: &FeatureVector, b: &FeatureVector) -> f64 {
        distance(self.scheme, a, b)
    }

    /// Kernel of every row report against every column report.
    ///
    /// Passing the same array twice computes the upper triangle only and
    /// mirrors it, so the result is exactly symmetric.
    ///
    /// # Errors
    ///
    /// Returns [`MalheurError::Resource`] when the matrix exceeds the memory
    /// ceiling or cannot be allocated.
    pub fn compute_matrix(&self, rows: &FeatureArray, cols: &FeatureArray) -> Result<KernelMatrix> {
        if rows.dimension_bits() != cols.dimension_bits() {
            return Err(MalheurError::DimensionMismatch {
                expected: rows.dimension_bits(),
                actual: cols.dimension_bits(),
            });
        }

        let (n, m) = (rows.len(), cols.len());
        matrix_bytes(n, m, self.max_matrix_bytes)?;
        let mut data: Vec<f64> = Vec::new();
        data.try_reserve_exact(n * m)
            .map_err(|e| MalheurError::resource(format!("kernel matrix {}x{}: {}", n, m, e)))?;
        data.resize(n * m, 0.0);

        let start = Instant::now();
        let symmetric = std::ptr::eq(rows, cols);
        let row_self = self.self_kernels(rows);
        let col_self = if symmetric {
            row_self.clone()
        } else {
            self.self_kernels(cols)
        };

        if m > 0 {
            data.par_chunks_mut(m).enumerate().for_each(|(i, out)| {
                let a = rows.vector(i);
                let first = if symmetric { i } else { 0 };
                for j in first..m {
                    out[j] = self.score(a, cols.vector(j), row_self[i], col_self[j]);
                }
            });
        }

        if symmetric {
            for i in 0..n {
                for j in 0..i {
                    data[i * m + j] = data[j * m + i];
                }
            }
        }

        tracing::info!(
            "Computed {} kernel matrix {}x{} in {:.2?}",
            self.scheme,
            n,
            m,
            start.elapsed()
        );
        Ok(KernelMatrix {
            rows: n,
            cols: m,
            data,
        })
    }

    /// Symmetric kernel matrix of an array against itself
    pub fn compute_self(&self, array: &FeatureArray) -> Result<KernelMatrix> {
        self.compute_matrix(array, array)
    }

    /// `dot(v, v)` for every vector of `array`
    fn self_kernels(&self, array: &FeatureArray) -> Vec<f64> {
        array.iter().map(|r| dot(&r.vector, &r.vector)).collect()
    }

    #[inline]
    fn score(&self, a: &FeatureVector, b: &FeatureVector, aa: f64, bb: f64) -> f64 {
        match self.scheme {
            KernelScheme::Linear => dot(a, b),
            KernelScheme::Cosine => cosine_from(dot(a, b), aa, bb),
        }
    }
}
