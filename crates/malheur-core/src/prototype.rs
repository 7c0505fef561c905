//! Prototype extraction
//!
//! A single greedy pass over the reports in array order. Each report joins
//! the best existing prototype when the score satisfies the threshold and
//! otherwise becomes a prototype itself. Representatives are fixed at
//! creation, so the outcome depends on the input order.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::array::{FeatureArray, Report};
use crate::config::Config;
use crate::error::{MalheurError, Result};
use crate::hashing::FeatureSpace;
use crate::kernel::{cosine_from, distance_from, dot, KernelEngine};
use crate::types::{HashAlgorithm, KernelScheme, MetricDirection, Normalization};
use crate::vector::FeatureVector;

/// A representative report together with the reports it absorbed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prototype {
    /// Creation index within the set
    pub id: usize,
    /// Array index of the report that created the prototype
    pub source: usize,
    /// Label of that report
    pub label: String,
    /// Copy of the creating report's vector
    pub representative: FeatureVector,
    /// Member report indices, ascending
    pub members: Vec<usize>,
    /// Largest kernel-induced distance from the representative to a member
    pub radius: f64,
}

/// Where a report ended up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Id of the owning prototype
    pub prototype: usize,
    /// Kernel-induced distance to its representative
    pub distance: f64,
}

/// Prototypes in creation order plus the assignment of every report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrototypeSet {
    prototypes: Vec<Prototype>,
    assignments: Vec<Assignment>,
    dimension_bits: u32,
    hash: HashAlgorithm,
    normalization: Normalization,
    scheme: KernelScheme,
    metric: MetricDirection,
    threshold: f64,
}

impl PrototypeSet {
    /// Number of prototypes `k`
    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    /// True when no prototype was extracted
    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }

    /// Number of assigned reports `n`
    pub fn report_count(&self) -> usize {
        self.assignments.len()
    }

    /// Prototype with the given id
    pub fn get(&self, id: usize) -> Option<&Prototype> {
        self.prototypes.get(id)
    }

    /// Prototypes in creation order
    pub fn iter(&self) -> std::slice::Iter<'_, Prototype> {
        self.prototypes.iter()
    }

    /// Assignment of the report at `index`
    pub fn assignment(&self, index: usize) -> Option<&Assignment> {
        self.assignments.get(index)
    }

    /// Assignments indexed by report
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Prototype owning the report at `index`
    pub fn prototype_of(&self, index: usize) -> Option<&Prototype> {
        self.assignment(index).and_then(|a| self.get(a.prototype))
    }

    /// Dimension bits of the space the representatives live in
    pub fn dimension_bits(&self) -> u32 {
        self.dimension_bits
    }

    /// Hash algorithm the representatives were built with
    pub fn hash(&self) -> HashAlgorithm {
        self.hash
    }

    /// Normalization applied to the representatives
    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Kernel used during extraction
    pub fn scheme(&self) -> KernelScheme {
        self.scheme
    }

    /// Score direction used during extraction
    pub fn metric(&self) -> MetricDirection {
        self.metric
    }

    /// Acceptance threshold used during extraction
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Representatives as an array, labelled by their source reports
    pub fn representatives(&self) -> FeatureArray {
        let mut array = FeatureArray::new(self.dimension_bits);
        for prototype in &self.prototypes {
            array.push(Report::new(
                prototype.label.clone(),
                prototype.representative.clone(),
            ));
        }
        array
    }

    /// Check structural consistency.
    ///
    /// Ids match positions, member lists are ascending, pairwise disjoint
    /// and cover every report, and each member's assignment points back to
    /// its prototype.
    pub fn validate(&self) -> Result<()> {
        let n = self.assignments.len();
        let mut seen = vec![false; n];

        for (position, prototype) in self.prototypes.iter().enumerate() {
            if prototype.id != position {
                return Err(inconsistent(format!(
                    "prototype at position {} has id {}",
                    position, prototype.id
                )));
            }
            if prototype.members.first() != Some(&prototype.source) {
                return Err(inconsistent(format!(
                    "prototype {} does not start with its source report",
                    prototype.id
                )));
            }
            if !prototype.members.windows(2).all(|w| w[0] < w[1]) {
                return Err(inconsistent(format!(
                    "members of prototype {} are not ascending",
                    prototype.id
                )));
            }
            for &member in &prototype.members {
                let slot = seen.get_mut(member).ok_or_else(|| {
                    inconsistent(format!("member {} out of range ({} reports)", member, n))
                })?;
                if *slot {
                    return Err(inconsistent(format!(
                        "report {} belongs to more than one prototype",
                        member
                    )));
                }
                *slot = true;
                if self.assignments[member].prototype != prototype.id {
                    return Err(inconsistent(format!(
                        "assignment of report {} disagrees with prototype {}",
                        member, prototype.id
                    )));
                }
            }
        }

        if let Some(missing) = seen.iter().position(|&s| !s) {
            return Err(inconsistent(format!("report {} is unassigned", missing)));
        }
        Ok(())
    }

    /// Check that the set can be combined with vectors hashed in `space`
    /// and normalized with `normalization`.
    ///
    /// Dimension is checked first, then the hash algorithm, then the
    /// normalization.
    pub fn ensure_compatible(
        &self,
        space: &FeatureSpace,
        normalization: Normalization,
    ) -> Result<()> {
        if self.dimension_bits != space.bits() {
            return Err(MalheurError::DimensionMismatch {
                expected: space.bits(),
                actual: self.dimension_bits,
            });
        }
        if self.hash != space.algorithm() {
            return Err(MalheurError::FeatureSpaceMismatch {
                expected: format!("hash {}", space.algorithm()),
                actual: format!("hash {}", self.hash),
            });
        }
        if self.normalization != normalization {
            return Err(MalheurError::FeatureSpaceMismatch {
                expected: format!("normalization {}", normalization),
                actual: format!("normalization {}", self.normalization),
            });
        }
        Ok(())
    }
}

/// `k(x, x)` from the raw self dot product
fn self_kernel(scheme: KernelScheme, xx: f64) -> f64 {
    match scheme {
        KernelScheme::Linear => xx,
        KernelScheme::Cosine => cosine_from(xx, xx, xx),
    }
}

impl<'a> IntoIterator for &'a PrototypeSet {
    type Item = &'a Prototype;
    type IntoIter = std::slice::Iter<'a, Prototype>;

    fn into_iter(self) -> Self::IntoIter {
        self.prototypes.iter()
    }
}

fn inconsistent(message: String) -> MalheurError {
    MalheurError::input("prototype set", message)
}

/// Greedy leader-style prototype extraction
#[derive(Debug, Clone, Copy)]
pub struct PrototypeExtractor {
    engine: KernelEngine,
    metric: MetricDirection,
    threshold: f64,
    hash: HashAlgorithm,
    normalization: Normalization,
}

impl PrototypeExtractor {
    /// Create an extractor
    ///
    /// Sets are recorded as built with the default hash and no
    /// normalization; see [`PrototypeExtractor::with_features`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `threshold` is negative or not finite.
    /// Scheme-specific upper bounds are checked by [`Config::validate`].
    pub fn new(engine: KernelEngine, metric: MetricDirection, threshold: f64) -> Result<Self> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(MalheurError::config(format!(
                "threshold = {} must be a finite, non-negative number",
                threshold
            )));
        }
        Ok(Self {
            engine,
            metric,
            threshold,
            hash: HashAlgorithm::default(),
            normalization: Normalization::default(),
        })
    }

    /// Record the hash algorithm and normalization the input arrays were built with
    pub fn with_features(mut self, hash: HashAlgorithm, normalization: Normalization) -> Self {
        self.hash = hash;
        self.normalization = normalization;
        self
    }

    /// Create an extractor from a validated configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            KernelEngine::from_config(&config.kernel),
            config.prototypes.metric,
            config.prototypes.threshold,
        )?
        .with_features(config.features.hash, config.features.normalization))
    }

    /// Kernel engine used for scores
    pub fn engine(&self) -> &KernelEngine {
        &self.engine
    }

    /// Run one sequential pass over `array`.
    ///
    /// Every report is assigned to exactly one prototype. An empty array
    /// yields an empty set.
    pub fn extract(&self, array: &FeatureArray) -> Result<PrototypeSet> {
        let start = Instant::now();
        let scheme = self.engine.scheme();

        let mut prototypes: Vec<Prototype> = Vec::new();
        // Raw dot(p, p) and k(p, p) per prototype, cached alongside `prototypes`
        let mut rep_dot: Vec<f64> = Vec::new();
        let mut rep_self: Vec<f64> = Vec::new();
        let mut assignments: Vec<Assignment> = Vec::new();
        assignments.try_reserve_exact(array.len())?;

        for (index, report) in array.iter().enumerate() {
            let r = &report.vector;
            let r_dot = dot(r, r);
            let r_self = self_kernel(scheme, r_dot);

            let mut best: Option<(usize, f64, f64)> = None;
            for (p, prototype) in prototypes.iter().enumerate() {
                let rp = dot(r, &prototype.representative);
                let k = match scheme {
                    KernelScheme::Linear => rp,
                    KernelScheme::Cosine => cosine_from(rp, r_dot, rep_dot[p]),
                };
                let d = distance_from(r_self, rep_self[p], k);
                let score = match self.metric {
                    MetricDirection::Similarity => k,
                    MetricDirection::Distance => d,
                };
                let improves = match best {
                    None => true,
                    Some((_, best_score, _)) => self.metric.improves(score, best_score),
                };
                if improves {
                    best = Some((p, score, d));
                }
            }

            match best {
                Some((p, score, d)) if self.metric.accepts(score, self.threshold) => {
                    let prototype = &mut prototypes[p];
                    prototype.members.push(index);
                    prototype.radius = prototype.radius.max(d);
                    assignments.push(Assignment {
                        prototype: p,
                        distance: d,
                    });
                }
                _ => {
                    let id = prototypes.len();
                    tracing::debug!(
                        "Prototype {} created from report {} ({})",
                        id,
                        index,
                        report.label
                    );
                    prototypes.push(Prototype {
                        id,
                        source: index,
                        label: report.label.clone(),
                        representative: r.clone(),
                        members: vec![index],
                        radius: 0.0,
                    });
                    rep_dot.push(r_dot);
                    rep_self.push(r_self);
                    assignments.push(Assignment {
                        prototype: id,
                        distance: 0.0,
                    });
                }
            }
        }

        tracing::info!(
            "Extracted {} prototypes from {} reports ({} {} threshold {}, {:.2?})",
            prototypes.len(),
            array.len(),
            scheme,
            self.metric,
            self.threshold,
            start.elapsed()
        );

        Ok(PrototypeSet {
            prototypes,
            assignments,
            dimension_bits: array.dimension_bits(),
            hash: self.hash,
            normalization: self.normalization,
            scheme,
            metric: self.metric,
            threshold: self.threshold,
        })
    }
}
