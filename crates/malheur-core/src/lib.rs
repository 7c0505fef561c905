//! Behavior-report hashing, sparse kernels and prototype extraction.
//!
//! Reports are tokenized, hashed into a fixed `2^bits` feature space and
//! stored as sparse vectors. A kernel engine scores pairs of vectors, and a
//! single greedy pass reduces a report collection to a small set of
//! prototypes that every report is assigned to.
//!
//! # Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`hashing`] | [`FeatureSpace`]: token to index mapping, optional lookup table |
//! | [`vector`], [`array`] | sparse vectors and ordered report collections |
//! | [`kernel`] | linear and cosine kernels, [`KernelMatrix`] |
//! | [`prototype`] | [`PrototypeExtractor`] and [`PrototypeSet`] |
//! | [`storage`], [`export`] | prototype persistence, text and JSON output |
//! | [`pipeline`] | [`Task`] dispatch over one validated [`Config`] |
//!
//! # Example
//!
//! ```rust
//! use malheur_core::{FeatureArray, FeatureSpace, KernelEngine, PrototypeExtractor};
//! use malheur_core::types::{HashAlgorithm, KernelScheme, MetricDirection, Normalization};
//!
//! let space = FeatureSpace::new(HashAlgorithm::Xxh3, 20, false).unwrap();
//! let array = FeatureArray::from_tokenized(
//!     vec![
//!         ("r1", vec!["open", "open", "read"]),
//!         ("r2", vec!["open", "read", "close"]),
//!         ("r3", vec!["connect"]),
//!     ],
//!     &space,
//!     Normalization::L2,
//! )
//! .unwrap();
//!
//! let extractor = PrototypeExtractor::new(
//!     KernelEngine::new(KernelScheme::Cosine),
//!     MetricDirection::Similarity,
//!     0.5,
//! )
//! .unwrap();
//! let set = extractor.extract(&array).unwrap();
//! assert_eq!(set.len(), 2);
//! ```

#![warn(missing_docs)]

pub mod array;
pub mod config;
pub mod error;
pub mod export;
pub mod hashing;
pub mod kernel;
pub mod pipeline;
pub mod prototype;
pub mod source;
pub mod storage;
pub mod types;
pub mod validation;
pub mod vector;

pub use array::{FeatureArray, Report};
pub use config::Config;
pub use error::{MalheurError, Result};
pub use hashing::FeatureSpace;
pub use kernel::{KernelEngine, KernelMatrix};
pub use pipeline::{Pipeline, Task, TaskOutcome};
pub use prototype::{Assignment, Prototype, PrototypeExtractor, PrototypeSet};
pub use vector::FeatureVector;
