//! Task dispatch
//!
//! A [`Pipeline`] owns the validated configuration and the feature space of
//! one run. Each [`Task`] variant names its inputs and outputs explicitly.

use std::path::{Path, PathBuf};

use crate::array::FeatureArray;
use crate::config::Config;
use crate::error::{MalheurError, Result};
use crate::export::{export_kernel, render_prototypes};
use crate::hashing::FeatureSpace;
use crate::kernel::KernelEngine;
use crate::prototype::{PrototypeExtractor, PrototypeSet};
use crate::storage::{encode_prototypes, load_prototypes, write_all_atomic};

/// The closed set of tasks a pipeline can run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Extract prototypes, then export and/or save them
    Prototype {
        /// Report directory or line-per-report file
        input: PathBuf,
        /// Export destination for assignments
        result: Option<PathBuf>,
        /// Destination for the binary prototype set
        save: Option<PathBuf>,
    },
    /// Compute a kernel matrix
    Kernel {
        /// Report directory or line-per-report file
        input: PathBuf,
        /// Export destination for the matrix
        result: PathBuf,
        /// Saved prototype set whose representatives form the columns
        prototypes: Option<PathBuf>,
    },
    /// Load reports (and optionally a prototype set) and report counts
    Cluster {
        /// Report directory or line-per-report file
        input: PathBuf,
        /// Saved prototype set to check against the reports
        prototypes: Option<PathBuf>,
    },
}

impl Task {
    /// Task name as used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Task::Prototype { .. } => "prototype",
            Task::Kernel { .. } => "kernel",
            Task::Cluster { .. } => "cluster",
        }
    }

    /// Check the task's own contract before any input is read
    pub fn validate(&self) -> Result<()> {
        if let Task::Prototype {
            result: None,
            save: None,
            ..
        } = self
        {
            return Err(MalheurError::config("No output specified"));
        }
        Ok(())
    }
}

/// What a finished task produced
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// Extracted prototypes of the input reports
    Prototypes {
        /// The prototype set
        set: PrototypeSet,
        /// Labels of the input reports in input order
        labels: Vec<String>,
    },
    /// Shape of the written kernel matrix
    Kernel {
        /// Number of rows (reports)
        rows: usize,
        /// Number of columns (reports or prototypes)
        cols: usize,
    },
    /// Counts seen by the cluster task
    Cluster {
        /// Number of reports loaded
        reports: usize,
        /// Number of prototypes in the loaded set, if one was given
        prototypes: Option<usize>,
    },
}

/// Runs tasks against one validated configuration and feature space
#[derive(Debug)]
pub struct Pipeline {
    config: Config,
    space: FeatureSpace,
}

impl Pipeline {
    /// Validate `config` and create the run's feature space
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let space = FeatureSpace::from_config(&config.features)?;
        tracing::debug!(
            "Feature space: 2^{} {} ({} normalization, lookup table {})",
            space.bits(),
            space.algorithm(),
            config.features.normalization,
            if space.lookup_enabled() { "on" } else { "off" }
        );
        Ok(Self { config, space })
    }

    /// The validated configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The feature space shared by every task of this pipeline
    pub fn feature_space(&self) -> &FeatureSpace {
        &self.space
    }

    /// Read and hash the reports under `input`
    pub fn load_reports(&self, input: &Path) -> Result<FeatureArray> {
        FeatureArray::from_source(input, &self.config, &self.space)
    }

    /// Run a task to completion
    pub fn run(&self, task: &Task) -> Result<TaskOutcome> {
        task.validate()?;
        tracing::info!("Running {} task", task.name());

        match task {
            Task::Prototype {
                input,
                result,
                save,
            } => {
                let array = self.load_reports(input)?;
                let set = PrototypeExtractor::from_config(&self.config)?.extract(&array)?;

                // Both outputs are rendered before either file is touched
                let rendered = match result {
                    Some(path) => Some((
                        path,
                        render_prototypes(&set, &array, self.config.output.format)?.into_bytes(),
                    )),
                    None => None,
                };
                let encoded = match save {
                    Some(path) => Some((path, encode_prototypes(&set)?)),
                    None => None,
                };
                let files: Vec<(&Path, &[u8])> = rendered
                    .iter()
                    .chain(encoded.iter())
                    .map(|(path, bytes)| (path.as_path(), bytes.as_slice()))
                    .collect();
                write_all_atomic(&files)?;

                if let Some((path, _)) = &rendered {
                    tracing::info!("Wrote prototype assignments to {}", path.display());
                }
                if let Some((path, bytes)) = &encoded {
                    tracing::info!(
                        "Saved {} prototypes to {} ({} bytes)",
                        set.len(),
                        path.display(),
                        bytes.len()
                    );
                }
                let labels = array.iter().map(|r| r.label.clone()).collect();
                Ok(TaskOutcome::Prototypes { set, labels })
            }
            Task::Kernel {
                input,
                result,
                prototypes,
            } => {
                let engine = KernelEngine::from_config(&self.config.kernel);
                let array = self.load_reports(input)?;

                let (matrix, cols) = match prototypes {
                    Some(path) => {
                        let set = self.load_compatible(path)?;
                        let reps = set.representatives();
                        (engine.compute_matrix(&array, &reps)?, Some(reps))
                    }
                    None => (engine.compute_self(&array)?, None),
                };

                let col_array = cols.as_ref().unwrap_or(&array);
                export_kernel(
                    result,
                    &matrix,
                    &array,
                    col_array,
                    engine.scheme(),
                    self.config.output.format,
                )?;
                Ok(TaskOutcome::Kernel {
                    rows: matrix.rows(),
                    cols: matrix.cols(),
                })
            }
            Task::Cluster { input, prototypes } => {
                let array = self.load_reports(input)?;
                let prototypes = match prototypes {
                    Some(path) => Some(self.load_compatible(path)?.len()),
                    None => None,
                };
                tracing::info!(
                    "Loaded {} reports{}",
                    array.len(),
                    prototypes.map_or(String::new(), |k| format!(" and {} prototypes", k))
                );
                Ok(TaskOutcome::Cluster {
                    reports: array.len(),
                    prototypes,
                })
            }
        }
    }

    fn load_compatible(&self, path: &Path) -> Result<PrototypeSet> {
        let set = load_prototypes(path)?;
        set.ensure_compatible(&self.space, self.config.features.normalization)?;
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prototype_task_requires_output() {
        let task = Task::Prototype {
            input: PathBuf::from("reports"),
            result: None,
            save: None,
        };
        let err = task.validate().unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("No output specified"));

        let pipeline = Pipeline::new(Config::default()).unwrap();
        assert!(pipeline.run(&task).unwrap_err().is_config());
    }

    #[test]
    fn test_task_names() {
        let input = PathBuf::from("x");
        assert_eq!(
            Task::Cluster {
                input: input.clone(),
                prototypes: None
            }
            .name(),
            "cluster"
        );
        assert_eq!(
            Task::Kernel {
                input,
                result: PathBuf::from("k.txt"),
                prototypes: None
            }
            .name(),
            "kernel"
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.prototypes.threshold = -1.0;
        assert!(Pipeline::new(config).unwrap_err().is_config());
    }

    #[test]
    fn test_cluster_counts() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("reports.txt");
        std::fs::write(&input, "a b\nc\n\nd e f\n").unwrap();

        let pipeline = Pipeline::new(Config::default()).unwrap();
        let outcome = pipeline
            .run(&Task::Cluster {
                input,
                prototypes: None,
            })
            .unwrap();
        assert_eq!(
            outcome,
            TaskOutcome::Cluster {
                reports: 3,
                prototypes: None
            }
        );
    }
}
