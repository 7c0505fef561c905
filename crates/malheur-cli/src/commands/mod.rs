//! CLI command implementations for Malheur
//!
//! - `prototype` - Extract prototypes, export assignments, save the set
//! - `kernel` - Compute and export a kernel matrix
//! - `cluster` - Load reports and prototypes and report counts

pub mod cluster;
pub mod kernel;
pub mod prototype;

use anyhow::Result;
use malheur_core::{Config, Pipeline, Task};

use crate::format;

/// Check the task contract, build the pipeline and print the configuration at `-vv`
pub(crate) fn pipeline_for(config: Config, task: &Task, verbose: u8) -> Result<Pipeline> {
    task.validate()?;
    let pipeline = Pipeline::new(config)?;
    if verbose >= 2 {
        eprintln!("{}", format::format_config(pipeline.config())?);
    }
    Ok(pipeline)
}
