//! Cluster command implementation
//!
//! Loads the reports and, when given, a saved prototype set checked against
//! the current feature space. No grouping is performed.

use std::path::PathBuf;

use anyhow::Result;
use malheur_core::{Config, Task, TaskOutcome};

use super::pipeline_for;
use crate::format;

/// Run the cluster command
pub fn run(config: Config, input: PathBuf, load: Option<PathBuf>, verbose: u8) -> Result<()> {
    let task = Task::Cluster {
        input,
        prototypes: load,
    };
    let pipeline = pipeline_for(config, &task, verbose)?;

    if let TaskOutcome::Cluster {
        reports,
        prototypes,
    } = pipeline.run(&task)?
    {
        println!(
            "{}",
            format::format_stats(reports, prototypes, pipeline.feature_space())
        );
        if prototypes.is_none() {
            println!(
                "{}",
                format::format_warning("No prototype set given; nothing to compare against")
            );
        }
    }
    Ok(())
}
