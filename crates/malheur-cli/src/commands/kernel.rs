//! Kernel command implementation

use std::path::PathBuf;

use anyhow::Result;
use malheur_core::{Config, Task, TaskOutcome};

use super::pipeline_for;
use crate::format;

/// Run the kernel command
pub fn run(
    config: Config,
    input: PathBuf,
    result: PathBuf,
    load: Option<PathBuf>,
    verbose: u8,
) -> Result<()> {
    let task = Task::Kernel {
        input,
        result: result.clone(),
        prototypes: load,
    };
    let pipeline = pipeline_for(config, &task, verbose)?;

    if let TaskOutcome::Kernel { rows, cols } = pipeline.run(&task)? {
        println!(
            "{}",
            format::format_success(&format!(
                "Kernel matrix {}x{} written to {}",
                rows,
                cols,
                result.display()
            ))
        );
    }
    Ok(())
}
