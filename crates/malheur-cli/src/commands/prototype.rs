//! Prototype command implementation

use std::path::PathBuf;

use anyhow::Result;
use malheur_core::{Config, Task, TaskOutcome};

use super::pipeline_for;
use crate::format;

/// Run the prototype command
pub fn run(
    config: Config,
    input: PathBuf,
    result: Option<PathBuf>,
    save: Option<PathBuf>,
    verbose: u8,
) -> Result<()> {
    let task = Task::Prototype {
        input,
        result: result.clone(),
        save: save.clone(),
    };
    let pipeline = pipeline_for(config, &task, verbose)?;

    if let TaskOutcome::Prototypes { set, labels } = pipeline.run(&task)? {
        if verbose >= 2 {
            eprintln!("{}", format::format_prototypes(&set, pipeline.feature_space()));
        }
        println!(
            "{}",
            format::format_success(&format!(
                "Extracted {} prototypes from {} reports",
                set.len(),
                labels.len()
            ))
        );
    }
    if let Some(path) = result {
        println!(
            "{}",
            format::format_info(&format!("Assignments written to {}", path.display()))
        );
    }
    if let Some(path) = save {
        println!(
            "{}",
            format::format_info(&format!("Prototypes saved to {}", path.display()))
        );
    }
    Ok(())
}
