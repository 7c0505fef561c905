//! Output formatting utilities

use colored::*;
use malheur_core::{Config, FeatureSpace, PrototypeSet};

/// Features shown per prototype at high verbosity
const HEAVIEST_FEATURES: usize = 3;

/// Format error message
pub fn format_error(msg: &str) -> String {
    format!("{} {}", "Error:".red().bold(), msg)
}

/// Format success message
pub fn format_success(msg: &str) -> String {
    format!("{} {}", "✓".green().bold(), msg)
}

/// Format warning message
pub fn format_warning(msg: &str) -> String {
    format!("{} {}", "Warning:".yellow().bold(), msg)
}

/// Format info message
pub fn format_info(msg: &str) -> String {
    format!("{} {}", "ℹ".blue().bold(), msg)
}

/// Format the validated configuration as TOML
pub fn format_config(config: &Config) -> anyhow::Result<String> {
    let body = toml::to_string_pretty(config)
        .map_err(|e| anyhow::anyhow!("Failed to render configuration: {}", e))?;
    Ok(format!("\n{}\n{}", "Configuration".bold().green(), body))
}

/// Format counts from the cluster task
pub fn format_stats(reports: usize, prototypes: Option<usize>, space: &FeatureSpace) -> String {
    let prototypes = prototypes.map_or_else(|| "-".to_string(), |k| k.to_string());
    format!(
        "\n{}\n  Reports: {}\n  Prototypes: {}\n  Feature space: 2^{} ({})\n",
        "Cluster Statistics".bold().green(),
        reports.to_string().cyan(),
        prototypes.cyan(),
        space.bits(),
        space.algorithm().to_string().cyan()
    )
}

/// Format every prototype with its heaviest features
///
/// Tokens are listed next to each feature index when the space keeps a
/// lookup table.
pub fn format_prototypes(set: &PrototypeSet, space: &FeatureSpace) -> String {
    let mut output = format!(
        "\n{} ({} {}, threshold {})\n",
        "Prototypes".bold().green(),
        set.scheme(),
        set.metric(),
        set.threshold()
    );

    for prototype in set {
        output.push_str(&format!(
            "\n{}. {}\n   Members: {}\n   Radius: {:.6}\n",
            prototype.id,
            prototype.label.bold(),
            prototype.members.len(),
            prototype.radius
        ));

        for (index, weight) in prototype.representative.heaviest(HEAVIEST_FEATURES) {
            let mut line = format!("   {:>10} {:.4}", index, weight);
            if space.lookup_enabled() {
                let tokens: Vec<String> = space.lookup(index).into_iter().collect();
                line.push_str(&format!("  {}", tokens.join(", ").dimmed()));
            }
            output.push_str(&line);
            output.push('\n');
        }
    }

    output
}
