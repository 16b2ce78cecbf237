/// `load_config` module: loads the optional YAML config and applies environment overrides.
///
/// This is the only place where user-supplied YAML is parsed. Every section of
/// [`ReviewConfig`] has defaults, so a missing file or a partial file is fine.
///
/// # Environment overrides
/// After parsing, these variables replace the program of the matching tool:
/// - `REVIEW_FORMATTER`
/// - `REVIEW_REFLOW`
/// - `REVIEW_TYPESETTER`
/// - `REVIEW_MERGER`
///
/// # Errors
/// All errors use `anyhow::Error` and surface at the CLI boundary.
use anyhow::{anyhow, Result};
use std::fs;
use std::path::Path;
use submission_review_core::config::ReviewConfig;
use tracing::{error, info};

pub const ENV_OVERRIDES: [&str; 4] = [
    "REVIEW_FORMATTER",
    "REVIEW_REFLOW",
    "REVIEW_TYPESETTER",
    "REVIEW_MERGER",
];

/// Loads the config at `path` (defaults when `None`) and applies environment overrides.
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<ReviewConfig> {
    let mut config = match path {
        Some(path) => read_config_file(path.as_ref())?,
        None => {
            info!("No config file given, using defaults");
            ReviewConfig::default()
        }
    };
    apply_env_overrides(&mut config);
    config.trace_loaded();
    Ok(config)
}

fn read_config_file(path_ref: &Path) -> Result<ReviewConfig> {
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow!("Failed to read config file {:?}: {}", path_ref, e));
        }
    };

    // An empty file is a valid "all defaults" config.
    if config_content.trim().is_empty() {
        return Ok(ReviewConfig::default());
    }

    match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

fn apply_env_overrides(config: &mut ReviewConfig) {
    let tools = &mut config.tools;
    let targets = [
        &mut tools.formatter,
        &mut tools.reflow,
        &mut tools.typesetter,
        &mut tools.merger,
    ];
    for (var, tool) in ENV_OVERRIDES.iter().zip(targets) {
        if let Ok(program) = std::env::var(var) {
            if !program.trim().is_empty() {
                info!(var = *var, program = %program, "Tool program overridden from environment");
                tool.program = program;
            }
        }
    }
}
