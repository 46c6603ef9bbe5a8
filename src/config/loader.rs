// Configuration loader
// Loads settings from an explicit TOML file or from ~/.onecycle/config.toml

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::settings::Config;
use crate::errors::UserFriendlyError;

/// Location of the per-user config file
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".onecycle/config.toml"))
}

/// Parse and validate configuration from TOML text
pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents).context("Failed to parse config TOML")?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))
        .user_context_with_suggestion(
            "Could not load training configuration",
            "Pass an existing TOML file, or create ~/.onecycle/config.toml",
        )?;

    let config = parse_config(&contents)
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;

    tracing::debug!(
        path = %path.display(),
        epochs = config.schedule.epochs(),
        "Loaded configuration"
    );

    Ok(config)
}

/// Load ~/.onecycle/config.toml, or `None` if it does not exist
pub fn load_default_config() -> Result<Option<Config>> {
    let path = default_config_path()?;
    if !path.exists() {
        return Ok(None);
    }
    load_config(&path).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::SchedulePolicy;
    use tempfile::TempDir;

    const ONE_CYCLE: &str = r#"
[schedule]
policy = "one_cycle"
epochs = 10
lr_from = 0.0003
lr_to = 0.003
momentum_from = 0.95
momentum_to = 0.85
anneal_pct = 0.2
anneal_rate = 10.0

[checkpoint]
save_folder = "out/models"
per_epoch = true
checkpoint_interval = 500

[metrics]
id = "librispeech"
log_params = true
"#;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(ONE_CYCLE).unwrap();

        assert!(matches!(config.schedule, SchedulePolicy::OneCycle(_)));
        assert_eq!(config.checkpoint.save_folder, PathBuf::from("out/models"));
        assert_eq!(config.checkpoint.checkpoint_interval, Some(500));
        assert_eq!(config.checkpoint.extension, "json");

        let metrics = config.metrics.unwrap();
        assert_eq!(metrics.id, "librispeech");
        assert_eq!(metrics.log_dir, PathBuf::from("runs"));
        assert!(metrics.log_params);
    }

    #[test]
    fn test_defaults_for_missing_sections() {
        let config = parse_config(
            r#"
[schedule]
policy = "anneal"
epochs = 3
lr = 0.1
learning_anneal = 1.1
"#,
        )
        .unwrap();

        assert!(!config.checkpoint.per_epoch);
        assert_eq!(config.checkpoint.checkpoint_interval, None);
        assert!(config.metrics.is_none());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad = ONE_CYCLE.replace("anneal_pct = 0.2", "anneal_pct = 1.2");
        let err = parse_config(&bad).unwrap_err();
        assert!(format!("{:#}", err).contains("anneal_pct"));

        let bad = ONE_CYCLE.replace("checkpoint_interval = 500", "checkpoint_interval = 0");
        assert!(parse_config(&bad).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, ONE_CYCLE).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.schedule.epochs(), 10);
    }

    #[test]
    fn test_missing_file_has_suggestion() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_config(&temp_dir.path().join("absent.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("Suggestion"));
    }
}
