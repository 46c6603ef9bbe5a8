// Configuration structs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::ConfigError;
use crate::metrics::JsonlMetricsSink;
use crate::observer::{BatchCheckpointWriter, EpochCheckpointWriter, MetricsLogger, ObserverSet};
use crate::schedule::{HyperparamSchedule, SchedulePolicy};
use crate::training::MetricHistory;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Learning-rate / momentum policy
    pub schedule: SchedulePolicy,

    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    /// Metrics logging; disabled when the section is absent
    #[serde(default)]
    pub metrics: Option<MetricsConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Directory checkpoints are written to
    #[serde(default = "default_save_folder")]
    pub save_folder: PathBuf,

    /// Save a checkpoint at the end of every epoch
    #[serde(default)]
    pub per_epoch: bool,

    /// Save a checkpoint every N batches
    #[serde(default)]
    pub checkpoint_interval: Option<usize>,

    /// File extension of checkpoint files
    #[serde(default = "default_extension")]
    pub extension: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Run identifier; also the metrics log file name
    #[serde(default = "default_run_id")]
    pub id: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Also log parameter and gradient histograms
    #[serde(default)]
    pub log_params: bool,
}

fn default_save_folder() -> PathBuf {
    PathBuf::from("models")
}

fn default_extension() -> String {
    "json".to_string()
}

fn default_run_id() -> String {
    "run".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("runs")
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            save_folder: default_save_folder(),
            per_epoch: false,
            checkpoint_interval: None,
            extension: default_extension(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            id: default_run_id(),
            log_dir: default_log_dir(),
            log_params: false,
        }
    }
}

impl Config {
    pub fn new(schedule: SchedulePolicy) -> Self {
        Self {
            schedule,
            checkpoint: CheckpointConfig::default(),
            metrics: None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.schedule.validate()?;
        if self.checkpoint.checkpoint_interval == Some(0) {
            return Err(ConfigError::ZeroCheckpointInterval);
        }
        Ok(())
    }

    /// Fresh schedule for a new training run
    pub fn build_schedule(&self) -> HyperparamSchedule {
        self.schedule.build()
    }

    /// Observers enabled by this configuration
    ///
    /// `history` seeds the checkpoint writers when resuming a run.
    pub fn build_observers(&self, history: MetricHistory) -> Result<ObserverSet> {
        let mut observers = ObserverSet::new();

        if let Some(metrics) = &self.metrics {
            let sink = JsonlMetricsSink::new(&metrics.log_dir, &metrics.id)
                .context("Failed to set up metrics logging")?;
            observers.push(MetricsLogger::new(metrics.id.clone(), sink, metrics.log_params));
        }

        let checkpoint = &self.checkpoint;
        if checkpoint.per_epoch {
            observers.push(
                EpochCheckpointWriter::new(checkpoint.save_folder.clone())
                    .with_extension(checkpoint.extension.clone())
                    .with_history(history.clone()),
            );
        }
        if let Some(interval) = checkpoint.checkpoint_interval {
            observers.push(
                BatchCheckpointWriter::new(checkpoint.save_folder.clone(), interval)?
                    .with_extension(checkpoint.extension.clone())
                    .with_history(history),
            );
        }

        tracing::debug!(observers = observers.len(), "Built training observers");

        Ok(observers)
    }
}
