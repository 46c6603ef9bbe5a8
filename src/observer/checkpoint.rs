// Checkpoint observers
// Serialize training state at the end of every epoch, or every N batches

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;
use crate::training::{
    batch_checkpoint_path, epoch_checkpoint_path, normalize_extension, CheckpointStore,
    FsCheckpointStore, MetricHistory, TrainingState,
};

use super::{BatchEnd, EpochEnd, Observer};

/// Default checkpoint file extension
pub const DEFAULT_EXTENSION: &str = "json";

/// Saves full training state to `checkpoint_{epoch}.{ext}` after each epoch
///
/// File names use one-based epoch numbers.
pub struct EpochCheckpointWriter<S = FsCheckpointStore> {
    save_folder: PathBuf,
    extension: String,
    history: MetricHistory,
    store: S,
}

impl EpochCheckpointWriter<FsCheckpointStore> {
    pub fn new(save_folder: impl Into<PathBuf>) -> Self {
        Self::with_store(save_folder, FsCheckpointStore)
    }
}

impl<S: CheckpointStore> EpochCheckpointWriter<S> {
    pub fn with_store(save_folder: impl Into<PathBuf>, store: S) -> Self {
        Self {
            save_folder: save_folder.into(),
            extension: DEFAULT_EXTENSION.to_string(),
            history: MetricHistory::default(),
            store,
        }
    }

    /// File extension, with or without a leading dot
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = normalize_extension(&extension.into()).to_string();
        self
    }

    /// Continue the metric history of a resumed run
    pub fn with_history(mut self, history: MetricHistory) -> Self {
        self.history = history;
        self
    }

    pub fn history(&self) -> &MetricHistory {
        &self.history
    }

    pub fn save_folder(&self) -> &Path {
        &self.save_folder
    }
}

impl<S: CheckpointStore> Observer for EpochCheckpointWriter<S> {
    fn on_epoch_end(&mut self, event: &EpochEnd<'_>) -> Result<()> {
        let metrics = event.metrics;
        self.history.push(metrics.avg_loss, metrics.wer, metrics.cer);

        let path = epoch_checkpoint_path(&self.save_folder, event.epoch + 1, &self.extension);
        tracing::info!(path = ?path, epoch = event.epoch + 1, "Saving checkpoint");

        let state =
            TrainingState::capture(event.model, event.optimizer, event.epoch, self.history.clone());
        self.store.write(&path, &state.to_bytes()?)?;

        Ok(())
    }
}

/// Saves training state every `checkpoint_interval` batches
///
/// Writes when `(batch + 1) % checkpoint_interval == 0`, to
/// `checkpoint_epoch_{epoch}_iter_{batch}.{ext}` with one-based numbers.
/// Epoch-end notifications are only used to keep the metric history current.
pub struct BatchCheckpointWriter<S = FsCheckpointStore> {
    save_folder: PathBuf,
    checkpoint_interval: usize,
    extension: String,
    history: MetricHistory,
    store: S,
}

impl BatchCheckpointWriter<FsCheckpointStore> {
    pub fn new(save_folder: impl Into<PathBuf>, checkpoint_interval: usize) -> Result<Self, ConfigError> {
        Self::with_store(save_folder, checkpoint_interval, FsCheckpointStore)
    }
}

impl<S: CheckpointStore> BatchCheckpointWriter<S> {
    pub fn with_store(
        save_folder: impl Into<PathBuf>,
        checkpoint_interval: usize,
        store: S,
    ) -> Result<Self, ConfigError> {
        if checkpoint_interval == 0 {
            return Err(ConfigError::ZeroCheckpointInterval);
        }

        Ok(Self {
            save_folder: save_folder.into(),
            checkpoint_interval,
            extension: DEFAULT_EXTENSION.to_string(),
            history: MetricHistory::default(),
            store,
        })
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = normalize_extension(&extension.into()).to_string();
        self
    }

    pub fn with_history(mut self, history: MetricHistory) -> Self {
        self.history = history;
        self
    }

    pub fn checkpoint_interval(&self) -> usize {
        self.checkpoint_interval
    }

    /// Whether a checkpoint is due after zero-based batch `batch`
    pub fn is_due(&self, batch: usize) -> bool {
        (batch + 1) % self.checkpoint_interval == 0
    }
}

impl<S: CheckpointStore> Observer for BatchCheckpointWriter<S> {
    fn on_epoch_end(&mut self, event: &EpochEnd<'_>) -> Result<()> {
        let metrics = event.metrics;
        self.history.push(metrics.avg_loss, metrics.wer, metrics.cer);
        Ok(())
    }

    fn on_batch_end(&mut self, event: &BatchEnd<'_>) -> Result<()> {
        if !self.is_due(event.batch) {
            return Ok(());
        }

        let path = batch_checkpoint_path(
            &self.save_folder,
            event.epoch + 1,
            event.batch + 1,
            &self.extension,
        );
        tracing::info!(
            path = ?path,
            epoch = event.epoch + 1,
            batch = event.batch + 1,
            avg_loss = event.avg_loss,
            "Saving checkpoint"
        );

        let state =
            TrainingState::capture(event.model, event.optimizer, event.epoch, self.history.clone())
                .at_batch(event.batch, event.avg_loss);
        self.store.write(&path, &state.to_bytes()?)?;

        Ok(())
    }
}
