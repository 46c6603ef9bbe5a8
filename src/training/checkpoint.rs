// Checkpoint documents, storage and naming

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::optim::{Model, NamedParameter, Optimizer, ParamGroup};

/// Version of the checkpoint document layout
pub const FORMAT_VERSION: u32 = 1;

/// Per-epoch metric histories carried in every checkpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricHistory {
    #[serde(with = "crate::nonfinite::vec_float64")]
    pub loss: Vec<f64>,
    #[serde(with = "crate::nonfinite::vec_float64")]
    pub wer: Vec<f64>,
    #[serde(with = "crate::nonfinite::vec_float64")]
    pub cer: Vec<f64>,
}

impl MetricHistory {
    pub fn push(&mut self, loss: f64, wer: f64, cer: f64) {
        self.loss.push(loss);
        self.wer.push(wer);
        self.cer.push(cer);
    }

    /// Number of epochs recorded
    pub fn len(&self) -> usize {
        self.loss.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loss.is_empty()
    }
}

/// Everything needed to resume training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingState {
    pub format_version: u32,
    pub timestamp: DateTime<Utc>,
    /// Zero-based epoch the state was captured in
    pub epoch: usize,
    /// Zero-based batch index for mid-epoch checkpoints
    #[serde(default)]
    pub batch: Option<usize>,
    /// Running average loss at the time of a mid-epoch checkpoint
    #[serde(default, with = "crate::nonfinite::option_float64")]
    pub avg_loss: Option<f64>,
    #[serde(default)]
    pub history: MetricHistory,
    pub param_groups: Vec<ParamGroup>,
    pub parameters: Vec<NamedParameter>,
}

impl TrainingState {
    /// Capture model and optimizer state at an epoch boundary
    ///
    /// Gradients are not part of the saved state.
    pub fn capture(
        model: &dyn Model,
        optimizer: &dyn Optimizer,
        epoch: usize,
        history: MetricHistory,
    ) -> Self {
        let parameters = model
            .named_parameters()
            .into_iter()
            .map(|p| NamedParameter { grad: None, ..p })
            .collect();

        Self {
            format_version: FORMAT_VERSION,
            timestamp: Utc::now(),
            epoch,
            batch: None,
            avg_loss: None,
            history,
            param_groups: optimizer.param_groups().to_vec(),
            parameters,
        }
    }

    /// Mark the state as captured mid-epoch
    pub fn at_batch(mut self, batch: usize, avg_loss: f64) -> Self {
        self.batch = Some(batch);
        self.avg_loss = Some(avg_loss);
        self
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).context("Failed to serialize training state")
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).context("Failed to parse training state")
    }
}

/// Where serialized checkpoints go
pub trait CheckpointStore {
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()>;
}

/// Writes checkpoints to the local filesystem
///
/// Writes are plain blocking writes with no locking; two writers targeting
/// the same path will clobber each other.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsCheckpointStore;

impl CheckpointStore for FsCheckpointStore {
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create checkpoint directory: {:?}", parent))?;
        }
        fs::write(path, bytes).with_context(|| format!("Failed to write checkpoint: {:?}", path))?;
        Ok(())
    }
}

/// Extension without a leading dot, so "json" and ".json" name the same files
pub fn normalize_extension(ext: &str) -> &str {
    ext.trim_start_matches('.')
}

/// `{save_folder}/checkpoint_{epoch}.{ext}`
pub fn epoch_checkpoint_path(save_folder: &Path, epoch: usize, ext: &str) -> PathBuf {
    save_folder.join(format!("checkpoint_{}.{}", epoch, normalize_extension(ext)))
}

/// `{save_folder}/checkpoint_epoch_{epoch}_iter_{batch}.{ext}`
pub fn batch_checkpoint_path(save_folder: &Path, epoch: usize, batch: usize, ext: &str) -> PathBuf {
    save_folder.join(format!(
        "checkpoint_epoch_{}_iter_{}.{}",
        epoch,
        batch,
        normalize_extension(ext)
    ))
}

/// Read a checkpoint written by one of the checkpoint observers
pub fn load_checkpoint(path: &Path) -> Result<TrainingState> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read checkpoint: {:?}", path))?;
    let state = TrainingState::from_bytes(&bytes)
        .with_context(|| format!("Invalid checkpoint: {:?}", path))?;

    if state.format_version > FORMAT_VERSION {
        anyhow::bail!(
            "Checkpoint {:?} has format version {}, newest supported is {}",
            path,
            state.format_version,
            FORMAT_VERSION
        );
    }

    tracing::info!(
        path = ?path,
        epoch = state.epoch,
        batch = ?state.batch,
        "Loaded checkpoint"
    );

    Ok(state)
}

/// Ordering key parsed from a checkpoint file name
///
/// An epoch checkpoint is written after every batch of that epoch, so it
/// sorts after all of the epoch's batch checkpoints.
fn checkpoint_rank(file_name: &str, ext: &str) -> Option<(usize, usize)> {
    let stem = file_name
        .strip_suffix(normalize_extension(ext))?
        .strip_suffix('.')?;
    let rest = stem.strip_prefix("checkpoint_")?;

    if let Some(rest) = rest.strip_prefix("epoch_") {
        let (epoch, batch) = rest.split_once("_iter_")?;
        Some((epoch.parse().ok()?, batch.parse().ok()?))
    } else {
        Some((rest.parse().ok()?, usize::MAX))
    }
}

/// Newest checkpoint in `save_folder`, by epoch then batch number
pub fn latest_checkpoint(save_folder: &Path, ext: &str) -> Result<Option<PathBuf>> {
    if !save_folder.exists() {
        return Ok(None);
    }

    let mut best: Option<((usize, usize), PathBuf)> = None;
    for entry in fs::read_dir(save_folder)
        .with_context(|| format!("Failed to read checkpoint directory: {:?}", save_folder))?
    {
        let path = entry?.path();
        let rank = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => checkpoint_rank(name, ext),
            None => None,
        };

        if let Some(rank) = rank {
            if best.as_ref().map_or(true, |(r, _)| rank > *r) {
                best = Some((rank, path));
            }
        }
    }

    Ok(best.map(|(_, path)| path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_checkpoint_paths() {
        let folder = Path::new("/models");
        assert_eq!(
            epoch_checkpoint_path(folder, 3, "json"),
            PathBuf::from("/models/checkpoint_3.json")
        );
        assert_eq!(
            batch_checkpoint_path(folder, 2, 500, "json"),
            PathBuf::from("/models/checkpoint_epoch_2_iter_500.json")
        );
    }

    #[test]
    fn test_checkpoint_rank() {
        assert_eq!(checkpoint_rank("checkpoint_4.json", "json"), Some((4, usize::MAX)));
        assert_eq!(
            checkpoint_rank("checkpoint_epoch_4_iter_200.json", "json"),
            Some((4, 200))
        );
        assert_eq!(checkpoint_rank("checkpoint_4.bin", "json"), None);
        assert_eq!(checkpoint_rank("checkpoint_x.json", "json"), None);
        assert_eq!(checkpoint_rank("notes.json", "json"), None);
    }

    #[test]
    fn test_dotted_extension_names_same_files() {
        let folder = Path::new("/models");
        assert_eq!(
            epoch_checkpoint_path(folder, 1, ".json"),
            PathBuf::from("/models/checkpoint_1.json")
        );
        assert_eq!(
            batch_checkpoint_path(folder, 1, 100, ".json"),
            PathBuf::from("/models/checkpoint_epoch_1_iter_100.json")
        );
        assert_eq!(checkpoint_rank("checkpoint_4.json", ".json"), Some((4, usize::MAX)));
    }

    #[test]
    fn test_latest_checkpoint_with_dotted_extension() {
        let temp_dir = TempDir::new().unwrap();
        let model: Vec<NamedParameter> = Vec::new();
        let optimizer = vec![ParamGroup::new(0.01, 0.9)];
        let bytes = TrainingState::capture(&model, &optimizer, 0, MetricHistory::default())
            .to_bytes()
            .unwrap();

        FsCheckpointStore
            .write(&epoch_checkpoint_path(temp_dir.path(), 1, ".json"), &bytes)
            .unwrap();

        let latest = latest_checkpoint(temp_dir.path(), ".json").unwrap().unwrap();
        assert!(latest.ends_with("checkpoint_1.json"));
    }

    #[test]
    fn test_non_finite_metrics_round_trip() {
        let mut history = MetricHistory::default();
        history.push(f64::INFINITY, 80.0, 40.0);
        history.push(f64::NAN, f64::NAN, f64::NAN);

        let model = vec![NamedParameter::new("fc.weight", vec![f32::NAN, 1.0])];
        let optimizer = vec![ParamGroup::new(0.01, 0.9)];

        let state = TrainingState::capture(&model, &optimizer, 1, history)
            .at_batch(4, f64::NEG_INFINITY);
        let restored = TrainingState::from_bytes(&state.to_bytes().unwrap()).unwrap();

        assert_eq!(restored.history.loss[0], f64::INFINITY);
        assert!(restored.history.loss[1].is_nan());
        assert!(restored.history.cer[1].is_nan());
        assert_eq!(restored.avg_loss, Some(f64::NEG_INFINITY));
        assert!(restored.parameters[0].value[0].is_nan());
        assert_eq!(restored.parameters[0].value[1], 1.0);
    }

    #[test]
    fn test_training_state_serialization() {
        let mut history = MetricHistory::default();
        history.push(1.5, 40.0, 20.0);

        let model = vec![NamedParameter::new("fc.weight", vec![1.0, 2.0]).with_grad(vec![0.1, 0.1])];
        let optimizer = vec![ParamGroup::new(0.01, 0.9)];

        let state = TrainingState::capture(&model, &optimizer, 0, history).at_batch(9, 1.25);
        let restored = TrainingState::from_bytes(&state.to_bytes().unwrap()).unwrap();

        assert_eq!(restored, state);
        assert_eq!(restored.parameters[0].grad, None);
        assert_eq!(restored.batch, Some(9));
        assert_eq!(restored.history.len(), 1);
    }

    #[test]
    fn test_latest_checkpoint_missing_folder() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        assert_eq!(latest_checkpoint(&missing, "json").unwrap(), None);
    }

    #[test]
    fn test_load_rejects_newer_format() {
        let temp_dir = TempDir::new().unwrap();
        let model: Vec<NamedParameter> = Vec::new();
        let optimizer = vec![ParamGroup::new(0.01, 0.9)];

        let mut state = TrainingState::capture(&model, &optimizer, 0, MetricHistory::default());
        state.format_version = FORMAT_VERSION + 1;

        let path = temp_dir.path().join("checkpoint_1.json");
        FsCheckpointStore.write(&path, &state.to_bytes().unwrap()).unwrap();

        assert!(load_checkpoint(&path).is_err());
    }
}
