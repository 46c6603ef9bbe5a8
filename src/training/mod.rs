// Training module - checkpoint documents, storage and discovery

pub mod checkpoint;

pub use checkpoint::{
    batch_checkpoint_path, epoch_checkpoint_path, latest_checkpoint, load_checkpoint,
    normalize_extension,
    CheckpointStore, FsCheckpointStore, MetricHistory, TrainingState, FORMAT_VERSION,
};
