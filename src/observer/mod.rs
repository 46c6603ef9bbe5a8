// Training observers
// Notification sinks called by the training loop at epoch and batch boundaries

mod checkpoint;
mod metrics_logger;

use anyhow::Result;
use std::fmt;

use crate::optim::{Model, Optimizer};

pub use checkpoint::{BatchCheckpointWriter, EpochCheckpointWriter};
pub use metrics_logger::{MetricsLogger, TAG_CER, TAG_LOSS, TAG_WER};

/// Averages accumulated over one epoch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochMetrics {
    pub avg_loss: f64,
    /// Word error rate
    pub wer: f64,
    /// Character error rate
    pub cer: f64,
}

/// Sent before the first batch of an epoch
#[derive(Clone, Copy)]
pub struct EpochStart<'a> {
    pub model: &'a dyn Model,
    pub optimizer: &'a dyn Optimizer,
    pub epoch: usize,
}

/// Sent after the last batch of an epoch
#[derive(Clone, Copy)]
pub struct EpochEnd<'a> {
    pub model: &'a dyn Model,
    pub optimizer: &'a dyn Optimizer,
    pub epoch: usize,
    pub metrics: EpochMetrics,
}

/// Sent before each batch
#[derive(Clone, Copy)]
pub struct BatchStart<'a> {
    pub model: &'a dyn Model,
    pub optimizer: &'a dyn Optimizer,
    pub epoch: usize,
    pub batch: usize,
}

/// Sent after each batch
#[derive(Clone, Copy)]
pub struct BatchEnd<'a> {
    pub model: &'a dyn Model,
    pub optimizer: &'a dyn Optimizer,
    pub epoch: usize,
    pub batch: usize,
    /// Running average loss over the epoch so far
    pub avg_loss: f64,
}

// Model and optimizer are trait objects without Debug, so only the
// indices and metrics are shown

impl fmt::Debug for EpochStart<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EpochStart")
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for EpochEnd<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EpochEnd")
            .field("epoch", &self.epoch)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for BatchStart<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchStart")
            .field("epoch", &self.epoch)
            .field("batch", &self.batch)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for BatchEnd<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchEnd")
            .field("epoch", &self.epoch)
            .field("batch", &self.batch)
            .field("avg_loss", &self.avg_loss)
            .finish_non_exhaustive()
    }
}

/// Reacts to training progress; every hook defaults to doing nothing
///
/// Epoch and batch indices are zero-based. An error aborts the current
/// notification and is returned to the training loop.
pub trait Observer {
    fn on_epoch_start(&mut self, _event: &EpochStart<'_>) -> Result<()> {
        Ok(())
    }

    fn on_epoch_end(&mut self, _event: &EpochEnd<'_>) -> Result<()> {
        Ok(())
    }

    fn on_batch_start(&mut self, _event: &BatchStart<'_>) -> Result<()> {
        Ok(())
    }

    fn on_batch_end(&mut self, _event: &BatchEnd<'_>) -> Result<()> {
        Ok(())
    }
}

/// Fans notifications out to several observers in registration order
#[derive(Default)]
pub struct ObserverSet {
    observers: Vec<Box<dyn Observer>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, observer: impl Observer + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn with(mut self, observer: impl Observer + 'static) -> Self {
        self.push(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl Observer for ObserverSet {
    fn on_epoch_start(&mut self, event: &EpochStart<'_>) -> Result<()> {
        self.observers.iter_mut().try_for_each(|o| o.on_epoch_start(event))
    }

    fn on_epoch_end(&mut self, event: &EpochEnd<'_>) -> Result<()> {
        self.observers.iter_mut().try_for_each(|o| o.on_epoch_end(event))
    }

    fn on_batch_start(&mut self, event: &BatchStart<'_>) -> Result<()> {
        self.observers.iter_mut().try_for_each(|o| o.on_batch_start(event))
    }

    fn on_batch_end(&mut self, event: &BatchEnd<'_>) -> Result<()> {
        self.observers.iter_mut().try_for_each(|o| o.on_batch_end(event))
    }
}
