// Schedule policies
// One-cycle (ramp up, ramp down, anneal) and plain exponential anneal

use serde::{Deserialize, Serialize};

use crate::errors::{ensure_finite, ensure_positive, ConfigError};

use super::composite::Composite;
use super::decay::{constant, div_decay, linear_decay};
use super::driver::HyperparamSchedule;

/// One-cycle policy
///
/// The first `1 - anneal_pct` of training is split into two equal halves:
/// learning rate ramps `lr_from -> lr_to -> lr_from` while momentum moves
/// `momentum_from -> momentum_to -> momentum_from`. The remaining epochs
/// divide the learning rate by `anneal_rate` each epoch and hold momentum at
/// `momentum_from`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneCycle {
    pub epochs: usize,
    pub lr_from: f64,
    pub lr_to: f64,
    pub momentum_from: f64,
    pub momentum_to: f64,
    /// Fraction of epochs reserved for the final anneal
    pub anneal_pct: f64,
    /// Divisor applied to the learning rate per annealing epoch
    pub anneal_rate: f64,
}

impl OneCycle {
    /// Length of each half of the cycle
    ///
    /// `anneal_pct` is clamped into `[0, 1]` (NaN counts as 1), so the two
    /// halves never exceed `epochs` even for a policy that fails `validate`.
    pub fn cycle_len(&self) -> usize {
        let keep = (1.0 - self.anneal_pct).clamp(0.0, 1.0);
        let len = (self.epochs as f64 * keep / 2.0).floor() as usize;
        len.min(self.epochs / 2)
    }

    /// Number of epochs left for the annealing tail
    pub fn anneal_len(&self) -> usize {
        self.epochs.saturating_sub(2 * self.cycle_len())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.epochs == 0 {
            return Err(ConfigError::ZeroEpochs);
        }
        if !(0.0..1.0).contains(&self.anneal_pct) {
            return Err(ConfigError::AnnealPctOutOfRange(self.anneal_pct));
        }
        ensure_positive("anneal_rate", self.anneal_rate)?;
        ensure_finite("lr_from", self.lr_from)?;
        ensure_finite("lr_to", self.lr_to)?;
        ensure_finite("momentum_from", self.momentum_from)?;
        ensure_finite("momentum_to", self.momentum_to)?;
        Ok(())
    }

    /// Build the schedule; both sequences hold exactly `epochs` values
    pub fn build(&self) -> HyperparamSchedule {
        let cycle_len = self.cycle_len();
        let anneal_len = self.anneal_len();

        tracing::debug!(
            epochs = self.epochs,
            cycle_len = cycle_len,
            anneal_len = anneal_len,
            "Building one-cycle schedule"
        );

        let lr = Composite::new()
            .then(linear_decay(self.lr_from, self.lr_to, cycle_len))
            .then(linear_decay(self.lr_to, self.lr_from, cycle_len))
            .then(div_decay(self.lr_from, self.anneal_rate, anneal_len));

        let momentum = Composite::new()
            .then(linear_decay(self.momentum_from, self.momentum_to, cycle_len))
            .then(linear_decay(self.momentum_to, self.momentum_from, cycle_len))
            .then(constant(self.momentum_from, anneal_len));

        HyperparamSchedule::new(Some(lr), Some(momentum))
    }
}

/// Exponential anneal: learning rate divided by `learning_anneal` each epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anneal {
    pub epochs: usize,
    pub lr: f64,
    pub learning_anneal: f64,
}

impl Anneal {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.epochs == 0 {
            return Err(ConfigError::ZeroEpochs);
        }
        ensure_finite("lr", self.lr)?;
        ensure_positive("learning_anneal", self.learning_anneal)?;
        Ok(())
    }

    /// Build the schedule; there is no momentum sequence
    pub fn build(&self) -> HyperparamSchedule {
        let lr = Composite::new().then(div_decay(self.lr, self.learning_anneal, self.epochs));
        HyperparamSchedule::new(Some(lr), None)
    }
}

/// Either policy, as it appears in configuration files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SchedulePolicy {
    OneCycle(OneCycle),
    Anneal(Anneal),
}

impl SchedulePolicy {
    pub fn epochs(&self) -> usize {
        match self {
            SchedulePolicy::OneCycle(p) => p.epochs,
            SchedulePolicy::Anneal(p) => p.epochs,
        }
    }

    /// Same policy over a different number of epochs
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        match &mut self {
            SchedulePolicy::OneCycle(p) => p.epochs = epochs,
            SchedulePolicy::Anneal(p) => p.epochs = epochs,
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            SchedulePolicy::OneCycle(p) => p.validate(),
            SchedulePolicy::Anneal(p) => p.validate(),
        }
    }

    pub fn build(&self) -> HyperparamSchedule {
        match self {
            SchedulePolicy::OneCycle(p) => p.build(),
            SchedulePolicy::Anneal(p) => p.build(),
        }
    }
}
