// Schedule driver
// Advances the learning-rate and momentum sequences once per epoch and writes
// the produced values into the optimizer's parameter groups

use crate::optim::Optimizer;

use super::composite::Composite;

/// Values applied by one call to [`HyperparamSchedule::step`]
///
/// `None` means the sequence was absent or exhausted and the field was left
/// untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepUpdate {
    pub lr: Option<f64>,
    pub momentum: Option<f64>,
}

impl StepUpdate {
    pub fn is_noop(&self) -> bool {
        self.lr.is_none() && self.momentum.is_none()
    }
}

/// A learning-rate sequence and an optional momentum sequence
///
/// Created at training start, stepped once per epoch, dropped at the end.
/// Stepping past the end is allowed and leaves the optimizer unchanged.
#[derive(Debug, Clone)]
pub struct HyperparamSchedule {
    lr: Option<Composite>,
    momentum: Option<Composite>,
    steps_taken: usize,
}

impl HyperparamSchedule {
    pub fn new(lr: Option<Composite>, momentum: Option<Composite>) -> Self {
        Self {
            lr,
            momentum,
            steps_taken: 0,
        }
    }

    /// Advance both sequences without touching an optimizer
    pub fn next_update(&mut self) -> StepUpdate {
        let update = StepUpdate {
            lr: self.lr.as_mut().and_then(|lr| lr.next()),
            momentum: self.momentum.as_mut().and_then(|momentum| momentum.next()),
        };
        self.steps_taken += 1;
        update
    }

    /// Advance the schedule and apply the new values to every parameter group
    pub fn step(&mut self, optimizer: &mut dyn Optimizer) -> StepUpdate {
        let update = self.next_update();

        if update.is_noop() {
            tracing::debug!(step = self.steps_taken, "Schedule exhausted, keeping hyperparameters");
            return update;
        }

        tracing::info!(
            step = self.steps_taken,
            lr = ?update.lr,
            momentum = ?update.momentum,
            "Changing hyperparameters"
        );

        for (index, group) in optimizer.param_groups_mut().iter_mut().enumerate() {
            tracing::debug!(
                group = index,
                previous_lr = group.lr,
                previous_momentum = group.momentum,
                "Previous hyperparameters"
            );

            if let Some(lr) = update.lr {
                group.lr = lr;
            }
            if let Some(momentum) = update.momentum {
                group.momentum = momentum;
            }
        }

        update
    }

    /// Number of `step` calls made so far (including no-op calls)
    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    /// Learning-rate values not yet produced
    pub fn remaining_lr(&self) -> usize {
        self.lr.as_ref().map_or(0, |seq| seq.len())
    }

    /// Momentum values not yet produced
    pub fn remaining_momentum(&self) -> usize {
        self.momentum.as_ref().map_or(0, |seq| seq.len())
    }

    pub fn has_momentum(&self) -> bool {
        self.momentum.is_some()
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_lr() == 0 && self.remaining_momentum() == 0
    }

    /// Drain the remaining schedule into per-epoch updates
    pub fn into_updates(mut self) -> Vec<StepUpdate> {
        let mut updates = Vec::with_capacity(self.remaining_lr().max(self.remaining_momentum()));
        while !self.is_exhausted() {
            updates.push(self.next_update());
        }
        updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optim::ParamGroup;
    use crate::schedule::decay::{constant, linear_decay};

    fn schedule() -> HyperparamSchedule {
        HyperparamSchedule::new(
            Some(Composite::new().then(linear_decay(0.1, 0.3, 3))),
            Some(Composite::new().then(constant(0.9, 2))),
        )
    }

    #[test]
    fn test_step_updates_every_group() {
        let mut groups = vec![ParamGroup::new(1.0, 0.0), ParamGroup::new(2.0, 0.0)];
        let mut schedule = schedule();

        let update = schedule.step(&mut groups);

        assert_eq!(update.lr, Some(0.1));
        assert_eq!(update.momentum, Some(0.9));
        for group in &groups {
            assert_eq!(group.lr, 0.1);
            assert_eq!(group.momentum, 0.9);
        }
    }

    #[test]
    fn test_sequences_exhaust_independently() {
        let mut groups = vec![ParamGroup::new(1.0, 0.5)];
        let mut schedule = schedule();

        schedule.step(&mut groups);
        schedule.step(&mut groups);
        groups[0].momentum = 0.42;

        // Momentum ran out after two steps; lr still has one value
        let update = schedule.step(&mut groups);
        assert!(update.lr.is_some());
        assert_eq!(update.momentum, None);
        assert_eq!(groups[0].momentum, 0.42);
    }

    #[test]
    fn test_stepping_past_end_is_noop() {
        let mut groups = vec![ParamGroup::new(1.0, 0.5)];
        let mut schedule = schedule();

        for _ in 0..3 {
            schedule.step(&mut groups);
        }
        let settled = groups.clone();

        for _ in 0..5 {
            let update = schedule.step(&mut groups);
            assert!(update.is_noop());
        }
        assert_eq!(groups, settled);
        assert_eq!(schedule.steps_taken(), 8);
        assert!(schedule.is_exhausted());
    }

    #[test]
    fn test_absent_momentum_is_left_alone() {
        let mut groups = vec![ParamGroup::new(1.0, 0.77)];
        let mut schedule =
            HyperparamSchedule::new(Some(Composite::new().then(constant(0.01, 1))), None);

        let update = schedule.step(&mut groups);

        assert_eq!(update.momentum, None);
        assert_eq!(groups[0].lr, 0.01);
        assert_eq!(groups[0].momentum, 0.77);
        assert!(!schedule.has_momentum());
    }

    #[test]
    fn test_into_updates_drains_longest_sequence() {
        let updates = schedule().into_updates();
        assert_eq!(updates.len(), 3);
        assert_eq!(updates[2].momentum, None);
    }
}
