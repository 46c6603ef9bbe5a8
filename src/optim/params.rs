// Parameter groups and named parameters

use serde::{Deserialize, Serialize};

/// Hyperparameters shared by one group of model parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamGroup {
    /// Learning rate
    #[serde(with = "crate::nonfinite::float64")]
    pub lr: f64,
    /// Momentum (or beta1 for Adam-style optimizers)
    #[serde(with = "crate::nonfinite::float64")]
    pub momentum: f64,
}

impl ParamGroup {
    pub fn new(lr: f64, momentum: f64) -> Self {
        Self { lr, momentum }
    }
}

/// Optimizer whose hyperparameters are mutated in place by a schedule
pub trait Optimizer {
    /// Parameter groups (read-only, used for checkpoints and logging)
    fn param_groups(&self) -> &[ParamGroup];

    /// Parameter groups (mutable, used by schedules)
    fn param_groups_mut(&mut self) -> &mut [ParamGroup];
}

/// A plain list of groups is already an optimizer as far as schedules care
impl Optimizer for Vec<ParamGroup> {
    fn param_groups(&self) -> &[ParamGroup] {
        self
    }

    fn param_groups_mut(&mut self) -> &mut [ParamGroup] {
        self
    }
}

/// A flattened model parameter with its optional gradient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedParameter {
    /// Dotted parameter path, e.g. "rnns.0.weight"
    pub name: String,
    /// Parameter values
    #[serde(with = "crate::nonfinite::vec_float32")]
    pub value: Vec<f32>,
    /// Gradient from the last backward pass, if any
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::nonfinite::option_vec_float32"
    )]
    pub grad: Option<Vec<f32>>,
}

impl NamedParameter {
    pub fn new(name: impl Into<String>, value: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            value,
            grad: None,
        }
    }

    pub fn with_grad(mut self, grad: Vec<f32>) -> Self {
        self.grad = Some(grad);
        self
    }
}

/// Model exposing its named parameters
pub trait Model {
    fn named_parameters(&self) -> Vec<NamedParameter>;
}

impl Model for Vec<NamedParameter> {
    fn named_parameters(&self) -> Vec<NamedParameter> {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_optimizer_mutation() {
        let mut groups = vec![ParamGroup::new(0.1, 0.9), ParamGroup::new(0.2, 0.8)];

        for group in groups.param_groups_mut() {
            group.lr = 0.5;
        }

        assert!(groups.param_groups().iter().all(|g| g.lr == 0.5));
        assert_eq!(groups.param_groups()[1].momentum, 0.8);
    }

    #[test]
    fn test_named_parameter_grad_is_skipped_when_absent() {
        let param = NamedParameter::new("fc.weight", vec![1.0, 2.0]);
        let json = serde_json::to_string(&param).unwrap();
        assert!(!json.contains("grad"));

        let with_grad = param.with_grad(vec![0.1, 0.2]);
        let json = serde_json::to_string(&with_grad).unwrap();
        let back: NamedParameter = serde_json::from_str(&json).unwrap();
        assert_eq!(back.grad, Some(vec![0.1, 0.2]));
    }
}
