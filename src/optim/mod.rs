// Optimizer and model interfaces
// The narrow view of the training collaborators that schedules and observers need

mod params;

pub use params::{Model, NamedParameter, Optimizer, ParamGroup};
