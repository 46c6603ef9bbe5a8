// onecycle - learning-rate/momentum schedules and training-loop observers
// Library exports

pub mod config;
pub mod errors;
pub mod metrics;
mod nonfinite; // NaN/inf-safe float serialization
pub mod observer; // Epoch/batch notification sinks
pub mod optim; // Optimizer and model interfaces
pub mod schedule; // One-cycle and anneal schedules
pub mod training; // Checkpoint documents and storage

pub use errors::ConfigError;
pub use observer::{Observer, ObserverSet};
pub use optim::{Model, NamedParameter, Optimizer, ParamGroup};
pub use schedule::{HyperparamSchedule, OneCycle, SchedulePolicy, StepUpdate};
