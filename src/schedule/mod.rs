// Hyperparameter schedules
// Decay segments, their concatenation, the one-cycle and anneal policies,
// and the driver that applies them to an optimizer once per epoch

mod composite;
mod decay;
mod driver;
mod policy;

pub use composite::{Composite, Segment};
pub use decay::{constant, div_decay, linear_decay, DivDecay, LinearDecay};
pub use driver::{HyperparamSchedule, StepUpdate};
pub use policy::{Anneal, OneCycle, SchedulePolicy};
