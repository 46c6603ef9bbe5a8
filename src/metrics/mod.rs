// Metrics module
// Sinks for scalar and histogram metrics written by training observers

mod histogram;
mod sink;
mod types;

pub use histogram::HistogramSummary;
pub use sink::{read_records, JsonlMetricsSink, MetricsSink};
pub use types::MetricRecord;
