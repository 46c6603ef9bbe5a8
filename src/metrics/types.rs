// Metrics data types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::histogram::HistogramSummary;

/// One line of a metrics log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricRecord {
    Scalar {
        timestamp: DateTime<Utc>,
        /// Run identifier the scalar is grouped under
        main_tag: String,
        tag: String,
        #[serde(with = "crate::nonfinite::float64")]
        value: f64,
        step: usize,
    },
    Histogram {
        timestamp: DateTime<Utc>,
        tag: String,
        step: usize,
        summary: HistogramSummary,
    },
}

impl MetricRecord {
    pub fn scalar(main_tag: &str, tag: &str, value: f64, step: usize) -> Self {
        MetricRecord::Scalar {
            timestamp: Utc::now(),
            main_tag: main_tag.to_string(),
            tag: tag.to_string(),
            value,
            step,
        }
    }

    pub fn histogram(tag: &str, values: &[f32], step: usize) -> Self {
        MetricRecord::Histogram {
            timestamp: Utc::now(),
            tag: tag.to_string(),
            step,
            summary: HistogramSummary::from_values(values),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            MetricRecord::Scalar { tag, .. } | MetricRecord::Histogram { tag, .. } => tag,
        }
    }

    pub fn step(&self) -> usize {
        match self {
            MetricRecord::Scalar { step, .. } | MetricRecord::Histogram { step, .. } => *step,
        }
    }
}
