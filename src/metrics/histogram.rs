// Histogram summaries for parameter and gradient values

use serde::{Deserialize, Serialize};

/// Number of equal-width buckets between min and max
const BUCKETS: usize = 30;

/// Compact description of a value distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
    /// Bucket counts over [min, max]; empty when there are no finite values
    pub buckets: Vec<usize>,
}

impl HistogramSummary {
    /// Summarize the finite values in `values`; NaN and infinities are dropped
    pub fn from_values(values: &[f32]) -> Self {
        let finite: Vec<f64> = values
            .iter()
            .map(|&v| v as f64)
            .filter(|v| v.is_finite())
            .collect();

        if finite.is_empty() {
            return Self {
                count: 0,
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                std: 0.0,
                buckets: Vec::new(),
            };
        }

        let count = finite.len();
        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = finite.iter().sum::<f64>() / count as f64;
        let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

        let mut buckets = vec![0; BUCKETS];
        let width = (max - min) / BUCKETS as f64;
        for v in &finite {
            let index = if width > 0.0 {
                (((v - min) / width) as usize).min(BUCKETS - 1)
            } else {
                0
            };
            buckets[index] += 1;
        }

        Self {
            count,
            min,
            max,
            mean,
            std: variance.sqrt(),
            buckets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_statistics() {
        let summary = HistogramSummary::from_values(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(summary.count, 4);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 4.0);
        assert!((summary.mean - 2.5).abs() < 1e-12);
        assert!((summary.std - 1.25f64.sqrt()).abs() < 1e-12);
        assert_eq!(summary.buckets.iter().sum::<usize>(), 4);
        assert_eq!(summary.buckets[0], 1);
        assert_eq!(summary.buckets[BUCKETS - 1], 1);
    }

    #[test]
    fn test_constant_values_share_one_bucket() {
        let summary = HistogramSummary::from_values(&[0.5; 7]);
        assert_eq!(summary.buckets[0], 7);
        assert_eq!(summary.std, 0.0);
    }

    #[test]
    fn test_non_finite_values_dropped() {
        let summary = HistogramSummary::from_values(&[f32::NAN, f32::INFINITY]);
        assert_eq!(summary.count, 0);
        assert!(summary.buckets.is_empty());

        let summary = HistogramSummary::from_values(&[f32::NAN, 1.0]);
        assert_eq!(summary.count, 1);
    }
}
