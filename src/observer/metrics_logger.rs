// Metrics logger observer
// Records epoch averages and, optionally, parameter/gradient distributions

use anyhow::Result;

use crate::metrics::MetricsSink;

use super::{EpochEnd, Observer};

pub const TAG_LOSS: &str = "Avg Train Loss";
pub const TAG_WER: &str = "Avg WER";
pub const TAG_CER: &str = "Avg CER";

/// Writes epoch metrics to an injected sink
///
/// Metrics are written at step `epoch + 1`. Parameter histograms use the
/// parameter name with `.` replaced by `/`, and gradients get a `/grad`
/// suffix.
pub struct MetricsLogger<S> {
    id: String,
    log_params: bool,
    sink: S,
}

impl<S: MetricsSink> MetricsLogger<S> {
    pub fn new(id: impl Into<String>, sink: S, log_params: bool) -> Self {
        Self {
            id: id.into(),
            log_params,
            sink,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: MetricsSink> Observer for MetricsLogger<S> {
    fn on_epoch_end(&mut self, event: &EpochEnd<'_>) -> Result<()> {
        let step = event.epoch + 1;
        tracing::info!(run = %self.id, epoch = step, "Updating metrics");

        let values = [
            (TAG_LOSS, event.metrics.avg_loss),
            (TAG_WER, event.metrics.wer),
            (TAG_CER, event.metrics.cer),
        ];
        self.sink.add_scalars(&self.id, &values, step)?;

        if self.log_params {
            for param in event.model.named_parameters() {
                tracing::debug!(param = %param.name, "Logging parameter histogram");
                let tag = param.name.replace('.', "/");
                self.sink.add_histogram(&tag, &param.value, step)?;
                if let Some(grad) = &param.grad {
                    self.sink.add_histogram(&format!("{}/grad", tag), grad, step)?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::EpochMetrics;
    use crate::optim::{NamedParameter, ParamGroup};

    #[derive(Default)]
    struct MemorySink {
        scalars: Vec<(String, String, f64, usize)>,
        histograms: Vec<(String, usize, usize)>,
    }

    impl MetricsSink for MemorySink {
        fn add_scalars(&mut self, main_tag: &str, values: &[(&str, f64)], step: usize) -> Result<()> {
            for (tag, value) in values {
                self.scalars
                    .push((main_tag.to_string(), tag.to_string(), *value, step));
            }
            Ok(())
        }

        fn add_histogram(&mut self, tag: &str, values: &[f32], step: usize) -> Result<()> {
            self.histograms.push((tag.to_string(), values.len(), step));
            Ok(())
        }
    }

    fn model() -> Vec<NamedParameter> {
        vec![
            NamedParameter::new("conv.0.weight", vec![0.1, 0.2, 0.3]).with_grad(vec![0.0; 3]),
            NamedParameter::new("fc.bias", vec![0.5]),
        ]
    }

    fn epoch_end<'a>(model: &'a Vec<NamedParameter>, optimizer: &'a Vec<ParamGroup>) -> EpochEnd<'a> {
        EpochEnd {
            model,
            optimizer,
            epoch: 4,
            metrics: EpochMetrics { avg_loss: 12.5, wer: 33.0, cer: 11.0 },
        }
    }

    #[test]
    fn test_scalars_at_one_based_step() {
        let model = model();
        let optimizer = vec![ParamGroup::new(0.01, 0.9)];
        let mut logger = MetricsLogger::new("deepspeech", MemorySink::default(), false);

        logger.on_epoch_end(&epoch_end(&model, &optimizer)).unwrap();

        let sink = logger.into_sink();
        assert_eq!(sink.scalars.len(), 3);
        assert_eq!(
            sink.scalars[0],
            ("deepspeech".to_string(), TAG_LOSS.to_string(), 12.5, 5)
        );
        assert_eq!(sink.scalars[2].1, TAG_CER);
        assert!(sink.histograms.is_empty());
    }

    #[test]
    fn test_parameter_histograms() {
        let model = model();
        let optimizer = vec![ParamGroup::new(0.01, 0.9)];
        let mut logger = MetricsLogger::new("run", MemorySink::default(), true);

        logger.on_epoch_end(&epoch_end(&model, &optimizer)).unwrap();

        let tags: Vec<&str> = logger.sink().histograms.iter().map(|h| h.0.as_str()).collect();
        assert_eq!(tags, vec!["conv/0/weight", "conv/0/weight/grad", "fc/bias"]);
        assert!(logger.sink().histograms.iter().all(|h| h.2 == 5));
    }
}
