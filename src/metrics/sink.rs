// Metrics sinks
// Observers write scalars and histograms here, keyed by tag and step

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use super::types::MetricRecord;

/// Destination for training metrics
pub trait MetricsSink {
    /// Write several scalars grouped under `main_tag` at one step
    fn add_scalars(&mut self, main_tag: &str, values: &[(&str, f64)], step: usize) -> Result<()>;

    /// Write the distribution of `values` under `tag` at `step`
    fn add_histogram(&mut self, tag: &str, values: &[f32], step: usize) -> Result<()>;
}

/// Appends one JSON record per line to `{log_dir}/{id}.jsonl`
pub struct JsonlMetricsSink {
    path: PathBuf,
    file: File,
}

impl JsonlMetricsSink {
    /// Open (or create) the log for run `id`, creating `log_dir` if needed
    pub fn new(log_dir: &Path, id: &str) -> Result<Self> {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create metrics directory: {:?}", log_dir))?;

        let path = log_dir.join(format!("{}.jsonl", id));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open metrics log: {:?}", path))?;

        tracing::debug!(path = ?path, "Opened metrics log");

        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&mut self, record: &MetricRecord) -> Result<()> {
        let line = serde_json::to_string(record).context("Failed to serialize metric record")?;
        writeln!(self.file, "{}", line)
            .with_context(|| format!("Failed to write metrics log: {:?}", self.path))?;
        Ok(())
    }
}

impl MetricsSink for JsonlMetricsSink {
    fn add_scalars(&mut self, main_tag: &str, values: &[(&str, f64)], step: usize) -> Result<()> {
        for (tag, value) in values {
            self.append(&MetricRecord::scalar(main_tag, tag, *value, step))?;
        }
        self.file.flush().context("Failed to flush metrics log")?;
        Ok(())
    }

    fn add_histogram(&mut self, tag: &str, values: &[f32], step: usize) -> Result<()> {
        self.append(&MetricRecord::histogram(tag, values, step))?;
        self.file.flush().context("Failed to flush metrics log")?;
        Ok(())
    }
}

/// Read back every record of a metrics log
pub fn read_records(path: &Path) -> Result<Vec<MetricRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open metrics log: {:?}", path))?;

    let mut records = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read metrics log: {:?}", path))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .with_context(|| format!("Invalid metric record at {:?}:{}", path, line_no + 1))?;
        records.push(record);
    }

    Ok(records)
}
