use anyhow::{Context, Result};
use csv::ReaderBuilder;
use log::{debug, error};
use std::{fs::File, io::Read, path::Path};

/// Requests per second of one application, one sample per second.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkloadTrace {
    pub label: String,
    pub rps: Vec<f64>,
}

impl WorkloadTrace {
    /// Reads a headerless trace whose first column is the number of
    /// requests of each second. Keeps `duration` samples starting at
    /// `initial_hour`.
    pub fn from_reader<R: Read>(
        label: &str,
        reader: R,
        initial_hour: u32,
        duration: usize,
    ) -> Result<WorkloadTrace> {
        let skip = initial_hour as usize * 3600;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut rps = Vec::with_capacity(duration);
        for (row, result) in reader.records().enumerate().skip(skip).take(duration) {
            let record = result.map_err(|e| {
                let reason = format!("error reading trace (label={label}, row={row}, error={e})");
                error!("{reason}");
                anyhow::anyhow!(reason)
            })?;
            let value = record.get(0).unwrap_or_default().trim();
            rps.push(value.parse::<f64>().map_err(|e| {
                let reason =
                    format!("invalid trace sample (label={label}, row={row}, value={value}, error={e})");
                error!("{reason}");
                anyhow::anyhow!(reason)
            })?);
        }

        if rps.len() < duration {
            debug!(
                "trace {label} shorter than requested ({} < {duration} samples)",
                rps.len()
            );
        }

        Ok(WorkloadTrace {
            label: label.to_string(),
            rps,
        })
    }

    pub fn from_path(
        label: &str,
        path: &Path,
        initial_hour: u32,
        duration: usize,
    ) -> Result<WorkloadTrace> {
        let file = File::open(path)
            .with_context(|| format!("error opening trace (path={})", path.display()))?;
        Self::from_reader(label, file, initial_hour, duration)
    }

    pub fn max_rps(&self) -> f64 {
        self.rps.iter().copied().fold(0.0, f64::max)
    }
}
