//! Process snapshot collector (runs the exporter, reads its CSV)

pub mod snapshot;

use crate::config::SamplingConfig;
use crate::executor::CommandRunner;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// One row of the exporter's snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRecord {
    pub date: String,
    pub pid: String,
    pub name: String,
    pub mem_usage: String,
    pub cpu_usage: f64,
}

pub struct Sampler {
    csv_path: PathBuf,
    settle_delay: Duration,
}

impl Sampler {
    pub fn new(csv_path: impl Into<PathBuf>, settle_delay: Duration) -> Self {
        Self {
            csv_path: csv_path.into(),
            settle_delay,
        }
    }

    pub fn from_config(config: &SamplingConfig) -> Self {
        Self::new(config.csv_path.clone(), config.settle_delay())
    }

    /// Runs the exporter, waits out the settle delay, then reads the snapshot.
    ///
    /// The delay is applied even if the exporter failed; readiness of the file
    /// is never checked.
    pub async fn sample<R>(&self, runner: &R) -> Vec<ProcessRecord>
    where
        R: CommandRunner + ?Sized,
    {
        info!("Running exporter to collect process data");
        if let Err(e) = runner.run_exporter().await {
            warn!("Exporter did not finish cleanly: {}", e);
        }

        tokio::time::sleep(self.settle_delay).await;

        info!("Reading {:?} to determine CPU usage", self.csv_path);
        snapshot::read_snapshot(&self.csv_path)
    }
}

const BORDER: &str = "---------------------------------------------";

/// Formats records the way they are echoed to the console after each sample.
pub fn render_table(records: &[ProcessRecord]) -> String {
    let mut out = String::new();
    out.push_str("\n----- Process Details from snapshot -----\n");
    out.push_str("Date\t\tPID\tProcess Name\tMemory Usage\tCPU Usage\n");
    for r in records {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}%",
            r.date, r.pid, r.name, r.mem_usage, r.cpu_usage
        );
    }
    out.push_str(BORDER);
    out
}
