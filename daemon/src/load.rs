//! CPU load aggregation

use crate::collector::ProcessRecord;
use tracing::warn;

pub fn total_cpu(records: &[ProcessRecord]) -> f64 {
    records.iter().map(|r| r.cpu_usage).sum()
}

/// Sum of per-process CPU percentages divided by the core count.
///
/// Not capped at 100: a busy multi-threaded process can push it past that.
pub fn normalized_usage(records: &[ProcessRecord], cores: usize) -> f64 {
    total_cpu(records) / cores.max(1) as f64
}

/// Logical CPUs currently online, or `None` if the OS will not say.
pub fn online_cores() -> Option<usize> {
    let n = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    (n > 0).then_some(n as usize)
}

pub fn resolve_cores(detected: Option<usize>) -> usize {
    match detected {
        Some(n) if n > 0 => n,
        _ => {
            warn!("Error retrieving CPU core count, defaulting to 1 core");
            1
        }
    }
}
