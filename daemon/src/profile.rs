//! Power profile selection

use crate::collector::ProcessRecord;
use crate::config::ProfileConfig;
use crate::executor::{CommandError, CommandRunner};
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Powersave,
    Balanced,
    LatencyPerformance,
}

impl Profile {
    pub fn name(self) -> &'static str {
        match self {
            Profile::Powersave => "powersave",
            Profile::Balanced => "balanced",
            Profile::LatencyPerformance => "latency-performance",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Upper bounds (exclusive) on normalized usage for the two low tiers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub powersave_below: f64,
    pub balanced_below: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            powersave_below: 20.0,
            balanced_below: 50.0,
        }
    }
}

impl From<&ProfileConfig> for Thresholds {
    fn from(config: &ProfileConfig) -> Self {
        Self {
            powersave_below: config.powersave_below,
            balanced_below: config.balanced_below,
        }
    }
}

/// Exact, case-sensitive match on the process name.
pub fn priority_running(records: &[ProcessRecord], priority: Option<&str>) -> bool {
    match priority {
        Some(wanted) => records.iter().any(|r| r.name == wanted),
        None => false,
    }
}

pub fn select_profile(usage: f64, priority_running: bool, thresholds: &Thresholds) -> Profile {
    if priority_running {
        Profile::LatencyPerformance
    } else if usage < thresholds.powersave_below {
        Profile::Powersave
    } else if usage < thresholds.balanced_below {
        Profile::Balanced
    } else {
        Profile::LatencyPerformance
    }
}

pub async fn apply_profile<R>(runner: &R, profile: Profile) -> Result<(), CommandError>
where
    R: CommandRunner + ?Sized,
{
    info!("Adjusting power profile to: {}", profile);
    runner.apply_profile(profile.name()).await.inspect_err(|e| {
        warn!(
            "Failed to set power profile {}: {}. Check permissions or environment variables.",
            profile, e
        );
    })
}
