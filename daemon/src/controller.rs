//! Sampling and decision loop

use crate::collector::{render_table, Sampler};
use crate::config::{priority_name, Config};
use crate::console::Console;
use crate::executor::CommandRunner;
use crate::interactive::{offer_kill, KillOutcome};
use crate::load::{normalized_usage, online_cores, resolve_cores};
use crate::notifier;
use crate::profile::{apply_profile, priority_running, select_profile, Profile, Thresholds};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// What a single pass of the loop saw and did.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub records: usize,
    pub usage: f64,
    pub priority_running: bool,
    pub profile: Profile,
    pub applied: bool,
    /// `None` when the kill prompt is disabled or failed to read input.
    pub kill: Option<KillOutcome>,
}

pub struct Controller<R, C> {
    config: Config,
    runner: R,
    console: C,
    sampler: Sampler,
    thresholds: Thresholds,
    priority: Option<String>,
    last_profile: Option<Profile>,
}

impl<R, C> Controller<R, C>
where
    R: CommandRunner,
    C: Console,
{
    pub fn new(config: Config, runner: R, console: C, priority: Option<String>) -> Self {
        let sampler = Sampler::from_config(&config.sampling);
        let thresholds = Thresholds::from(&config.profiles);
        let priority = priority.as_deref().and_then(priority_name);
        Self {
            config,
            runner,
            console,
            sampler,
            thresholds,
            priority,
            last_profile: None,
        }
    }

    pub fn priority(&self) -> Option<&str> {
        self.priority.as_deref()
    }

    pub fn last_profile(&self) -> Option<Profile> {
        self.last_profile
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub async fn run_cycle(&mut self) -> CycleReport {
        let records = self.sampler.sample(&self.runner).await;
        self.console.say(&render_table(&records));

        let cores = resolve_cores(online_cores());
        let usage = normalized_usage(&records, cores);
        self.console
            .say(&format!("Total CPU Usage (normalized): {usage:.2}%"));

        let priority_running = priority_running(&records, self.priority.as_deref());
        if priority_running {
            info!("Priority process {:?} is running", self.priority);
        }
        let profile = select_profile(usage, priority_running, &self.thresholds);
        let applied = apply_profile(&self.runner, profile).await.is_ok();
        if applied {
            if self.last_profile != Some(profile) && self.config.general.notify_on_change {
                notifier::profile_changed(self.last_profile, profile, usage);
            }
            self.last_profile = Some(profile);
        }

        let kill = if self.config.general.kill_prompt {
            let limit = self.config.general.kill_prompt_timeout();
            match offer_kill(&mut self.console, &self.runner, limit).await {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    warn!("Kill prompt failed: {}", e);
                    self.console.discard_pending();
                    None
                }
            }
        } else {
            None
        };

        CycleReport {
            records: records.len(),
            usage,
            priority_running,
            profile,
            applied,
            kill,
        }
    }

    /// Repeats cycles separated by the configured idle period until
    /// `shutdown` resolves.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let idle = self.config.general.cycle_interval();
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, leaving control loop");
                    return;
                }
                _ = self.cycle_then_idle(idle) => {}
            }
        }
    }

    async fn cycle_then_idle(&mut self, idle: Duration) {
        self.run_cycle().await;
        self.console
            .say(&format!("Sleeping for {} before next update...\n", describe(idle)));
        tokio::time::sleep(idle).await;
    }
}

fn describe(period: Duration) -> String {
    let secs = period.as_secs();
    match secs {
        60 => "1 minute".to_string(),
        s if s >= 60 && s % 60 == 0 => format!("{} minutes", s / 60),
        1 => "1 second".to_string(),
        s => format!("{s} seconds"),
    }
}
