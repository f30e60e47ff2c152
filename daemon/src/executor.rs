//! External tool executor (exporter, profile tool, pkill)

use crate::config::Config;
use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("{program} exited with {}", describe_code(.code))]
    Status { program: String, code: Option<i32> },
    #[error("no program configured")]
    EmptyCommand,
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// The external tools the control loop depends on.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Regenerates the process snapshot CSV.
    async fn run_exporter(&self) -> Result<(), CommandError>;
    async fn apply_profile(&self, profile: &str) -> Result<(), CommandError>;
    async fn terminate_by_pattern(&self, pattern: &str) -> Result<(), CommandError>;
}

/// Runs the configured tools as child processes and waits for each to exit.
///
/// Arguments are passed as separate argv entries rather than spliced into a
/// shell string.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    exporter: Vec<String>,
    profile_command: Vec<String>,
    kill_command: Vec<String>,
}

impl SystemRunner {
    pub fn new(exporter: Vec<String>, profile_command: Vec<String>, kill_command: Vec<String>) -> Self {
        Self {
            exporter,
            profile_command,
            kill_command,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.sampling.exporter.clone(),
            config.profiles.command.clone(),
            config.kill.command.clone(),
        )
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run_exporter(&self) -> Result<(), CommandError> {
        run(&self.exporter, None).await
    }

    async fn apply_profile(&self, profile: &str) -> Result<(), CommandError> {
        run(&self.profile_command, Some(profile)).await
    }

    async fn terminate_by_pattern(&self, pattern: &str) -> Result<(), CommandError> {
        run(&self.kill_command, Some(pattern)).await
    }
}

async fn run(argv: &[String], extra: Option<&str>) -> Result<(), CommandError> {
    let (program, args) = argv.split_first().ok_or(CommandError::EmptyCommand)?;
    let mut command = Command::new(program);
    command.args(args);
    if let Some(extra) = extra {
        command.arg(extra);
    }
    debug!(?argv, ?extra, "running external command");

    let status = command.status().await.map_err(|source| CommandError::Spawn {
        program: program.clone(),
        source,
    })?;
    if status.success() {
        Ok(())
    } else {
        Err(CommandError::Status {
            program: program.clone(),
            code: status.code(),
        })
    }
}
