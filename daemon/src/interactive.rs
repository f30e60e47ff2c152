//! Startup priority prompt and per-cycle kill prompt

use crate::console::{Console, TimedInput};
use crate::executor::CommandRunner;
use std::io;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillOutcome {
    /// Nothing typed before the deadline.
    TimedOut,
    /// Any answer other than `yes`, or input closed before a name was given.
    Declined,
    Killed(String),
    KillFailed(String),
}

impl KillOutcome {
    pub fn ran_kill_tool(&self) -> bool {
        matches!(self, KillOutcome::Killed(_) | KillOutcome::KillFailed(_))
    }
}

/// Asks once, without a deadline, for a process that forces full performance.
pub async fn ask_priority<C>(console: &mut C) -> io::Result<Option<String>>
where
    C: Console + ?Sized,
{
    let answer = console
        .read_token("Would you like to set a priority process? (yes/no): ")
        .await?;
    if answer.as_deref() != Some("yes") {
        return Ok(None);
    }

    let name = console
        .read_token("Enter the process name to prioritize: ")
        .await?;
    if let Some(name) = &name {
        console.say(&format!("Priority process set to: {name}"));
    }
    Ok(name)
}

/// Offers to kill a process by pattern. Only the yes/no answer is bounded by
/// `limit`; pending input is discarded before returning on every path.
pub async fn offer_kill<C, R>(console: &mut C, runner: &R, limit: Duration) -> io::Result<KillOutcome>
where
    C: Console + ?Sized,
    R: CommandRunner + ?Sized,
{
    let outcome = kill_dialog(console, runner, limit).await;
    console.discard_pending();
    outcome
}

async fn kill_dialog<C, R>(console: &mut C, runner: &R, limit: Duration) -> io::Result<KillOutcome>
where
    C: Console + ?Sized,
    R: CommandRunner + ?Sized,
{
    let answer = match console
        .read_token_within("Do you want to kill a process? (yes/no): ", limit)
        .await?
    {
        TimedInput::Ready(answer) => answer,
        TimedInput::TimedOut => {
            console.say(&format!(
                "\nNo response in {} seconds. Moving forward...",
                limit.as_secs()
            ));
            return Ok(KillOutcome::TimedOut);
        }
    };
    if answer.as_deref() != Some("yes") {
        return Ok(KillOutcome::Declined);
    }

    let Some(name) = console.read_token("Enter the process name to kill: ").await? else {
        return Ok(KillOutcome::Declined);
    };

    console.say(&format!("Attempting to kill process: {name}"));
    match runner.terminate_by_pattern(&name).await {
        Ok(()) => {
            console.say(&format!("Process {name} terminated successfully."));
            Ok(KillOutcome::Killed(name))
        }
        Err(e) => {
            warn!("Failed to terminate process {}: {}. It may not exist.", name, e);
            Ok(KillOutcome::KillFailed(name))
        }
    }
}
