#![allow(dead_code)]

use async_trait::async_trait;
use powerpilot_daemon::console::{first_token, Console, TimedInput};
use powerpilot_daemon::executor::{CommandError, CommandRunner};
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Exporter,
    Profile(String),
    Terminate(String),
}

/// Records every call instead of running real tools.
#[derive(Default)]
pub struct FakeRunner {
    pub calls: Mutex<Vec<Call>>,
    /// Written by `run_exporter`, standing in for the real exporter.
    pub export: Option<(PathBuf, String)>,
    pub fail_exporter: bool,
    pub fail_profile: bool,
    pub fail_terminate: bool,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exporting(path: impl Into<PathBuf>, csv: &str) -> Self {
        Self {
            export: Some((path.into(), csv.to_string())),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn terminations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Terminate(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn profiles(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Profile(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn failed(program: &str) -> CommandError {
    CommandError::Status {
        program: program.to_string(),
        code: Some(1),
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run_exporter(&self) -> Result<(), CommandError> {
        self.record(Call::Exporter);
        if let Some((path, csv)) = &self.export {
            std::fs::write(path, csv).unwrap();
        }
        if self.fail_exporter {
            return Err(failed("csvExport"));
        }
        Ok(())
    }

    async fn apply_profile(&self, profile: &str) -> Result<(), CommandError> {
        self.record(Call::Profile(profile.to_string()));
        if self.fail_profile {
            return Err(failed("tuned-adm"));
        }
        Ok(())
    }

    async fn terminate_by_pattern(&self, pattern: &str) -> Result<(), CommandError> {
        self.record(Call::Terminate(pattern.to_string()));
        if self.fail_terminate {
            return Err(failed("pkill"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum Input {
    Line(&'static str),
    Timeout,
}

/// Console fed from a script. An exhausted script behaves like closed stdin.
#[derive(Default)]
pub struct ScriptedConsole {
    inputs: VecDeque<Input>,
    pub said: Vec<String>,
    pub prompts: Vec<String>,
    pub deadlines: Vec<Duration>,
    pub discards: usize,
}

impl ScriptedConsole {
    pub fn new(inputs: impl IntoIterator<Item = Input>) -> Self {
        Self {
            inputs: inputs.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn lines(lines: &[&'static str]) -> Self {
        Self::new(lines.iter().map(|l| Input::Line(*l)))
    }

    pub fn output(&self) -> String {
        self.said.join("\n")
    }

    pub fn remaining(&self) -> usize {
        self.inputs.len()
    }
}

#[async_trait]
impl Console for ScriptedConsole {
    fn say(&mut self, text: &str) {
        self.said.push(text.to_string());
    }

    async fn read_token(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        while let Some(input) = self.inputs.pop_front() {
            match input {
                Input::Line(line) => {
                    if let Some(token) = first_token(line) {
                        return Ok(Some(token));
                    }
                }
                Input::Timeout => panic!("unbounded read hit a scripted timeout"),
            }
        }
        Ok(None)
    }

    async fn read_token_within(&mut self, prompt: &str, limit: Duration) -> io::Result<TimedInput> {
        self.prompts.push(prompt.to_string());
        self.deadlines.push(limit);
        Ok(match self.inputs.pop_front() {
            Some(Input::Timeout) => TimedInput::TimedOut,
            Some(Input::Line(line)) => TimedInput::Ready(first_token(line)),
            None => TimedInput::Ready(None),
        })
    }

    fn discard_pending(&mut self) {
        self.discards += 1;
    }
}
