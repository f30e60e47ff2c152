use anyhow::{Context, Result};
use clap::Parser;
use powerpilot_daemon::{
    config::{priority_name, Config},
    console::TerminalConsole,
    controller::Controller,
    executor::SystemRunner,
    interactive::ask_priority,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

/// Switches the tuned power profile based on sampled process load.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Config file. Defaults to the per-user config directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Process that forces latency-performance while running. Skips the
    /// startup prompt.
    #[arg(short, long)]
    priority: Option<String>,

    /// Never offer to kill a process between cycles.
    #[arg(long)]
    no_kill_prompt: bool,
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(explicit: Option<&Path>) -> Config {
    if let Some(path) = explicit {
        return Config::load_or_default(path);
    }

    let config_path = Config::config_path();
    if config_path.exists() {
        Config::load_or_default(&config_path)
    } else {
        info!("No config file found, using defaults");
        Config::default()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn run(args: Args, mut config: Config) {
    if args.no_kill_prompt {
        config.general.kill_prompt = false;
    }

    let mut console = TerminalConsole::new();
    let preset = args.priority.as_deref().and_then(priority_name);
    let priority = match preset.or_else(|| config.general.priority()) {
        Some(name) => {
            info!("Priority process set to: {}", name);
            Some(name)
        }
        None => ask_priority(&mut console).await.unwrap_or_else(|e| {
            warn!("Could not read priority process: {}", e);
            None
        }),
    };

    let runner = SystemRunner::from_config(&config);
    let controller = Controller::new(config, runner, console, priority);
    controller.run(shutdown_signal()).await;
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();
    info!("powerpilot starting...");

    let config = load_config(args.config.as_deref());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    runtime.block_on(run(args, config));
    // A pending stdin read on the blocking pool never returns by itself.
    runtime.shutdown_timeout(Duration::from_millis(200));

    info!("powerpilot stopped");
    Ok(())
}
