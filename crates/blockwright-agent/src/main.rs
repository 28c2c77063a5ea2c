//! Blockwright agent binary.
//!
//! Wires the state controller to an in-memory demo world and runs the tick
//! loop, taking commands from the configured startup script and from
//! standard input, one command per line.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `blockwright.yaml` (or `BLOCKWRIGHT_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the demo world
//! 4. Assemble the controller and its twelve states
//! 5. Start the standard input reader
//! 6. Run the tick loop
//! 7. Log the result and the last status messages

mod demo;
mod error;

use std::io::BufRead;
use std::path::{Path, PathBuf};

use blockwright_behaviors::RecipeBook;
use blockwright_core::Controller;
use blockwright_core::config::{AgentConfig, LoggingConfig};
use blockwright_core::context::Shared;
use blockwright_core::runner::{self, NoOpCallback, RunOptions};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::error::AgentError;

/// Status messages echoed when the run ends.
const FINAL_STATUS_LINES: usize = 10;

/// Application entry point for the agent.
///
/// # Errors
///
/// Returns an error if configuration, world setup, or the run fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let path = config_path();
    let config = load_config(&path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        agent = config.agent.name,
        config = %path.display(),
        seed = config.agent.seed,
        tick_interval_ms = config.agent.tick_interval_ms,
        max_ticks = config.agent.max_ticks,
        "blockwright-agent starting"
    );

    // 3. Build the demo world.
    let demo_config = demo::load_demo_config(&path)?;
    let mut world = demo::build_world(&demo_config, config.agent.owner.as_deref())?;

    // 4. Assemble the controller.
    let options = RunOptions::from_config(&config.agent);
    let script = config.agent.script.clone();
    let recipes = RecipeBook::standard();
    info!(recipes = recipes.len(), "Recipe book loaded");
    let mut controller = Controller::new(Shared::new(config, recipes)).map_err(AgentError::from)?;

    // 5. Start the standard input reader on a detached thread.
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines().map_while(Result::ok) {
            if line.trim().is_empty() {
                continue;
            }
            if tx.send(line).is_err() {
                break;
            }
        }
        debug!("standard input closed");
    });

    // 6. Run the tick loop.
    let result = runner::run_agent(
        &mut controller,
        &mut world,
        &script,
        Some(&mut rx),
        &options,
        &mut NoOpCallback,
    )
    .await
    .map_err(AgentError::from)?;

    // 7. Log the result.
    runner::log_run_end(&result, &controller);
    let messages: Vec<_> = controller.status().messages().collect();
    for message in messages.iter().rev().take(FINAL_STATUS_LINES).rev() {
        info!(kind = ?message.kind, "{message}");
    }
    info!(summary = %controller.describe(), "blockwright-agent stopped");
    Ok(())
}

/// Config file location: `BLOCKWRIGHT_CONFIG`, else `blockwright.yaml`.
fn config_path() -> PathBuf {
    std::env::var_os("BLOCKWRIGHT_CONFIG").map_or_else(|| PathBuf::from("blockwright.yaml"), PathBuf::from)
}

/// Load agent configuration, falling back to defaults if the file is absent.
fn load_config(path: &Path) -> Result<AgentConfig, AgentError> {
    if path.exists() {
        Ok(AgentConfig::from_file(path)?)
    } else {
        let mut config = AgentConfig::default();
        config.logging.apply_env_overrides();
        Ok(config)
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}
