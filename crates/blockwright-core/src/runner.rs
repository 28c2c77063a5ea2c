//! Tick loop runner.
//!
//! This module provides [`run_agent`], the top-level async function that
//! drives the controller with support for:
//!
//! - **Startup script**: command lines submitted before the first tick
//! - **Live commands**: lines arriving on a channel, drained every tick
//! - **Bounded runs**: stop after `max_ticks`
//! - **Settling**: once input is closed, stop when no task goal is left
//!
//! A bad script line aborts the run before any tick; a bad live line is
//! logged and skipped.

use blockwright_types::StateKind;
use blockwright_world::World;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{info, warn};

use crate::command::{Command, parse_command};
use crate::config::AgentSection;
use crate::controller::Controller;
use crate::error::RunnerError;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEndReason {
    /// The configured tick limit was reached.
    MaxTicksReached,
    /// A `quit` command arrived.
    QuitRequested,
    /// Input is closed and no task goal remains.
    Settled,
}

/// Result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunResult {
    /// The reason the run ended.
    pub end_reason: RunEndReason,
    /// Ticks executed by this run.
    pub total_ticks: u64,
    /// Active state when the run ended.
    pub final_state: StateKind,
}

/// Limits and defaults for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Real-time milliseconds per tick; 0 only yields to the runtime.
    pub tick_interval_ms: u64,
    /// Stop after this many ticks; 0 for no limit.
    pub max_ticks: u64,
    /// Default target for `follow`.
    pub owner: Option<String>,
}

impl RunOptions {
    /// Options from the `agent` config section.
    pub fn from_config(agent: &AgentSection) -> Self {
        Self {
            tick_interval_ms: agent.tick_interval_ms,
            max_ticks: agent.max_ticks,
            owner: agent.owner.clone(),
        }
    }
}

/// Callback invoked after each tick.
pub trait TickCallback {
    /// Called after the controller has ticked.
    fn on_tick(&mut self, controller: &Controller);
}

/// A no-op tick callback.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _controller: &Controller) {}
}

enum Handled {
    Continue,
    Quit,
}

fn handle(controller: &mut Controller, command: Command) -> Handled {
    match command {
        Command::Directive(directive) => controller.submit(directive),
        Command::Status => info!(status = %controller.describe(), "status"),
        Command::Quit => return Handled::Quit,
    }
    Handled::Continue
}

/// Run the controller until a termination condition is met.
///
/// Script lines are parsed and submitted before the first tick. A scripted
/// `quit` does not end the run by itself; the run ends once the scripted
/// work has settled and no live input remains.
///
/// # Errors
///
/// Returns [`RunnerError::Script`] if a script line does not parse.
pub async fn run_agent(
    controller: &mut Controller,
    world: &mut dyn World,
    script: &[String],
    mut commands: Option<&mut UnboundedReceiver<String>>,
    options: &RunOptions,
    callback: &mut dyn TickCallback,
) -> Result<RunResult, RunnerError> {
    for (index, line) in script.iter().enumerate() {
        let command = parse_command(line, options.owner.as_deref()).map_err(|source| {
            RunnerError::Script {
                line: index.saturating_add(1),
                source,
            }
        })?;
        handle(controller, command);
    }

    info!(
        script_lines = script.len(),
        live_input = commands.is_some(),
        max_ticks = options.max_ticks,
        tick_interval_ms = options.tick_interval_ms,
        "Agent starting"
    );

    let mut total_ticks: u64 = 0;
    let finish = |reason: RunEndReason, ticks: u64, controller: &Controller| RunResult {
        end_reason: reason,
        total_ticks: ticks,
        final_state: controller.active(),
    };

    loop {
        // --- Drain live commands (before tick) ---
        if let Some(rx) = commands.as_deref_mut() {
            let mut closed = false;
            loop {
                match rx.try_recv() {
                    Ok(line) => match parse_command(&line, options.owner.as_deref()) {
                        Ok(command) => {
                            if matches!(handle(controller, command), Handled::Quit) {
                                info!("Quit requested");
                                return Ok(finish(RunEndReason::QuitRequested, total_ticks, controller));
                            }
                        }
                        Err(err) => warn!(%err, line = %line, "command ignored"),
                    },
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        closed = true;
                        break;
                    }
                }
            }
            if closed {
                info!("Command input closed");
                commands = None;
            }
        }

        // --- Execute tick ---
        controller.tick(world);
        total_ticks = total_ticks.saturating_add(1);
        callback.on_tick(controller);

        // --- Check tick limit (after tick) ---
        if options.max_ticks > 0 && total_ticks >= options.max_ticks {
            info!(tick = controller.ticks(), max_ticks = options.max_ticks, "Tick limit reached");
            return Ok(finish(RunEndReason::MaxTicksReached, total_ticks, controller));
        }

        // --- Check for settled work ---
        if commands.is_none() && controller.is_settled() {
            info!(tick = controller.ticks(), "No work left");
            return Ok(finish(RunEndReason::Settled, total_ticks, controller));
        }

        // --- Sleep for tick interval ---
        if options.tick_interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(options.tick_interval_ms)).await;
        } else {
            tokio::task::yield_now().await;
        }
    }
}

/// Log the end of a run.
pub fn log_run_end(result: &RunResult, controller: &Controller) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_state = %result.final_state,
        switches = controller.switches(),
        status_messages = controller.status().total(),
        "Agent stopped"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use blockwright_behaviors::RecipeBook;
    use blockwright_world::GridWorld;
    use tokio::sync::mpsc;

    use super::*;
    use crate::config::AgentConfig;
    use crate::context::Shared;
    use crate::error::CommandError;
    use crate::status::StatusKind;

    fn controller() -> Controller {
        Controller::new(Shared::new(AgentConfig::default(), RecipeBook::standard())).unwrap()
    }

    fn options(max_ticks: u64) -> RunOptions {
        RunOptions {
            tick_interval_ms: 0,
            max_ticks,
            owner: None,
        }
    }

    struct Counter(u64);

    impl TickCallback for Counter {
        fn on_tick(&mut self, _controller: &Controller) {
            self.0 = self.0.saturating_add(1);
        }
    }

    #[tokio::test]
    async fn scripted_work_settles() {
        let mut controller = controller();
        let mut world = GridWorld::flat(40);
        let script = vec![String::from("explore 2"), String::from("status")];
        let mut counter = Counter(0);
        let result = run_agent(&mut controller, &mut world, &script, None, &options(2000), &mut counter)
            .await
            .unwrap();
        assert_eq!(result.end_reason, RunEndReason::Settled);
        assert_eq!(result.final_state, StateKind::Idle);
        assert_eq!(counter.0, result.total_ticks);
        assert_eq!(controller.status().count_of(StatusKind::GoalComplete), 1);
    }

    #[tokio::test]
    async fn bad_script_line_aborts_before_ticking() {
        let mut controller = controller();
        let mut world = GridWorld::flat(4);
        let script = vec![String::from("farm"), String::from("juggle")];
        let err = run_agent(&mut controller, &mut world, &script, None, &options(10), &mut NoOpCallback)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RunnerError::Script {
                line: 2,
                source: CommandError::Unknown { .. }
            }
        ));
        assert_eq!(controller.ticks(), 0);
    }

    #[tokio::test]
    async fn live_quit_ends_the_run() {
        let mut controller = controller();
        let mut world = GridWorld::flat(4);
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(String::from("nonsense")).unwrap();
        tx.send(String::from("quit")).unwrap();
        let result = run_agent(&mut controller, &mut world, &[], Some(&mut rx), &options(0), &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(result.end_reason, RunEndReason::QuitRequested);
        assert_eq!(result.total_ticks, 0);
    }

    #[tokio::test]
    async fn open_input_runs_to_the_tick_limit() {
        let mut controller = controller();
        let mut world = GridWorld::flat(4);
        let (_tx, mut rx) = mpsc::unbounded_channel::<String>();
        let result = run_agent(&mut controller, &mut world, &[], Some(&mut rx), &options(25), &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(result.end_reason, RunEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 25);
        assert_eq!(controller.ticks(), 25);
    }

    #[tokio::test]
    async fn closed_input_lets_the_run_settle() {
        let mut controller = controller();
        let mut world = GridWorld::flat(4);
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(String::from("state trade")).unwrap();
        drop(tx);
        let result = run_agent(&mut controller, &mut world, &[], Some(&mut rx), &options(100), &mut NoOpCallback)
            .await
            .unwrap();
        // Trade has no goal, so it finishes at once and the agent settles.
        assert_eq!(result.end_reason, RunEndReason::Settled);
        assert_eq!(result.final_state, StateKind::Idle);
    }
}
