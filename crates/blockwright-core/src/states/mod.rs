//! Agent states.
//!
//! Every [`StateKind`] has exactly one [`State`] in the registry built by
//! [`build_registry`]. The controller keeps one of them active and asks the
//! others, in priority order, whether they want to take over.
//!
//! Task states that run a step plan share [`TaskState`], a generic wrapper
//! over a [`Task`] that owns the goal, the executor, and the re-plan budget.
//! The goal survives leaving the state; the executor does not, so a task
//! that was preempted re-plans from scratch when it resumes.
//!
//! # States
//!
//! - [`idle`] -- Fallback; eats when hungry
//! - [`combat`] -- Fights hostiles near the agent
//! - [`defense`] -- Fights hostiles near a guarded point
//! - [`follow`] -- Keeps up with the owner
//! - [`craft`] -- Resolves and runs a craft queue
//! - [`tasks`] -- Build, Mining, Gather, Farm, Fish, Trade, Explore

pub mod combat;
pub mod craft;
pub mod defense;
pub mod follow;
pub mod idle;
pub mod tasks;

use std::collections::BTreeMap;

use blockwright_types::{Goal, StateKind};

use crate::context::{AgentContext, Shared, TransitionView};
use crate::executor::Executor;

pub use combat::CombatState;
pub use craft::CraftState;
pub use defense::DefenseState;
pub use follow::FollowState;
pub use idle::IdleState;
pub use tasks::{Task, TaskState, Verdict};

/// How the active state's current task stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskOutcome {
    /// Still working, or nothing to report.
    #[default]
    Running,
    /// The task ended normally; return to Idle.
    Finished,
    /// The task gave up.
    Failed {
        /// State to switch to instead of Idle.
        fallback: Option<StateKind>,
    },
}

/// One agent behavior.
pub trait State {
    /// Which state this is.
    fn kind(&self) -> StateKind;

    /// Called when the state becomes active.
    fn on_enter(&mut self, _ctx: &mut AgentContext<'_>) {}

    /// Called when the state stops being active.
    fn on_exit(&mut self, _ctx: &mut AgentContext<'_>) {}

    /// One tick of work while active.
    fn update(&mut self, ctx: &mut AgentContext<'_>);

    /// Whether this state wants to become active.
    fn should_transition(&self, view: &TransitionView<'_>) -> bool;

    /// How the current task stands. Only consulted while active.
    fn outcome(&self) -> TaskOutcome {
        TaskOutcome::Running
    }

    /// Accept a goal. Returns `false` if the goal is not for this state.
    fn assign(&mut self, _goal: Goal, _ctx: &mut AgentContext<'_>) -> bool {
        false
    }

    /// Drop the pending goal, if any.
    fn cancel(&mut self) {}

    /// The pending goal, if any.
    fn goal(&self) -> Option<&Goal> {
        None
    }

    /// The running plan, if any.
    fn plan(&self) -> Option<&Executor> {
        None
    }
}

/// States keyed by kind.
pub type Registry = BTreeMap<StateKind, Box<dyn State>>;

/// A registry holding one instance of every state.
pub fn build_registry(shared: &Shared) -> Registry {
    let states: Vec<Box<dyn State>> = vec![
        Box::new(IdleState::new(shared.clone())),
        Box::new(CombatState::new(shared.clone())),
        Box::new(DefenseState::new(shared.clone())),
        Box::new(FollowState::new(shared.clone())),
        Box::new(CraftState::new(shared.clone())),
        Box::new(TaskState::new(tasks::BuildTask::default(), shared.clone())),
        Box::new(TaskState::new(tasks::MiningTask::default(), shared.clone())),
        Box::new(TaskState::new(tasks::GatherTask::default(), shared.clone())),
        Box::new(TaskState::new(tasks::FarmTask, shared.clone())),
        Box::new(TaskState::new(tasks::FishTask::default(), shared.clone())),
        Box::new(TaskState::new(tasks::TradeTask, shared.clone())),
        Box::new(TaskState::new(
            tasks::ExploreTask::new(shared.config.agent.seed),
            shared.clone(),
        )),
    ];
    states.into_iter().map(|s| (s.kind(), s)).collect()
}

/// Whether a pending task may leave Idle: it has a goal, Idle is active, and
/// Idle has been active for at least the minimum dwell.
pub(crate) fn task_may_start(has_goal: bool, view: &TransitionView<'_>, min_dwell: u64) -> bool {
    has_goal && view.active == StateKind::Idle && view.dwell_ticks >= min_dwell
}

#[cfg(test)]
mod tests {
    use blockwright_behaviors::RecipeBook;

    use super::*;
    use crate::config::AgentConfig;

    #[test]
    fn registry_covers_every_kind_once() {
        let shared = Shared::new(AgentConfig::default(), RecipeBook::standard());
        let registry = build_registry(&shared);
        assert_eq!(registry.len(), StateKind::ALL.len());
        for kind in StateKind::ALL {
            assert_eq!(registry.get(&kind).map(|s| s.kind()), Some(kind));
        }
    }
}
