//! The state controller.
//!
//! Owns the registry and keeps exactly one state active. Each [`Controller::tick`]:
//!
//! 1. Applies directives queued since the last tick
//! 2. Runs one update of the active state
//! 3. Abandons a task that has run past `max_task_ticks`
//! 4. Asks, in priority order, whether another state should take over:
//!    Combat, Defense, Follow, then the active task's own outcome, then (from
//!    Idle only) Mining, Gather, Craft, Build, Farm, Fish, Trade, Explore
//!
//! The first predicate that fires wins. Idle is the fallback whenever a
//! switch target is missing or a task ends.

use blockwright_types::{Directive, Goal, StateKind};
use blockwright_world::World;
use tracing::{debug, info, warn};

use crate::context::{AgentContext, Mailbox, Shared, TransitionView};
use crate::error::ControllerError;
use crate::states::{build_registry, Registry, State, TaskOutcome};
use crate::status::{StatusKind, StatusLog};

/// States that may take over from a running task, highest priority first.
const PREEMPTIVE: [StateKind; 3] = [StateKind::Combat, StateKind::Defense, StateKind::Follow];

/// Task states checked from Idle, highest priority first.
const TASKS: [StateKind; 8] = [
    StateKind::Mining,
    StateKind::Gather,
    StateKind::Craft,
    StateKind::Build,
    StateKind::Farm,
    StateKind::Fish,
    StateKind::Trade,
    StateKind::Explore,
];

/// Single-slot state machine over the registry.
pub struct Controller {
    registry: Registry,
    shared: Shared,
    active: StateKind,
    entered_at: u64,
    tick: u64,
    switches: u64,
    mailbox: Mailbox,
    status: StatusLog,
}

impl Controller {
    /// A controller over the full registry, starting in Idle.
    pub fn new(shared: Shared) -> Result<Self, ControllerError> {
        let registry = build_registry(&shared);
        Self::with_registry(registry, shared)
    }

    /// A controller over a caller-supplied registry.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::MissingFallback`] if the registry has no
    /// Idle state.
    pub fn with_registry(registry: Registry, shared: Shared) -> Result<Self, ControllerError> {
        if !registry.contains_key(&StateKind::Idle) {
            return Err(ControllerError::MissingFallback {
                fallback: StateKind::Idle,
            });
        }
        let status = StatusLog::new(shared.config.controller.status_capacity);
        Ok(Self {
            registry,
            shared,
            active: StateKind::Idle,
            entered_at: 0,
            tick: 0,
            switches: 0,
            mailbox: Mailbox::new(),
            status,
        })
    }

    /// The active state.
    pub const fn active(&self) -> StateKind {
        self.active
    }

    /// Ticks run so far.
    pub const fn ticks(&self) -> u64 {
        self.tick
    }

    /// Ticks since the active state was entered.
    pub const fn dwell_ticks(&self) -> u64 {
        self.tick.saturating_sub(self.entered_at)
    }

    /// State switches so far.
    pub const fn switches(&self) -> u64 {
        self.switches
    }

    /// Status messages posted by the states.
    pub const fn status(&self) -> &StatusLog {
        &self.status
    }

    /// Configuration and recipes shared by the states.
    pub const fn shared(&self) -> &Shared {
        &self.shared
    }

    /// A registered state.
    pub fn state(&self, kind: StateKind) -> Option<&dyn State> {
        self.registry.get(&kind).map(AsRef::as_ref)
    }

    /// Task goals still waiting to be worked on or finished.
    pub fn pending_goals(&self) -> Vec<&Goal> {
        TASKS
            .iter()
            .filter_map(|kind| self.registry.get(kind))
            .filter_map(|state| state.goal())
            .collect()
    }

    /// Whether the agent is idle with no task goals and no queued directives.
    pub fn is_settled(&self) -> bool {
        self.active == StateKind::Idle && self.mailbox.is_empty() && self.pending_goals().is_empty()
    }

    /// Queue a directive for the next tick.
    pub fn submit(&mut self, directive: Directive) {
        debug!(?directive, "directive queued");
        self.mailbox.post(directive);
    }

    /// One-line summary of what the agent is doing.
    pub fn describe(&self) -> String {
        let mut line = format!("tick {} state {}", self.tick, self.active);
        if let Some(state) = self.state(self.active) {
            if let Some(goal) = state.goal() {
                line.push_str(&format!(" goal [{goal}]"));
            }
            if let Some(plan) = state.plan() {
                let summary = plan.summary();
                line.push_str(&format!(
                    " plan {}/{} done, {} dropped",
                    summary.succeeded, summary.initial, summary.dropped
                ));
            }
        }
        let pending = self.pending_goals();
        if !pending.is_empty() {
            let names: Vec<String> = pending.iter().map(ToString::to_string).collect();
            line.push_str(&format!(" pending [{}]", names.join(", ")));
        }
        line
    }

    /// Exit the active state and enter `kind`.
    ///
    /// Returns `false`, leaving the active state untouched, if `kind` is not
    /// registered. Switching to the active state is a no-op that succeeds.
    pub fn change_state(&mut self, kind: StateKind, world: &mut dyn World) -> bool {
        if kind == self.active {
            return true;
        }
        if !self.registry.contains_key(&kind) {
            warn!(state = %kind, active = %self.active, "unknown state, switch ignored");
            return false;
        }
        let from = self.active;
        let mut ctx = AgentContext {
            world,
            tick: self.tick,
            mailbox: &mut self.mailbox,
            status: &mut self.status,
        };
        if let Some(old) = self.registry.get_mut(&from) {
            old.on_exit(&mut ctx);
        }
        self.active = kind;
        self.entered_at = self.tick;
        self.switches = self.switches.saturating_add(1);
        if let Some(new) = self.registry.get_mut(&kind) {
            new.on_enter(&mut ctx);
        }
        info!(from = %from, to = %kind, tick = self.tick, "state change");
        true
    }

    /// Advance the agent by one tick.
    pub fn tick(&mut self, world: &mut dyn World) {
        self.tick = self.tick.saturating_add(1);
        self.apply_directives(world);
        self.update_active(world);
        self.enforce_watchdog(world);
        if let Some(next) = self.select_next(&*world)
            && !self.change_state(next, world)
        {
            self.change_state(StateKind::Idle, world);
        }
    }

    fn apply_directives(&mut self, world: &mut dyn World) {
        for directive in self.mailbox.drain() {
            debug!(?directive, tick = self.tick, "applying directive");
            match directive {
                Directive::Switch { state } => {
                    self.change_state(state, world);
                }
                Directive::Assign { goal } => self.assign(goal, world),
                Directive::Unfollow => {
                    if let Some(follow) = self.registry.get_mut(&StateKind::Follow) {
                        follow.cancel();
                    }
                    if self.active == StateKind::Follow {
                        self.change_state(StateKind::Idle, world);
                    }
                }
                Directive::Stop => {
                    for state in self.registry.values_mut() {
                        state.cancel();
                    }
                    self.change_state(StateKind::Idle, world);
                    self.status
                        .post(self.tick, StateKind::Idle, StatusKind::Info, "stopped, all goals dropped");
                }
            }
        }
    }

    fn assign(&mut self, goal: Goal, world: &mut dyn World) {
        let target = goal.state();
        let label = goal.to_string();
        let mut ctx = AgentContext {
            world: &mut *world,
            tick: self.tick,
            mailbox: &mut self.mailbox,
            status: &mut self.status,
        };
        let accepted = self
            .registry
            .get_mut(&target)
            .is_some_and(|state| state.assign(goal, &mut ctx));
        if !accepted {
            warn!(state = %target, goal = %label, "goal rejected");
            return;
        }
        // Preemptive states wait for their own predicate; nothing interrupts them.
        if target.is_preemptive() || self.active.is_preemptive() {
            return;
        }
        self.change_state(target, world);
    }

    fn update_active(&mut self, world: &mut dyn World) {
        let mut ctx = AgentContext {
            world,
            tick: self.tick,
            mailbox: &mut self.mailbox,
            status: &mut self.status,
        };
        if let Some(state) = self.registry.get_mut(&self.active) {
            state.update(&mut ctx);
        }
    }

    fn enforce_watchdog(&mut self, world: &mut dyn World) {
        let limit = self.shared.config.controller.max_task_ticks;
        let kind = self.active;
        if limit == 0 || kind == StateKind::Idle || kind.is_preemptive() || self.dwell_ticks() < limit {
            return;
        }
        let text = self
            .registry
            .get(&kind)
            .and_then(|state| state.goal())
            .map_or_else(
                || format!("{kind} ran for {limit} ticks, giving up"),
                |goal| format!("cannot {goal}: no result after {limit} ticks"),
            );
        self.status
            .post(self.tick, kind, StatusKind::GoalUnreachable, text);
        if let Some(state) = self.registry.get_mut(&kind) {
            state.cancel();
        }
        self.change_state(StateKind::Idle, world);
    }

    fn select_next(&self, world: &dyn World) -> Option<StateKind> {
        let view = TransitionView {
            active: self.active,
            dwell_ticks: self.dwell_ticks(),
            tick: self.tick,
            world,
        };
        for kind in PREEMPTIVE {
            if kind == self.active {
                break;
            }
            if self.wants(kind, &view) {
                return Some(kind);
            }
        }
        if self.active != StateKind::Idle {
            let outcome = self
                .registry
                .get(&self.active)
                .map_or(TaskOutcome::Finished, |state| state.outcome());
            return match outcome {
                TaskOutcome::Running => None,
                TaskOutcome::Finished => Some(StateKind::Idle),
                TaskOutcome::Failed { fallback } => Some(fallback.unwrap_or(StateKind::Idle)),
            };
        }
        TASKS.into_iter().find(|kind| self.wants(*kind, &view))
    }

    fn wants(&self, kind: StateKind, view: &TransitionView<'_>) -> bool {
        self.registry
            .get(&kind)
            .is_some_and(|state| state.should_transition(view))
    }
}
