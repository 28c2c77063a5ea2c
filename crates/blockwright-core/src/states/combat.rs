//! Combat state and the engagement loop it shares with Defense.
//!
//! A hostile that keeps refusing moves and attacks is given up on after
//! `executor.max_retries` consecutive failures: it is reported once, left
//! alone for `combat.ignore_ticks`, and the fight ends.

use std::collections::BTreeMap;

use blockwright_behaviors::combat::threats_near;
use blockwright_types::{EntityId, EntityInfo, Position, StateKind};
use blockwright_world::World;
use tracing::{debug, info, warn};

use super::{State, TaskOutcome};
use crate::action::{ActionSlot, SlotPoll};
use crate::config::{CombatConfig, ExecutorConfig};
use crate::context::{AgentContext, Shared, TransitionView};
use crate::status::StatusKind;

/// How a round of fighting ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Round {
    /// Still fighting, or waiting out the calm period.
    Fighting,
    /// Nothing hostile for `calm_ticks` ticks.
    Clear,
    /// This hostile could not be reached and is now ignored.
    Abandoned(EntityInfo),
}

/// Fight loop around a center point: close in on the nearest hostile, hit
/// it, repeat until the area has been calm for a few ticks.
#[derive(Debug, Default)]
pub(crate) struct Engagement {
    slot: ActionSlot,
    target: Option<EntityInfo>,
    calm: u32,
    hits: u32,
    failures: u32,
    /// Hostiles given up on, with the tick they may be fought again.
    ignored: BTreeMap<EntityId, u64>,
}

impl Engagement {
    /// Clears the fight. Ignored hostiles stay ignored.
    pub(crate) fn reset(&mut self) {
        self.slot.cancel();
        self.target = None;
        self.calm = 0;
        self.hits = 0;
        self.failures = 0;
    }

    pub(crate) const fn hits(&self) -> u32 {
        self.hits
    }

    /// The hostile to engage around `center` at `tick`, skipping ignored ones.
    pub(crate) fn select(
        &self,
        world: &dyn World,
        center: Position,
        radius: u32,
        tick: u64,
    ) -> Option<EntityInfo> {
        threats_near(world, center, radius)
            .into_iter()
            .find(|e| self.ignored.get(&e.id).is_none_or(|until| tick >= *until))
    }

    /// One tick of fighting.
    pub(crate) fn step(
        &mut self,
        ctx: &mut AgentContext<'_>,
        center: Position,
        radius: u32,
        combat: &CombatConfig,
        executor: &ExecutorConfig,
    ) -> Round {
        let tick = ctx.tick;
        self.ignored.retain(|_, until| *until > tick);
        let failure = match self.slot.poll(tick, executor.step_timeout_ticks) {
            SlotPoll::Pending => return Round::Fighting,
            SlotPoll::Ready(Ok(_)) => {
                self.failures = 0;
                None
            }
            SlotPoll::Empty => None,
            SlotPoll::Ready(Err(err)) => Some(err.to_string()),
            SlotPoll::TimedOut { waited } => Some(format!("action timed out after {waited} ticks")),
        };
        if let Some(reason) = failure {
            self.failures = self.failures.saturating_add(1);
            debug!(%reason, failures = self.failures, "combat action failed");
            if self.failures >= executor.max_retries
                && let Some(target) = self.target.take()
            {
                warn!(target = %target.id, kind = %target.kind, %reason, "giving up on hostile");
                self.ignored
                    .insert(target.id, tick.saturating_add(combat.ignore_ticks));
                self.failures = 0;
                return Round::Abandoned(target);
            }
        }

        let Some(threat) = self.select(&*ctx.world, center, radius, tick) else {
            self.target = None;
            self.calm = self.calm.saturating_add(1);
            return if self.calm >= combat.calm_ticks {
                Round::Clear
            } else {
                Round::Fighting
            };
        };
        self.calm = 0;
        if self.target.as_ref().is_none_or(|t| t.id != threat.id) {
            self.failures = 0;
        }
        let here = ctx.world.position();
        let future = if here.chebyshev(threat.position) > combat.attack_reach {
            ctx.world.move_near(threat.position, combat.attack_reach)
        } else {
            debug!(target = %threat.id, kind = %threat.kind, "attacking");
            self.hits = self.hits.saturating_add(1);
            ctx.world.attack(threat.id)
        };
        self.slot.start(future, tick);
        self.target = Some(threat);
        Round::Fighting
    }
}

/// Status line for a hostile that could not be reached.
pub(crate) fn unreachable_text(target: &EntityInfo) -> String {
    format!("cannot reach {} at {}, leaving it alone", target.kind, target.position)
}

/// Fights hostiles that come close to the agent.
pub struct CombatState {
    shared: Shared,
    fight: Engagement,
    outcome: TaskOutcome,
}

impl CombatState {
    /// A combat state.
    pub fn new(shared: Shared) -> Self {
        Self {
            shared,
            fight: Engagement::default(),
            outcome: TaskOutcome::Running,
        }
    }
}

impl State for CombatState {
    fn kind(&self) -> StateKind {
        StateKind::Combat
    }

    fn on_enter(&mut self, ctx: &mut AgentContext<'_>) {
        self.fight.reset();
        self.outcome = TaskOutcome::Running;
        info!(tick = ctx.tick, "threat detected, engaging");
    }

    fn on_exit(&mut self, _ctx: &mut AgentContext<'_>) {
        self.fight.reset();
    }

    fn update(&mut self, ctx: &mut AgentContext<'_>) {
        if self.outcome != TaskOutcome::Running {
            return;
        }
        let config = &self.shared.config;
        let center = ctx.world.position();
        match self.fight.step(
            ctx,
            center,
            config.combat.threat_radius,
            &config.combat,
            &config.executor,
        ) {
            Round::Fighting => {}
            Round::Clear => {
                ctx.report(
                    StateKind::Combat,
                    StatusKind::Info,
                    format!("threats cleared after {} hits", self.fight.hits()),
                );
                self.outcome = TaskOutcome::Finished;
            }
            Round::Abandoned(target) => {
                ctx.report(
                    StateKind::Combat,
                    StatusKind::GoalUnreachable,
                    unreachable_text(&target),
                );
                self.outcome = TaskOutcome::Finished;
            }
        }
    }

    fn should_transition(&self, view: &TransitionView<'_>) -> bool {
        if matches!(view.active, StateKind::Combat | StateKind::Defense) {
            return false;
        }
        self.fight
            .select(
                view.world,
                view.world.position(),
                self.shared.config.combat.threat_radius,
                view.tick,
            )
            .is_some()
    }

    fn outcome(&self) -> TaskOutcome {
        self.outcome
    }
}
