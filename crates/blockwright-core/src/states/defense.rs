//! Defense state: guard a point and fight anything hostile near it.

use blockwright_types::{Goal, Position, StateKind};
use tracing::info;

use super::combat::{Engagement, Round, unreachable_text};
use super::{State, TaskOutcome};
use crate::context::{AgentContext, Shared, TransitionView};
use crate::status::StatusKind;

/// Defends a guard anchor set by [`Goal::Guard`].
pub struct DefenseState {
    shared: Shared,
    goal: Option<Goal>,
    anchor: Option<Position>,
    fight: Engagement,
    outcome: TaskOutcome,
}

impl DefenseState {
    /// A defense state with nothing to guard.
    pub fn new(shared: Shared) -> Self {
        Self {
            shared,
            goal: None,
            anchor: None,
            fight: Engagement::default(),
            outcome: TaskOutcome::Running,
        }
    }

    /// The guarded point.
    pub const fn anchor(&self) -> Option<Position> {
        self.anchor
    }
}

impl State for DefenseState {
    fn kind(&self) -> StateKind {
        StateKind::Defense
    }

    fn on_enter(&mut self, _ctx: &mut AgentContext<'_>) {
        self.fight.reset();
        self.outcome = TaskOutcome::Running;
    }

    fn on_exit(&mut self, _ctx: &mut AgentContext<'_>) {
        self.fight.reset();
    }

    fn update(&mut self, ctx: &mut AgentContext<'_>) {
        if self.outcome != TaskOutcome::Running {
            return;
        }
        let Some(anchor) = self.anchor else {
            self.outcome = TaskOutcome::Finished;
            return;
        };
        let config = &self.shared.config;
        match self.fight.step(
            ctx,
            anchor,
            config.combat.guard_radius,
            &config.combat,
            &config.executor,
        ) {
            Round::Fighting => {}
            Round::Clear => {
                ctx.report(
                    StateKind::Defense,
                    StatusKind::Info,
                    format!("{anchor} is clear"),
                );
                self.outcome = TaskOutcome::Finished;
            }
            Round::Abandoned(target) => {
                ctx.report(
                    StateKind::Defense,
                    StatusKind::GoalUnreachable,
                    unreachable_text(&target),
                );
                self.outcome = TaskOutcome::Finished;
            }
        }
    }

    fn should_transition(&self, view: &TransitionView<'_>) -> bool {
        let Some(anchor) = self.anchor else {
            return false;
        };
        view.active != StateKind::Defense
            && self
                .fight
                .select(view.world, anchor, self.shared.config.combat.guard_radius, view.tick)
                .is_some()
    }

    fn outcome(&self) -> TaskOutcome {
        self.outcome
    }

    fn assign(&mut self, goal: Goal, ctx: &mut AgentContext<'_>) -> bool {
        let Goal::Guard { anchor } = &goal else {
            return false;
        };
        let anchor = anchor.unwrap_or_else(|| ctx.world.position());
        info!(%anchor, "guarding");
        self.anchor = Some(anchor);
        self.goal = Some(goal);
        true
    }

    fn cancel(&mut self) {
        self.fight.reset();
        self.anchor = None;
        self.goal = None;
    }

    fn goal(&self) -> Option<&Goal> {
        self.goal.as_ref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use blockwright_behaviors::RecipeBook;
    use blockwright_types::EntityCategory;
    use blockwright_world::GridWorld;

    use super::*;
    use crate::config::AgentConfig;
    use crate::context::Mailbox;
    use crate::status::StatusLog;

    #[test]
    fn guard_defaults_to_the_agent_position() {
        let mut world = GridWorld::flat(20);
        world.set_agent_position(Position::new(3, 1, 3));
        let mut mailbox = Mailbox::new();
        let mut status = StatusLog::new(8);
        let mut state = DefenseState::new(Shared::new(AgentConfig::default(), RecipeBook::standard()));
        let mut ctx = AgentContext {
            world: &mut world,
            tick: 0,
            mailbox: &mut mailbox,
            status: &mut status,
        };
        assert!(state.assign(Goal::Guard { anchor: None }, &mut ctx));
        assert_eq!(state.anchor(), Some(Position::new(3, 1, 3)));
    }

    #[test]
    fn fires_only_for_threats_near_the_anchor() {
        let mut world = GridWorld::flat(30);
        let far = world.spawn("skeleton", EntityCategory::Hostile, Position::new(25, 1, 0), None);
        let mut mailbox = Mailbox::new();
        let mut status = StatusLog::new(8);
        let mut state = DefenseState::new(Shared::new(AgentConfig::default(), RecipeBook::standard()));
        {
            let mut ctx = AgentContext {
                world: &mut world,
                tick: 0,
                mailbox: &mut mailbox,
                status: &mut status,
            };
            state.assign(
                Goal::Guard {
                    anchor: Some(Position::new(0, 1, 0)),
                },
                &mut ctx,
            );
        }
        let quiet = TransitionView {
            active: StateKind::Idle,
            dwell_ticks: 0,
            tick: 0,
            world: &world,
        };
        assert!(!state.should_transition(&quiet));

        world.move_entity(far, Position::new(4, 1, 0));
        let threatened = TransitionView {
            active: StateKind::Build,
            dwell_ticks: 0,
            tick: 1,
            world: &world,
        };
        assert!(state.should_transition(&threatened));
    }
}
