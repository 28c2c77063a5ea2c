//! Follow state: keep within a fixed distance of the owner.
//!
//! Fires while a follow request is outstanding and the owner has drifted
//! beyond twice the follow distance; finishes once back within the follow
//! distance. The gap between the two thresholds keeps the agent from
//! bouncing between Follow and its task every time the owner takes a step.
//!
//! When the owner cannot be reached the request is put on hold: Follow stays
//! quiet until the owner has moved and a backoff has passed. The backoff
//! doubles with each consecutive give-up.

use blockwright_types::{EntityCategory, EntityInfo, Goal, Position, StateKind};
use blockwright_world::World;
use tracing::{debug, info};

use super::{State, TaskOutcome};
use crate::action::{ActionSlot, SlotPoll};
use crate::context::{AgentContext, Shared, TransitionView};
use crate::status::StatusKind;

fn find_owner(world: &dyn World, owner: &str) -> Option<EntityInfo> {
    world
        .entities()
        .into_iter()
        .find(|e| e.category == EntityCategory::Player && e.name.as_deref() == Some(owner))
}

/// Doublings of the backoff stop here.
const MAX_BACKOFF_DOUBLINGS: u32 = 6;

/// A follow request on hold after the owner could not be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Hold {
    owner_at: Position,
    until: u64,
}

/// Follows the player named by [`Goal::Follow`].
pub struct FollowState {
    shared: Shared,
    goal: Option<Goal>,
    slot: ActionSlot,
    failures: u32,
    give_ups: u32,
    hold: Option<Hold>,
    outcome: TaskOutcome,
}

impl FollowState {
    /// A follow state with no request.
    pub fn new(shared: Shared) -> Self {
        Self {
            shared,
            goal: None,
            slot: ActionSlot::new(),
            failures: 0,
            give_ups: 0,
            hold: None,
            outcome: TaskOutcome::Running,
        }
    }

    /// Whether the request is on hold at `tick` with the owner at `owner_at`.
    fn is_held(&self, owner_at: Position, tick: u64) -> bool {
        self.hold
            .is_some_and(|hold| tick < hold.until || owner_at == hold.owner_at)
    }

    /// Wait after the current run of give-ups.
    fn backoff(&self) -> u64 {
        let base = self
            .shared
            .config
            .follow
            .backoff_ticks
            .max(self.shared.config.controller.min_dwell_ticks)
            .max(1);
        let doublings = self.give_ups.saturating_sub(1).min(MAX_BACKOFF_DOUBLINGS);
        base.saturating_mul(2_u64.saturating_pow(doublings))
    }

    fn clear_hold(&mut self) {
        self.hold = None;
        self.give_ups = 0;
    }

    fn owner(&self) -> Option<&str> {
        match &self.goal {
            Some(Goal::Follow { owner }) => Some(owner.as_str()),
            _ => None,
        }
    }

    fn trigger_distance(&self) -> u32 {
        self.shared.config.follow.distance.saturating_mul(2)
    }
}

impl State for FollowState {
    fn kind(&self) -> StateKind {
        StateKind::Follow
    }

    fn on_enter(&mut self, _ctx: &mut AgentContext<'_>) {
        self.slot.cancel();
        self.failures = 0;
        self.outcome = TaskOutcome::Running;
    }

    fn on_exit(&mut self, _ctx: &mut AgentContext<'_>) {
        self.slot.cancel();
    }

    fn update(&mut self, ctx: &mut AgentContext<'_>) {
        if self.outcome != TaskOutcome::Running {
            return;
        }
        let config = &self.shared.config;
        match self
            .slot
            .poll(ctx.tick, config.executor.step_timeout_ticks)
        {
            SlotPoll::Pending => return,
            SlotPoll::Ready(Err(err)) => {
                self.failures = self.failures.saturating_add(1);
                debug!(%err, failures = self.failures, "follow move failed");
            }
            SlotPoll::TimedOut { .. } => {
                self.failures = self.failures.saturating_add(1);
            }
            SlotPoll::Ready(Ok(_)) | SlotPoll::Empty => {}
        }
        let Some(name) = self.owner().map(str::to_owned) else {
            self.outcome = TaskOutcome::Finished;
            return;
        };
        let Some(owner) = find_owner(&*ctx.world, &name) else {
            ctx.report(
                StateKind::Follow,
                StatusKind::Info,
                format!("lost sight of {name}"),
            );
            self.outcome = TaskOutcome::Finished;
            return;
        };
        if self.failures >= config.executor.max_retries {
            self.give_ups = self.give_ups.saturating_add(1);
            let wait = self.backoff();
            self.hold = Some(Hold {
                owner_at: owner.position,
                until: ctx.tick.saturating_add(wait),
            });
            ctx.report(
                StateKind::Follow,
                StatusKind::Info,
                format!("cannot reach {name}, waiting {wait} ticks for them to move"),
            );
            self.outcome = TaskOutcome::Finished;
            return;
        }
        let distance = config.follow.distance;
        if ctx.world.position().chebyshev(owner.position) <= distance {
            self.clear_hold();
            self.outcome = TaskOutcome::Finished;
            return;
        }
        self.slot
            .start(ctx.world.move_near(owner.position, distance), ctx.tick);
    }

    fn should_transition(&self, view: &TransitionView<'_>) -> bool {
        if view.active == StateKind::Follow {
            return false;
        }
        let Some(name) = self.owner() else {
            return false;
        };
        find_owner(view.world, name).is_some_and(|owner| {
            !self.is_held(owner.position, view.tick)
                && view.world.position().chebyshev(owner.position) > self.trigger_distance()
        })
    }

    fn outcome(&self) -> TaskOutcome {
        self.outcome
    }

    fn assign(&mut self, goal: Goal, _ctx: &mut AgentContext<'_>) -> bool {
        if !matches!(goal, Goal::Follow { .. }) {
            return false;
        }
        info!(%goal, "follow request accepted");
        self.clear_hold();
        self.goal = Some(goal);
        true
    }

    fn cancel(&mut self) {
        self.slot.cancel();
        self.clear_hold();
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
    use blockwright_types::Position;
    use blockwright_world::GridWorld;

    use super::*;
    use crate::config::AgentConfig;
    use crate::context::Mailbox;
    use crate::status::StatusLog;

    #[test]
    fn catches_up_with_the_owner() {
        let mut world = GridWorld::flat(20);
        world.spawn("player", EntityCategory::Player, Position::new(12, 1, 0), Some("alex"));
        let mut mailbox = Mailbox::new();
        let mut status = StatusLog::new(8);
        let mut state = FollowState::new(Shared::new(AgentConfig::default(), RecipeBook::standard()));
        {
            let mut ctx = AgentContext {
                world: &mut world,
                tick: 0,
                mailbox: &mut mailbox,
                status: &mut status,
            };
            state.assign(
                Goal::Follow {
                    owner: String::from("alex"),
                },
                &mut ctx,
            );
        }
        let view = TransitionView {
            active: StateKind::Idle,
            dwell_ticks: 0,
            tick: 0,
            world: &world,
        };
        assert!(state.should_transition(&view));

        for tick in 1..5 {
            let mut ctx = AgentContext {
                world: &mut world,
                tick,
                mailbox: &mut mailbox,
                status: &mut status,
            };
            state.update(&mut ctx);
        }
        assert_eq!(state.outcome(), TaskOutcome::Finished);
        assert!(world.position().chebyshev(Position::new(12, 1, 0)) <= 3);
    }

    #[test]
    fn unreachable_owner_is_held_until_they_move() {
        let mut world = GridWorld::flat(20);
        let owner_at = Position::new(12, 1, 0);
        let owner = world.spawn("player", EntityCategory::Player, owner_at, Some("alex"));
        world.block_path(owner_at);
        let mut config = AgentConfig::default();
        config.follow.backoff_ticks = 10;
        config.controller.min_dwell_ticks = 0;
        let mut mailbox = Mailbox::new();
        let mut status = StatusLog::new(8);
        let mut state = FollowState::new(Shared::new(config, RecipeBook::standard()));
        let mut gave_up = None;
        for tick in 0..20 {
            let mut ctx = AgentContext {
                world: &mut world,
                tick,
                mailbox: &mut mailbox,
                status: &mut status,
            };
            if tick == 0 {
                state.assign(
                    Goal::Follow {
                        owner: String::from("alex"),
                    },
                    &mut ctx,
                );
                state.on_enter(&mut ctx);
            }
            state.update(&mut ctx);
            if state.outcome() == TaskOutcome::Finished {
                gave_up = Some(tick);
                break;
            }
        }
        let gave_up = gave_up.unwrap();
        assert_eq!(status.count_of(StatusKind::Info), 1);

        for tick in [gave_up + 1, gave_up + 500] {
            let view = TransitionView {
                active: StateKind::Idle,
                dwell_ticks: 0,
                tick,
                world: &world,
            };
            assert!(!state.should_transition(&view), "fired at tick {tick}");
        }

        world.move_entity(owner, Position::new(13, 1, 0));
        let early = TransitionView {
            active: StateKind::Idle,
            dwell_ticks: 0,
            tick: gave_up + 2,
            world: &world,
        };
        assert!(!state.should_transition(&early));
        let later = TransitionView {
            active: StateKind::Idle,
            dwell_ticks: 0,
            tick: gave_up + 11,
            world: &world,
        };
        assert!(state.should_transition(&later));
    }

    #[test]
    fn backoff_doubles_with_each_give_up() {
        let mut config = AgentConfig::default();
        config.follow.backoff_ticks = 10;
        config.controller.min_dwell_ticks = 0;
        let mut state = FollowState::new(Shared::new(config, RecipeBook::standard()));
        state.give_ups = 1;
        assert_eq!(state.backoff(), 10);
        state.give_ups = 3;
        assert_eq!(state.backoff(), 40);
        state.give_ups = 50;
        assert_eq!(state.backoff(), 640);
    }

    #[test]
    fn no_request_never_fires() {
        let world = GridWorld::flat(4);
        let state = FollowState::new(Shared::new(AgentConfig::default(), RecipeBook::standard()));
        let view = TransitionView {
            active: StateKind::Idle,
            dwell_ticks: 100,
            tick: 100,
            world: &world,
        };
        assert!(!state.should_transition(&view));
    }
}
