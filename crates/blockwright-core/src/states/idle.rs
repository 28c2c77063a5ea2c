//! Idle state: the fallback. Eats when hungry, otherwise waits.

use blockwright_behaviors::farming::{best_food, is_hungry};
use blockwright_types::StateKind;
use blockwright_world::inventory::totals;
use tracing::debug;

use super::State;
use crate::action::{ActionSlot, SlotPoll};
use crate::context::{AgentContext, Shared, TransitionView};

/// The state the controller falls back to.
pub struct IdleState {
    shared: Shared,
    slot: ActionSlot,
}

impl IdleState {
    /// An idle state.
    pub fn new(shared: Shared) -> Self {
        Self {
            shared,
            slot: ActionSlot::new(),
        }
    }
}

impl State for IdleState {
    fn kind(&self) -> StateKind {
        StateKind::Idle
    }

    fn on_exit(&mut self, _ctx: &mut AgentContext<'_>) {
        self.slot.cancel();
    }

    fn update(&mut self, ctx: &mut AgentContext<'_>) {
        let timeout = self.shared.config.executor.step_timeout_ticks;
        match self.slot.poll(ctx.tick, timeout) {
            SlotPoll::Pending => return,
            SlotPoll::Ready(Err(err)) => debug!(%err, "eating failed"),
            SlotPoll::TimedOut { .. } | SlotPoll::Ready(Ok(_)) | SlotPoll::Empty => {}
        }
        let food = ctx.world.vitals().food;
        if !is_hungry(food, self.shared.config.survival.hunger_threshold) {
            return;
        }
        let held = totals(&ctx.world.query_inventory());
        if let Some(item) = best_food(&held) {
            debug!(%item, food, "eating");
            self.slot.start(ctx.world.use_item(&item, None), ctx.tick);
        }
    }

    // Idle is never chosen by predicate; the controller falls back to it.
    fn should_transition(&self, _view: &TransitionView<'_>) -> bool {
        false
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use blockwright_behaviors::RecipeBook;
    use blockwright_types::Vitals;
    use blockwright_world::{GridWorld, World};

    use super::*;
    use crate::config::AgentConfig;
    use crate::context::Mailbox;
    use crate::status::StatusLog;

    #[test]
    fn eats_the_best_food_when_hungry() {
        let mut world = GridWorld::flat(4);
        world.give("apple", 1).unwrap();
        world.give("bread", 1).unwrap();
        world.set_vitals(Vitals { health: 20, food: 4 });
        let mut mailbox = Mailbox::new();
        let mut status = StatusLog::new(4);
        let mut idle = IdleState::new(Shared::new(AgentConfig::default(), RecipeBook::standard()));
        for tick in 1..4 {
            let mut ctx = AgentContext {
                world: &mut world,
                tick,
                mailbox: &mut mailbox,
                status: &mut status,
            };
            idle.update(&mut ctx);
        }
        assert_eq!(world.held("bread"), 0);
        assert_eq!(world.held("apple"), 1);
        assert_eq!(world.vitals().food, 9);
    }
}
