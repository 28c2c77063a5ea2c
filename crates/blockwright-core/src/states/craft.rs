//! Craft state: resolve a crafting goal and run its craft queue.
//!
//! On each (re)entry the goal is resolved against the current inventory.
//! Missing raw materials are handed to Gather through the mailbox while the
//! craft goal stays pending; once Gather finishes, Idle hands control back
//! and resolution starts over. A resolved queue is worked front to back, one
//! world action at a time, with a crafting station found, placed, or crafted
//! as recipes require.

use blockwright_behaviors::crafting::{self, STATION};
use blockwright_behaviors::{CraftQueue, QueueStatus, StationPlan};
use blockwright_types::{Directive, Goal, ItemKind, Position, ResourceRequirement, StateKind};
use blockwright_world::inventory::totals;
use tracing::{debug, info, warn};

use super::{State, TaskOutcome, task_may_start};
use crate::action::{ActionSlot, SlotPoll};
use crate::context::{AgentContext, Shared, TransitionView};
use crate::status::StatusKind;

/// What the outstanding action is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Crafting,
    PlacingStation(Position),
    Moving,
}

fn describe(reqs: &[ResourceRequirement]) -> String {
    reqs.iter()
        .map(|r| format!("{} {}", r.count, r.item))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Pursues [`Goal::Craft`].
pub struct CraftState {
    shared: Shared,
    goal: Option<Goal>,
    target: u32,
    queue: Option<CraftQueue>,
    station: Option<Position>,
    slot: ActionSlot,
    pending: Option<Pending>,
    failures: u32,
    handoffs: u32,
    outcome: TaskOutcome,
}

impl CraftState {
    /// A craft state with no goal.
    pub fn new(shared: Shared) -> Self {
        Self {
            shared,
            goal: None,
            target: 0,
            queue: None,
            station: None,
            slot: ActionSlot::new(),
            pending: None,
            failures: 0,
            handoffs: 0,
            outcome: TaskOutcome::Running,
        }
    }

    /// Remembered crafting station.
    pub const fn station(&self) -> Option<Position> {
        self.station
    }

    /// The craft queue being worked, if resolved.
    pub const fn queue(&self) -> Option<&CraftQueue> {
        self.queue.as_ref()
    }

    fn reset_work(&mut self) {
        self.slot.cancel();
        self.pending = None;
        self.queue = None;
    }

    fn finish(&mut self, kind: StatusKind, text: String, ctx: &mut AgentContext<'_>) {
        ctx.report(StateKind::Craft, kind, text);
        self.reset_work();
        self.goal = None;
        self.outcome = if kind == StatusKind::GoalComplete {
            TaskOutcome::Finished
        } else {
            TaskOutcome::Failed { fallback: None }
        };
    }

    fn unreachable(&mut self, item: &ItemKind, reason: &str, ctx: &mut AgentContext<'_>) {
        self.finish(
            StatusKind::GoalUnreachable,
            format!("cannot craft {item}: {reason}"),
            ctx,
        );
    }

    /// Turn the goal into a craft queue, or hand missing raw materials to
    /// Gather. Returns `false` when the state should stop for this tick.
    fn resolve(&mut self, item: &ItemKind, ctx: &mut AgentContext<'_>) -> bool {
        let config = &self.shared.config;
        let mut held = totals(&ctx.world.query_inventory());
        let have = held.get(item).copied().unwrap_or(0);
        let remaining = self.target.saturating_sub(have);
        // Items already held count towards the target, not as ingredients.
        held.insert(item.clone(), 0);

        let mut targets = vec![ResourceRequirement::new(item.clone(), remaining)];
        let first = match crafting::resolve(
            &self.shared.recipes,
            &targets,
            &held,
            config.crafting.max_depth,
        ) {
            Ok(res) => res,
            Err(err) => {
                let reason = err.to_string();
                self.unreachable(item, &reason, ctx);
                return false;
            }
        };
        let station = crafting::resolve_station(
            &*ctx.world,
            self.station,
            config.crafting.station_search_radius,
            &held,
        );
        let resolution = if first.needs_station()
            && item.as_str() != STATION
            && station == StationPlan::CraftThenPlace
        {
            targets.insert(0, ResourceRequirement::new(STATION, 1));
            match crafting::resolve(
                &self.shared.recipes,
                &targets,
                &held,
                config.crafting.max_depth,
            ) {
                Ok(res) => res,
                Err(err) => {
                    let reason = err.to_string();
                    self.unreachable(item, &reason, ctx);
                    return false;
                }
            }
        } else {
            first
        };

        if let Some(raw) = resolution.raw.first() {
            if self.handoffs >= config.crafting.max_gather_handoffs {
                let reason = format!("still missing {}", describe(&resolution.raw));
                self.unreachable(item, &reason, ctx);
                return false;
            }
            self.handoffs = self.handoffs.saturating_add(1);
            ctx.report(
                StateKind::Craft,
                StatusKind::Info,
                format!(
                    "need {} for {item}, gathering {} {} first",
                    describe(&resolution.raw),
                    raw.count,
                    raw.item
                ),
            );
            ctx.mailbox.post(Directive::Assign {
                goal: Goal::Gather {
                    item: raw.item.clone(),
                    count: raw.count,
                },
            });
            return false;
        }

        info!(
            %item,
            orders = resolution.orders.len(),
            station = resolution.needs_station(),
            "craft queue resolved"
        );
        self.queue = Some(CraftQueue::new(resolution.orders));
        true
    }

    fn handle_result(&mut self, poll: SlotPoll, item: &ItemKind, ctx: &mut AgentContext<'_>) {
        let pending = self.pending.take();
        let failure = match poll {
            SlotPoll::Ready(Ok(_)) => {
                let missing_station = match pending {
                    Some(Pending::Crafting) => {
                        if let Some(done) = self.queue.as_mut().and_then(CraftQueue::complete_front) {
                            debug!(recipe = %done.order.recipe.id, crafts = done.order.crafts, "crafted");
                        }
                        None
                    }
                    Some(Pending::PlacingStation(pos)) => {
                        let placed = ctx
                            .world
                            .query_block(pos)
                            .is_some_and(|b| b.kind.as_str() == STATION);
                        if placed {
                            info!(station = %pos, "crafting station placed");
                            self.station = Some(pos);
                            None
                        } else {
                            Some(format!("placed a crafting station at {pos} but none is there"))
                        }
                    }
                    Some(Pending::Moving) | None => None,
                };
                let Some(failure) = missing_station else {
                    self.failures = 0;
                    return;
                };
                failure
            }
            SlotPoll::Ready(Err(err)) => err.to_string(),
            SlotPoll::TimedOut { waited } => format!("action timed out after {waited} ticks"),
            SlotPoll::Empty | SlotPoll::Pending => return,
        };
        self.failures = self.failures.saturating_add(1);
        debug!(%item, failures = self.failures, %failure, "craft action failed");
        if self.failures >= self.shared.config.executor.max_retries {
            self.unreachable(item, &failure, ctx);
        } else {
            // Inventory may not be what the queue expects any more.
            self.queue = None;
        }
    }

    fn work_queue(&mut self, item: &ItemKind, ctx: &mut AgentContext<'_>) {
        let held = totals(&ctx.world.query_inventory());
        let Some(queue) = self.queue.as_mut() else {
            return;
        };
        match queue.next_ready(&held) {
            QueueStatus::Empty => {
                // Target not reached although every order ran.
                self.failures = self.failures.saturating_add(1);
                self.queue = None;
                if self.failures >= self.shared.config.executor.max_retries {
                    self.unreachable(item, "crafting did not produce the target", ctx);
                }
            }
            QueueStatus::Unreachable { missing } => {
                let reason = format!("every queued craft is blocked, missing {}", describe(&missing));
                warn!(%item, %reason, "craft queue livelock");
                self.unreachable(item, &reason, ctx);
            }
            QueueStatus::Ready => {
                let Some(entry) = queue.front() else {
                    return;
                };
                let recipe = entry.order.recipe.clone();
                let crafts = entry.order.crafts;
                if !recipe.requires_station {
                    self.pending = Some(Pending::Crafting);
                    self.slot.start(ctx.world.craft(&recipe, crafts, None), ctx.tick);
                    return;
                }
                let plan = crafting::resolve_station(
                    &*ctx.world,
                    self.station,
                    self.shared.config.crafting.station_search_radius,
                    &held,
                );
                match plan {
                    StationPlan::Known(pos) | StationPlan::Found(pos) => {
                        self.station = Some(pos);
                        let reach = self.shared.config.executor.reach;
                        if ctx.world.position().chebyshev(pos) > reach {
                            self.pending = Some(Pending::Moving);
                            self.slot.start(ctx.world.move_near(pos, reach), ctx.tick);
                        } else {
                            self.pending = Some(Pending::Crafting);
                            self.slot
                                .start(ctx.world.craft(&recipe, crafts, Some(pos)), ctx.tick);
                        }
                    }
                    StationPlan::PlaceFromInventory { reference, face } => {
                        let spot = reference.neighbor(face);
                        self.pending = Some(Pending::PlacingStation(spot));
                        self.slot.start(
                            ctx.world.place_block(reference, face, &ItemKind::from(STATION)),
                            ctx.tick,
                        );
                    }
                    StationPlan::CraftThenPlace => {
                        self.unreachable(item, "no crafting station available", ctx);
                    }
                    StationPlan::Unavailable => {
                        self.unreachable(item, "no room to place a crafting station", ctx);
                    }
                }
            }
        }
    }
}

impl State for CraftState {
    fn kind(&self) -> StateKind {
        StateKind::Craft
    }

    fn on_enter(&mut self, _ctx: &mut AgentContext<'_>) {
        self.outcome = TaskOutcome::Running;
    }

    fn on_exit(&mut self, _ctx: &mut AgentContext<'_>) {
        self.reset_work();
    }

    fn update(&mut self, ctx: &mut AgentContext<'_>) {
        if self.outcome != TaskOutcome::Running {
            return;
        }
        let Some(Goal::Craft { item, .. }) = self.goal.clone() else {
            self.outcome = TaskOutcome::Finished;
            return;
        };

        if self.slot.is_busy() {
            let poll = self
                .slot
                .poll(ctx.tick, self.shared.config.executor.step_timeout_ticks);
            if matches!(poll, SlotPoll::Pending) {
                return;
            }
            self.handle_result(poll, &item, ctx);
            if self.outcome != TaskOutcome::Running {
                return;
            }
        }

        let held = totals(&ctx.world.query_inventory());
        let have = held.get(&item).copied().unwrap_or(0);
        if have >= self.target {
            self.finish(
                StatusKind::GoalComplete,
                format!("crafted {item}, holding {have}"),
                ctx,
            );
            return;
        }

        if self.queue.is_none() && !self.resolve(&item, ctx) {
            return;
        }
        self.work_queue(&item, ctx);
    }

    fn should_transition(&self, view: &TransitionView<'_>) -> bool {
        task_may_start(
            self.goal.is_some(),
            view,
            self.shared.config.controller.min_dwell_ticks,
        )
    }

    fn outcome(&self) -> TaskOutcome {
        self.outcome
    }

    fn assign(&mut self, goal: Goal, ctx: &mut AgentContext<'_>) -> bool {
        let Goal::Craft { item, count } = &goal else {
            return false;
        };
        let held = totals(&ctx.world.query_inventory());
        self.target = held.get(item).copied().unwrap_or(0).saturating_add(*count);
        info!(%goal, target = self.target, "goal accepted");
        self.reset_work();
        self.failures = 0;
        self.handoffs = 0;
        self.goal = Some(goal);
        self.outcome = TaskOutcome::Running;
        true
    }

    fn cancel(&mut self) {
        self.reset_work();
        self.goal = None;
    }

    fn goal(&self) -> Option<&Goal> {
        self.goal.as_ref()
    }
}
