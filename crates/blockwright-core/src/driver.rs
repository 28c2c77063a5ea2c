//! The standard step driver.
//!
//! Turns each [`ActionKind`] into world calls. An attempt moves through
//! [`StepStage`]s: approach the target if it is out of reach, optionally
//! place one temporary support block, then act and verify the result
//! against the world.

use blockwright_behaviors::fishing::ROD;
use blockwright_behaviors::placement::{self, default_ranking};
use blockwright_types::{ActionKind, EntityCategory, Face, ItemKind, Position, Step, StepStage};
use blockwright_world::inventory::{count_of, totals};
use blockwright_world::{ActionResult, World};
use tracing::debug;

use crate::config::AgentConfig;
use crate::context::AgentContext;
use crate::executor::{Attempt, StepDriver, StepFailure};

/// Seed planted by a sow step without an explicit resource.
const DEFAULT_SEED: &str = "wheat_seeds";

/// Drives build, dig, farm, fish, trade, and approach steps.
#[derive(Debug, Clone)]
pub struct StandardDriver {
    reach: u32,
    materials: Vec<ItemKind>,
}

impl StandardDriver {
    /// A driver acting from `reach` blocks away, substituting building
    /// blocks from `materials` in order.
    pub fn new(reach: u32, materials: Vec<ItemKind>) -> Self {
        let materials = if materials.is_empty() {
            default_ranking()
        } else {
            materials
        };
        Self {
            reach: reach.max(1),
            materials,
        }
    }

    /// A driver configured from the executor and build sections.
    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(config.executor.reach, config.build.materials.clone())
    }

    fn act(&self, step: &mut Step, target: Position, world: &mut dyn World) -> Attempt {
        let Some(block) = world.query_block(target) else {
            return Attempt::Failed(StepFailure::WorldInconsistency(format!(
                "{target} is not loaded"
            )));
        };
        match &step.action {
            ActionKind::Approach { .. } => Attempt::Succeeded,
            ActionKind::Place => {
                if block.solid {
                    return Attempt::AlreadyDone;
                }
                let held = totals(&world.query_inventory());
                let Some(material) =
                    placement::pick_material(step.resource.as_ref(), &held, &self.materials)
                else {
                    return Attempt::Failed(StepFailure::ResourceShortage(String::from(
                        "no building material held",
                    )));
                };
                if let Some(spot) = placement::reference_face(&*world, target) {
                    step.stage = StepStage::Acting;
                    return Attempt::Await(world.place_block(spot.reference, spot.face, &material));
                }
                if !step.supported
                    && let Some(support) = placement::support_candidate(&*world, target)
                {
                    debug!(%target, support = %support.target(), "placing temporary support");
                    step.stage = StepStage::Supporting;
                    return Attempt::Await(world.place_block(
                        support.reference,
                        support.face,
                        &material,
                    ));
                }
                Attempt::Failed(StepFailure::PlacementFailure(format!(
                    "no reference face for {target}"
                )))
            }
            ActionKind::Dig => {
                if !block.solid && block.growth.is_none() {
                    return Attempt::AlreadyDone;
                }
                step.stage = StepStage::Acting;
                Attempt::Await(world.break_block(target))
            }
            ActionKind::Harvest => {
                if block.is_air() {
                    return Attempt::AlreadyDone;
                }
                if block.growth.is_some() && !block.is_mature_crop() {
                    return Attempt::Failed(StepFailure::WorldInconsistency(format!(
                        "crop at {target} is not mature"
                    )));
                }
                step.stage = StepStage::Acting;
                Attempt::Await(world.break_block(target))
            }
            ActionKind::Sow => {
                if block.growth.is_some() {
                    return Attempt::AlreadyDone;
                }
                let seed = step
                    .resource
                    .clone()
                    .unwrap_or_else(|| ItemKind::from(DEFAULT_SEED));
                if count_of(&world.query_inventory(), &seed) == 0 {
                    return Attempt::Failed(StepFailure::ResourceShortage(format!("no {seed} held")));
                }
                step.stage = StepStage::Acting;
                Attempt::Await(world.place_block(target.below(), Face::Up, &seed))
            }
            ActionKind::Cast => {
                let rod = step
                    .resource
                    .clone()
                    .unwrap_or_else(|| ItemKind::from(ROD));
                if count_of(&world.query_inventory(), &rod) == 0 {
                    return Attempt::Failed(StepFailure::ResourceShortage(format!("no {rod} held")));
                }
                step.stage = StepStage::Acting;
                Attempt::Await(world.use_item(&rod, Some(target)))
            }
            ActionKind::Barter { want } => {
                let Some(give) = step.resource.clone() else {
                    return Attempt::Failed(StepFailure::WorldInconsistency(String::from(
                        "barter step has nothing to offer",
                    )));
                };
                let trader = world
                    .entities()
                    .into_iter()
                    .filter(|e| e.category == EntityCategory::Trader)
                    .min_by_key(|e| (e.position.distance_squared(target), e.id));
                let Some(trader) = trader else {
                    return Attempt::Failed(StepFailure::WorldInconsistency(format!(
                        "no trader near {target}"
                    )));
                };
                if count_of(&world.query_inventory(), &give) == 0 {
                    return Attempt::Failed(StepFailure::ResourceShortage(format!("no {give} held")));
                }
                let want = want.clone();
                step.stage = StepStage::Acting;
                Attempt::Await(world.trade(trader.id, &give, &want))
            }
        }
    }

    fn verify(step: &Step, target: Position, world: &dyn World) -> Attempt {
        let block = world.query_block(target);
        match step.action {
            ActionKind::Place => {
                if block.is_some_and(|b| b.solid) {
                    Attempt::Succeeded
                } else {
                    Attempt::Failed(StepFailure::PlacementFailure(format!(
                        "placement at {target} did not take"
                    )))
                }
            }
            ActionKind::Dig => {
                if block.is_some_and(|b| !b.solid) {
                    Attempt::Succeeded
                } else {
                    Attempt::Failed(StepFailure::WorldInconsistency(format!(
                        "{target} still solid after digging"
                    )))
                }
            }
            ActionKind::Sow => {
                if block.is_some_and(|b| b.growth.is_some()) {
                    Attempt::Succeeded
                } else {
                    Attempt::Failed(StepFailure::PlacementFailure(format!(
                        "nothing planted at {target}"
                    )))
                }
            }
            _ => Attempt::Succeeded,
        }
    }
}

impl StepDriver for StandardDriver {
    fn start(&mut self, step: &mut Step, ctx: &mut AgentContext<'_>) -> Attempt {
        let Some(target) = step.target else {
            return Attempt::Failed(StepFailure::WorldInconsistency(String::from(
                "step has no target",
            )));
        };
        let here = ctx.world.position();
        let tolerance = match step.action {
            ActionKind::Approach { tolerance } => tolerance,
            _ => self.reach,
        };
        if here.chebyshev(target) > tolerance {
            step.stage = StepStage::Approaching;
            return Attempt::Await(ctx.world.move_near(target, tolerance));
        }
        self.act(step, target, &mut *ctx.world)
    }

    fn resume(&mut self, step: &mut Step, result: ActionResult, ctx: &mut AgentContext<'_>) -> Attempt {
        let Some(target) = step.target else {
            return Attempt::Failed(StepFailure::WorldInconsistency(String::from(
                "step has no target",
            )));
        };
        if let Err(err) = result {
            return Attempt::Failed(err.into());
        }
        match step.stage {
            StepStage::Approaching => self.act(step, target, &mut *ctx.world),
            StepStage::Supporting => {
                step.supported = true;
                Attempt::Again
            }
            StepStage::Acting => Self::verify(step, target, &*ctx.world),
            StepStage::Pending => Attempt::Failed(StepFailure::WorldInconsistency(String::from(
                "result arrived for an idle step",
            ))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use blockwright_types::{BlockDescriptor, StateKind};
    use blockwright_world::GridWorld;

    use super::*;
    use crate::config::ExecutorConfig;
    use crate::context::Mailbox;
    use crate::executor::{Executor, PlanStatus};
    use crate::status::StatusLog;

    fn run(world: &mut GridWorld, steps: Vec<Step>, ticks: u64) -> PlanStatus {
        let mut mailbox = Mailbox::new();
        let mut status = StatusLog::new(16);
        let mut driver = StandardDriver::new(4, Vec::new());
        let mut exec = Executor::new(StateKind::Build, steps, &ExecutorConfig::default());
        let mut last = PlanStatus::Running;
        for tick in 1..=ticks {
            let mut ctx = AgentContext {
                world: &mut *world,
                tick,
                mailbox: &mut mailbox,
                status: &mut status,
            };
            last = exec.tick(&mut driver, &mut ctx);
            if matches!(last, PlanStatus::Complete(_)) {
                break;
            }
        }
        last
    }

    #[test]
    fn place_uses_substitute_material() {
        let mut world = GridWorld::flat(6);
        world.give("dirt", 2).unwrap();
        let target = Position::new(1, 1, 1);
        let status = run(&mut world, vec![Step::place(target, Some(ItemKind::from("cobblestone")))], 10);
        assert!(matches!(status, PlanStatus::Complete(s) if s.succeeded == 1));
        assert_eq!(world.query_block(target).unwrap().kind, ItemKind::from("dirt"));
    }

    #[test]
    fn floating_cell_gets_a_support_first() {
        let mut world = GridWorld::flat(6);
        world.give("cobblestone", 4).unwrap();
        let target = Position::new(2, 2, 0);
        let status = run(&mut world, vec![Step::place(target, None)], 10);
        assert!(matches!(status, PlanStatus::Complete(s) if s.succeeded == 1));
        assert!(world.is_solid(target));
        assert!(world.is_solid(Position::new(2, 1, 0)));
        assert_eq!(world.held("cobblestone"), 2);
    }

    #[test]
    fn far_target_is_approached_before_acting() {
        let mut world = GridWorld::flat(12);
        let target = Position::new(10, 1, 0);
        world.set_block(target, BlockDescriptor::solid("stone"));
        let status = run(&mut world, vec![Step::dig(target)], 10);
        assert!(matches!(status, PlanStatus::Complete(s) if s.succeeded == 1));
        assert_eq!(world.held("cobblestone"), 1);
        assert!(world.position().chebyshev(target) <= 4);
    }

    #[test]
    fn digging_a_clear_cell_is_already_done() {
        let mut world = GridWorld::flat(6);
        let stone = Position::new(1, 1, 0);
        world.set_block(stone, BlockDescriptor::solid("stone"));
        let steps = vec![Step::dig(Position::new(2, 1, 0)), Step::dig(stone)];
        let status = run(&mut world, steps, 10);
        assert!(matches!(
            status,
            PlanStatus::Complete(s) if s.succeeded == 2 && s.already_done == 1
        ));
        assert_eq!(world.held("cobblestone"), 1);
    }

    #[test]
    fn phantom_placement_fails_verification_and_is_dropped() {
        let mut world = GridWorld::flat(6);
        world.give("cobblestone", 8).unwrap();
        let target = Position::new(1, 1, 0);
        world.phantom_at(target);
        let status = run(&mut world, vec![Step::place(target, None)], 20);
        assert!(matches!(status, PlanStatus::Complete(s) if s.dropped == 1 && s.succeeded == 0));
    }

    #[test]
    fn sow_needs_seeds() {
        let mut world = GridWorld::flat(6);
        world.set_block(Position::new(1, 0, 0), BlockDescriptor::solid("farmland"));
        let step = Step::new(ActionKind::Sow, Some(Position::new(1, 1, 0)), None);
        let status = run(&mut world, vec![step.clone()], 10);
        assert!(matches!(status, PlanStatus::Complete(s) if s.dropped == 1));

        world.give("wheat_seeds", 1).unwrap();
        let status = run(&mut world, vec![step], 10);
        assert!(matches!(status, PlanStatus::Complete(s) if s.succeeded == 1));
        assert!(world.query_block(Position::new(1, 1, 0)).unwrap().growth.is_some());
    }
}
