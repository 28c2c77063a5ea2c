//! Plan-driven task states.
//!
//! A [`Task`] knows how to turn its goal into steps and how to judge a
//! finished or stuck plan. [`TaskState`] does everything else: it holds the
//! goal, runs the executor, counts re-plans and hand-offs, and posts the
//! terminal status message.

use blockwright_behaviors::farming::mature_crops;
use blockwright_behaviors::fishing::{ROD, cast_steps, find_water};
use blockwright_behaviors::gather::{dig_steps, select_targets};
use blockwright_behaviors::placement::{default_ranking, materials_held};
use blockwright_behaviors::structure::plan_build;
use blockwright_behaviors::trade::{barter_step, nearest_trader};
use blockwright_behaviors::{BehaviorError, SiteSearch, explore, farming};
use blockwright_types::{Directive, Goal, GoalId, ItemKind, Position, StateKind, Step};
use blockwright_world::inventory::{count_of, totals};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use super::{State, TaskOutcome, task_may_start};
use crate::config::AgentConfig;
use crate::context::{AgentContext, Shared, TransitionView};
use crate::driver::StandardDriver;
use crate::executor::{Executor, PlanStatus, PlanSummary};
use crate::status::StatusKind;

/// Arrival radius for exploration waypoints.
const WAYPOINT_TOLERANCE: u32 = 2;

/// Most crops tended in one farming pass.
const FARM_PASS_LIMIT: usize = 16;

/// What to do after a plan completed or got stuck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The goal is met.
    Done(String),
    /// Plan again from the current world.
    Replan,
    /// Keep the current plan; its failing steps run out their retries.
    Continue,
    /// Hand a sub-goal to another state first; keep this goal pending.
    Handoff {
        /// The sub-goal.
        goal: Goal,
        /// Status text explaining the detour.
        reason: String,
    },
    /// Give the goal up.
    Fail(String),
}

/// The goal-specific half of a task state.
pub trait Task {
    /// State this task runs in.
    const KIND: StateKind;

    /// Whether `goal` belongs to this task.
    fn accepts(goal: &Goal) -> bool;

    /// Reset per-goal bookkeeping when a new goal is accepted.
    fn begin(&mut self, _goal: &Goal, _ctx: &mut AgentContext<'_>) {}

    /// Steps for the current world.
    ///
    /// # Errors
    ///
    /// Returns [`BehaviorError`] when no plan can be made.
    fn plan(
        &mut self,
        goal: &Goal,
        config: &AgentConfig,
        ctx: &mut AgentContext<'_>,
    ) -> Result<Vec<Step>, BehaviorError>;

    /// Judge a plan that completed or got stuck.
    fn evaluate(
        &mut self,
        goal: &Goal,
        summary: &PlanSummary,
        stuck: bool,
        config: &AgentConfig,
        ctx: &mut AgentContext<'_>,
    ) -> Verdict;
}

fn mismatch(goal: &Goal) -> BehaviorError {
    BehaviorError::unreachable(goal.to_string(), "goal handed to the wrong task")
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// A state that pursues its goal through a step plan.
pub struct TaskState<T: Task> {
    task: T,
    shared: Shared,
    driver: StandardDriver,
    goal: Option<Goal>,
    goal_id: Option<GoalId>,
    executor: Option<Executor>,
    replans: u32,
    handoffs: u32,
    outcome: TaskOutcome,
}

impl<T: Task> TaskState<T> {
    /// Wrap `task`.
    pub fn new(task: T, shared: Shared) -> Self {
        let driver = StandardDriver::from_config(&shared.config);
        Self {
            task,
            shared,
            driver,
            goal: None,
            goal_id: None,
            executor: None,
            replans: 0,
            handoffs: 0,
            outcome: TaskOutcome::Running,
        }
    }

    fn drop_plan(&mut self) {
        if let Some(mut exec) = self.executor.take() {
            exec.cancel();
            debug!(
                state = %T::KIND,
                goal_id = ?self.goal_id,
                plan = %exec.plan_id(),
                "plan discarded"
            );
        }
    }

    fn fail(&mut self, goal: &Goal, reason: &str, ctx: &mut AgentContext<'_>) {
        ctx.report(
            T::KIND,
            StatusKind::GoalUnreachable,
            format!("cannot {goal}: {reason}"),
        );
        self.drop_plan();
        self.goal = None;
        self.outcome = TaskOutcome::Failed { fallback: None };
    }

    fn apply(&mut self, goal: &Goal, verdict: Verdict, ctx: &mut AgentContext<'_>) {
        let config = &self.shared.config;
        match verdict {
            Verdict::Done(text) => {
                ctx.report(T::KIND, StatusKind::GoalComplete, text);
                self.drop_plan();
                self.goal = None;
                self.outcome = TaskOutcome::Finished;
            }
            Verdict::Replan => {
                self.replans = self.replans.saturating_add(1);
                if self.replans > config.gather.max_replans {
                    let reason = format!("no progress after {} re-plans", self.replans);
                    self.fail(goal, &reason, ctx);
                } else {
                    info!(state = %T::KIND, replans = self.replans, "re-planning");
                    self.drop_plan();
                }
            }
            Verdict::Continue => {
                debug!(state = %T::KIND, "plan stuck, letting retries run out");
            }
            Verdict::Handoff { goal: sub, reason } => {
                if self.handoffs >= config.crafting.max_gather_handoffs {
                    self.fail(goal, &reason, ctx);
                    return;
                }
                self.handoffs = self.handoffs.saturating_add(1);
                ctx.report(T::KIND, StatusKind::Info, reason);
                self.drop_plan();
                ctx.mailbox.post(Directive::Assign { goal: sub });
            }
            Verdict::Fail(reason) => self.fail(goal, &reason, ctx),
        }
    }
}

impl<T: Task> State for TaskState<T> {
    fn kind(&self) -> StateKind {
        T::KIND
    }

    fn on_enter(&mut self, _ctx: &mut AgentContext<'_>) {
        self.outcome = TaskOutcome::Running;
    }

    fn on_exit(&mut self, _ctx: &mut AgentContext<'_>) {
        self.drop_plan();
    }

    fn update(&mut self, ctx: &mut AgentContext<'_>) {
        if self.outcome != TaskOutcome::Running {
            return;
        }
        let Some(goal) = self.goal.clone() else {
            self.outcome = TaskOutcome::Finished;
            return;
        };
        if self.executor.is_none() {
            match self.task.plan(&goal, &self.shared.config, ctx) {
                Ok(steps) => {
                    self.executor = Some(Executor::new(T::KIND, steps, &self.shared.config.executor));
                }
                Err(err) => {
                    let reason = err.to_string();
                    self.fail(&goal, &reason, ctx);
                    return;
                }
            }
        }
        let Some(exec) = self.executor.as_mut() else {
            return;
        };
        let (summary, stuck) = match exec.tick(&mut self.driver, ctx) {
            PlanStatus::Running => return,
            PlanStatus::Complete(summary) => (summary, false),
            PlanStatus::Stuck(summary) => (summary, true),
        };
        let config = self.shared.config.clone();
        let verdict = self.task.evaluate(&goal, &summary, stuck, &config, ctx);
        self.apply(&goal, verdict, ctx);
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
        if !T::accepts(&goal) {
            return false;
        }
        self.drop_plan();
        self.task.begin(&goal, ctx);
        let goal_id = GoalId::new();
        info!(state = %T::KIND, %goal_id, %goal, "goal accepted");
        self.goal = Some(goal);
        self.goal_id = Some(goal_id);
        self.replans = 0;
        self.handoffs = 0;
        self.outcome = TaskOutcome::Running;
        true
    }

    fn cancel(&mut self) {
        self.drop_plan();
        self.goal = None;
    }

    fn goal(&self) -> Option<&Goal> {
        self.goal.as_ref()
    }

    fn plan(&self) -> Option<&Executor> {
        self.executor.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

/// Places a structure. Remembers its anchor so a resumed build continues at
/// the same site.
#[derive(Debug, Default)]
pub struct BuildTask {
    anchor: Option<Position>,
}

impl Task for BuildTask {
    const KIND: StateKind = StateKind::Build;

    fn accepts(goal: &Goal) -> bool {
        matches!(goal, Goal::Build { .. })
    }

    fn begin(&mut self, _goal: &Goal, _ctx: &mut AgentContext<'_>) {
        self.anchor = None;
    }

    fn plan(
        &mut self,
        goal: &Goal,
        config: &AgentConfig,
        ctx: &mut AgentContext<'_>,
    ) -> Result<Vec<Step>, BehaviorError> {
        let Goal::Build { kind, dimensions } = goal else {
            return Err(mismatch(goal));
        };
        let search = SiteSearch {
            radius: config.build.search_radius,
            max_surface_drop: config.build.max_surface_drop,
        };
        let plan = plan_build(
            &*ctx.world,
            *kind,
            *dimensions,
            self.anchor,
            search,
            config.build.materials.first(),
        );
        if plan.steps.is_empty() {
            return Err(BehaviorError::unreachable(goal.to_string(), "layout is empty"));
        }
        info!(
            %kind,
            anchor = %plan.anchor,
            cleared = plan.cleared,
            steps = plan.steps.len(),
            resumed = self.anchor.is_some(),
            "build planned"
        );
        self.anchor = Some(plan.anchor);
        Ok(plan.steps)
    }

    fn evaluate(
        &mut self,
        goal: &Goal,
        summary: &PlanSummary,
        stuck: bool,
        config: &AgentConfig,
        ctx: &mut AgentContext<'_>,
    ) -> Verdict {
        if stuck {
            let ranking = if config.build.materials.is_empty() {
                default_ranking()
            } else {
                config.build.materials.clone()
            };
            let held = totals(&ctx.world.query_inventory());
            if materials_held(&held, &ranking) > 0 {
                return Verdict::Continue;
            }
            let item = ranking
                .first()
                .cloned()
                .unwrap_or_else(|| ItemKind::from("cobblestone"));
            let count = saturating_u32(summary.remaining);
            return Verdict::Handoff {
                reason: format!("out of building blocks, gathering {count} {item} first"),
                goal: Goal::Gather { item, count },
            };
        }
        if summary.succeeded == 0 {
            return Verdict::Fail(String::from("no block could be placed"));
        }
        let anchor = self
            .anchor
            .map_or_else(|| String::from("?"), |a| a.to_string());
        Verdict::Done(format!(
            "{goal} at {anchor} done: {}/{} blocks placed ({}%)",
            summary.succeeded,
            summary.initial,
            summary.success_pct()
        ))
    }
}

// ---------------------------------------------------------------------------
// Mining
// ---------------------------------------------------------------------------

/// Digs out blocks of one kind.
#[derive(Debug, Default)]
pub struct MiningTask {
    dug: u32,
}

impl Task for MiningTask {
    const KIND: StateKind = StateKind::Mining;

    fn accepts(goal: &Goal) -> bool {
        matches!(goal, Goal::Mine { .. })
    }

    fn begin(&mut self, _goal: &Goal, _ctx: &mut AgentContext<'_>) {
        self.dug = 0;
    }

    fn plan(
        &mut self,
        goal: &Goal,
        config: &AgentConfig,
        ctx: &mut AgentContext<'_>,
    ) -> Result<Vec<Step>, BehaviorError> {
        let Goal::Mine { block, count } = goal else {
            return Err(mismatch(goal));
        };
        let remaining = count.saturating_sub(self.dug);
        let radius = config.gather.search_radius;
        let targets = ctx
            .world
            .find_nearest_of_kind(block, radius, usize::try_from(remaining).unwrap_or(usize::MAX));
        if targets.is_empty() {
            return Err(BehaviorError::unreachable(
                goal.to_string(),
                format!("no {block} within {radius} blocks"),
            ));
        }
        Ok(dig_steps(&targets))
    }

    fn evaluate(
        &mut self,
        goal: &Goal,
        summary: &PlanSummary,
        _stuck: bool,
        _config: &AgentConfig,
        _ctx: &mut AgentContext<'_>,
    ) -> Verdict {
        let Goal::Mine { block, count } = goal else {
            return Verdict::Fail(mismatch(goal).to_string());
        };
        // Cells that were already clear were not dug by us.
        let broken = summary.succeeded.saturating_sub(summary.already_done);
        self.dug = self.dug.saturating_add(saturating_u32(broken));
        if self.dug >= *count {
            Verdict::Done(format!("mined {} {block}", self.dug))
        } else {
            Verdict::Replan
        }
    }
}

// ---------------------------------------------------------------------------
// Gather
// ---------------------------------------------------------------------------

/// Collects more of an item by breaking its source blocks.
#[derive(Debug, Default)]
pub struct GatherTask {
    target: u32,
}

impl Task for GatherTask {
    const KIND: StateKind = StateKind::Gather;

    fn accepts(goal: &Goal) -> bool {
        matches!(goal, Goal::Gather { .. })
    }

    fn begin(&mut self, goal: &Goal, ctx: &mut AgentContext<'_>) {
        if let Goal::Gather { item, count } = goal {
            let held = count_of(&ctx.world.query_inventory(), item);
            self.target = held.saturating_add(*count);
        }
    }

    fn plan(
        &mut self,
        goal: &Goal,
        config: &AgentConfig,
        ctx: &mut AgentContext<'_>,
    ) -> Result<Vec<Step>, BehaviorError> {
        let Goal::Gather { item, .. } = goal else {
            return Err(mismatch(goal));
        };
        let held = count_of(&ctx.world.query_inventory(), item);
        let remaining = self.target.saturating_sub(held);
        if remaining == 0 {
            return Ok(Vec::new());
        }
        let radius = config.gather.search_radius;
        let targets = select_targets(
            &*ctx.world,
            item,
            radius,
            usize::try_from(remaining).unwrap_or(usize::MAX),
        );
        if targets.is_empty() {
            return Err(BehaviorError::unreachable(
                goal.to_string(),
                format!("no source of {item} within {radius} blocks"),
            ));
        }
        Ok(dig_steps(&targets))
    }

    fn evaluate(
        &mut self,
        goal: &Goal,
        _summary: &PlanSummary,
        _stuck: bool,
        _config: &AgentConfig,
        ctx: &mut AgentContext<'_>,
    ) -> Verdict {
        let Goal::Gather { item, .. } = goal else {
            return Verdict::Fail(mismatch(goal).to_string());
        };
        let held = count_of(&ctx.world.query_inventory(), item);
        if held >= self.target {
            Verdict::Done(format!("gathered {item}, holding {held}"))
        } else {
            Verdict::Replan
        }
    }
}

// ---------------------------------------------------------------------------
// Farm
// ---------------------------------------------------------------------------

/// One pass of harvesting and replanting mature crops.
#[derive(Debug, Default)]
pub struct FarmTask;

impl Task for FarmTask {
    const KIND: StateKind = StateKind::Farm;

    fn accepts(goal: &Goal) -> bool {
        matches!(goal, Goal::Farm)
    }

    fn plan(
        &mut self,
        goal: &Goal,
        config: &AgentConfig,
        ctx: &mut AgentContext<'_>,
    ) -> Result<Vec<Step>, BehaviorError> {
        let radius = config.gather.search_radius;
        let crops = mature_crops(&*ctx.world, radius, FARM_PASS_LIMIT);
        if crops.is_empty() {
            return Err(BehaviorError::unreachable(
                goal.to_string(),
                format!("no mature crops within {radius} blocks"),
            ));
        }
        Ok(farming::harvest_steps(&*ctx.world, &crops))
    }

    fn evaluate(
        &mut self,
        _goal: &Goal,
        summary: &PlanSummary,
        _stuck: bool,
        _config: &AgentConfig,
        _ctx: &mut AgentContext<'_>,
    ) -> Verdict {
        if summary.succeeded == 0 {
            return Verdict::Fail(String::from("nothing harvested"));
        }
        Verdict::Done(format!(
            "farm pass done: {}/{} harvest and sow steps",
            summary.succeeded, summary.initial
        ))
    }
}

// ---------------------------------------------------------------------------
// Fish
// ---------------------------------------------------------------------------

/// Casts into the nearest water until enough catches landed.
#[derive(Debug, Default)]
pub struct FishTask {
    caught: u32,
}

impl Task for FishTask {
    const KIND: StateKind = StateKind::Fish;

    fn accepts(goal: &Goal) -> bool {
        matches!(goal, Goal::Fish { .. })
    }

    fn begin(&mut self, _goal: &Goal, _ctx: &mut AgentContext<'_>) {
        self.caught = 0;
    }

    fn plan(
        &mut self,
        goal: &Goal,
        config: &AgentConfig,
        ctx: &mut AgentContext<'_>,
    ) -> Result<Vec<Step>, BehaviorError> {
        let Goal::Fish { catches } = goal else {
            return Err(mismatch(goal));
        };
        if count_of(&ctx.world.query_inventory(), &ItemKind::from(ROD)) == 0 {
            return Err(BehaviorError::unreachable(goal.to_string(), "no fishing rod held"));
        }
        let radius = config.gather.search_radius;
        let Some(water) = find_water(&*ctx.world, radius) else {
            return Err(BehaviorError::unreachable(
                goal.to_string(),
                format!("no water within {radius} blocks"),
            ));
        };
        Ok(cast_steps(water, catches.saturating_sub(self.caught)))
    }

    fn evaluate(
        &mut self,
        goal: &Goal,
        summary: &PlanSummary,
        _stuck: bool,
        _config: &AgentConfig,
        _ctx: &mut AgentContext<'_>,
    ) -> Verdict {
        let Goal::Fish { catches } = goal else {
            return Verdict::Fail(mismatch(goal).to_string());
        };
        self.caught = self.caught.saturating_add(saturating_u32(summary.succeeded));
        if self.caught >= *catches {
            Verdict::Done(format!("caught {} fish", self.caught))
        } else {
            Verdict::Replan
        }
    }
}

// ---------------------------------------------------------------------------
// Trade
// ---------------------------------------------------------------------------

/// One exchange with the nearest trader.
#[derive(Debug, Default)]
pub struct TradeTask;

impl Task for TradeTask {
    const KIND: StateKind = StateKind::Trade;

    fn accepts(goal: &Goal) -> bool {
        matches!(goal, Goal::Trade { .. })
    }

    fn plan(
        &mut self,
        goal: &Goal,
        config: &AgentConfig,
        ctx: &mut AgentContext<'_>,
    ) -> Result<Vec<Step>, BehaviorError> {
        let Goal::Trade { give, want } = goal else {
            return Err(mismatch(goal));
        };
        if count_of(&ctx.world.query_inventory(), give) == 0 {
            return Err(BehaviorError::unreachable(
                goal.to_string(),
                format!("no {give} to offer"),
            ));
        }
        let radius = config.gather.search_radius;
        let Some(trader) = nearest_trader(&*ctx.world, radius) else {
            return Err(BehaviorError::unreachable(
                goal.to_string(),
                format!("no trader within {radius} blocks"),
            ));
        };
        Ok(vec![barter_step(trader.position, give, want)])
    }

    fn evaluate(
        &mut self,
        goal: &Goal,
        summary: &PlanSummary,
        _stuck: bool,
        _config: &AgentConfig,
        _ctx: &mut AgentContext<'_>,
    ) -> Verdict {
        if summary.succeeded == 0 {
            return Verdict::Fail(String::from("the trader refused"));
        }
        Verdict::Done(format!("{goal} done"))
    }
}

// ---------------------------------------------------------------------------
// Explore
// ---------------------------------------------------------------------------

/// Walks a seeded random route.
#[derive(Debug)]
pub struct ExploreTask {
    rng: StdRng,
}

impl ExploreTask {
    /// A task whose routes are reproducible from `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Task for ExploreTask {
    const KIND: StateKind = StateKind::Explore;

    fn accepts(goal: &Goal) -> bool {
        matches!(goal, Goal::Explore { .. })
    }

    fn plan(
        &mut self,
        goal: &Goal,
        config: &AgentConfig,
        ctx: &mut AgentContext<'_>,
    ) -> Result<Vec<Step>, BehaviorError> {
        let Goal::Explore { waypoints } = goal else {
            return Err(mismatch(goal));
        };
        if *waypoints == 0 {
            return Err(BehaviorError::unreachable(goal.to_string(), "no waypoints requested"));
        }
        let origin = ctx.world.position();
        Ok(explore::waypoints(&mut self.rng, origin, config.explore.radius, *waypoints)
            .into_iter()
            .map(|p| Step::approach(p, WAYPOINT_TOLERANCE))
            .collect())
    }

    fn evaluate(
        &mut self,
        _goal: &Goal,
        summary: &PlanSummary,
        _stuck: bool,
        _config: &AgentConfig,
        _ctx: &mut AgentContext<'_>,
    ) -> Verdict {
        if summary.succeeded == 0 {
            return Verdict::Fail(String::from("no waypoint was reachable"));
        }
        Verdict::Done(format!(
            "visited {}/{} waypoints",
            summary.succeeded, summary.initial
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use blockwright_behaviors::RecipeBook;
    use blockwright_types::{BlockDescriptor, EntityCategory, PlanId, StructureKind};
    use blockwright_world::GridWorld;

    use super::*;
    use crate::context::Mailbox;
    use crate::status::StatusLog;

    struct Bench {
        world: GridWorld,
        mailbox: Mailbox,
        status: StatusLog,
        tick: u64,
    }

    impl Bench {
        fn new(world: GridWorld) -> Self {
            Self {
                world,
                mailbox: Mailbox::new(),
                status: StatusLog::new(64),
                tick: 0,
            }
        }

        fn assign(&mut self, state: &mut dyn State, goal: Goal) -> bool {
            let mut ctx = AgentContext {
                world: &mut self.world,
                tick: self.tick,
                mailbox: &mut self.mailbox,
                status: &mut self.status,
            };
            state.assign(goal, &mut ctx)
        }

        fn run(&mut self, state: &mut dyn State, limit: u64) -> TaskOutcome {
            for _ in 0..limit {
                self.tick += 1;
                let mut ctx = AgentContext {
                    world: &mut self.world,
                    tick: self.tick,
                    mailbox: &mut self.mailbox,
                    status: &mut self.status,
                };
                state.update(&mut ctx);
                if state.outcome() != TaskOutcome::Running {
                    return state.outcome();
                }
            }
            state.outcome()
        }
    }

    fn shared() -> Shared {
        Shared::new(AgentConfig::default(), RecipeBook::standard())
    }

    #[test]
    fn gather_collects_the_requested_surplus() {
        let mut world = GridWorld::flat(10);
        world.give("log", 1).unwrap();
        for x in 2..5 {
            world.set_block(Position::new(x, 1, 3), BlockDescriptor::solid("oak_log"));
        }
        let mut bench = Bench::new(world);
        let mut state = TaskState::new(GatherTask::default(), shared());
        assert!(bench.assign(
            &mut state,
            Goal::Gather {
                item: ItemKind::from("log"),
                count: 2
            }
        ));
        assert_eq!(bench.run(&mut state, 50), TaskOutcome::Finished);
        assert_eq!(bench.world.held("log"), 3);
        assert!(state.goal().is_none());
        assert_eq!(bench.status.count_of(StatusKind::GoalComplete), 1);
    }

    #[test]
    fn gather_without_sources_is_unreachable() {
        let mut bench = Bench::new(GridWorld::flat(6));
        let mut state = TaskState::new(GatherTask::default(), shared());
        bench.assign(
            &mut state,
            Goal::Gather {
                item: ItemKind::from("raw_iron"),
                count: 1,
            },
        );
        assert_eq!(
            bench.run(&mut state, 5),
            TaskOutcome::Failed { fallback: None }
        );
        assert_eq!(bench.status.count_of(StatusKind::GoalUnreachable), 1);
    }

    #[test]
    fn state_rejects_foreign_goals() {
        let mut bench = Bench::new(GridWorld::flat(4));
        let mut state = TaskState::new(FarmTask, shared());
        assert!(!bench.assign(&mut state, Goal::Fish { catches: 1 }));
        assert!(state.goal().is_none());
    }

    #[test]
    fn resumed_build_keeps_its_anchor() {
        let mut world = GridWorld::flat(10);
        world.give("cobblestone", 20).unwrap();
        let mut bench = Bench::new(world);
        let mut state = TaskState::new(BuildTask::default(), shared());
        bench.assign(
            &mut state,
            Goal::Build {
                kind: StructureKind::Wall,
                dimensions: None,
            },
        );
        bench.run(&mut state, 2);
        let first: Vec<Step> = state.plan().unwrap().steps().cloned().collect();

        // Leaving the state discards the plan but not the goal.
        let mut ctx = AgentContext {
            world: &mut bench.world,
            tick: bench.tick,
            mailbox: &mut bench.mailbox,
            status: &mut bench.status,
        };
        state.on_exit(&mut ctx);
        state.on_enter(&mut ctx);
        assert!(state.plan().is_none());
        assert!(state.goal().is_some());

        bench.run(&mut state, 1);
        let resumed = state.plan().unwrap();
        assert_eq!(resumed.summary().initial, 15);
        assert_eq!(resumed.steps().last(), first.last());
    }

    #[test]
    fn build_without_blocks_hands_off_to_gather() {
        let mut bench = Bench::new(GridWorld::flat(10));
        let mut state = TaskState::new(BuildTask::default(), shared());
        bench.assign(
            &mut state,
            Goal::Build {
                kind: StructureKind::Wall,
                dimensions: None,
            },
        );
        for _ in 0..40 {
            bench.run(&mut state, 1);
            if !bench.mailbox.is_empty() {
                break;
            }
        }
        let posted = bench.mailbox.drain();
        assert!(matches!(
            posted.as_slice(),
            [Directive::Assign { goal: Goal::Gather { item, .. } }] if item.as_str() == "cobblestone"
        ));
        assert!(state.goal().is_some());
    }

    #[test]
    fn mining_counts_only_blocks_actually_broken() {
        let mut bench = Bench::new(GridWorld::flat(4));
        let mut task = MiningTask::default();
        let goal = Goal::Mine {
            block: ItemKind::from("stone"),
            count: 2,
        };
        let summary = PlanSummary {
            plan_id: PlanId::new(),
            initial: 3,
            succeeded: 3,
            already_done: 2,
            dropped: 0,
            remaining: 0,
        };
        let config = AgentConfig::default();
        let mut ctx = AgentContext {
            world: &mut bench.world,
            tick: 1,
            mailbox: &mut bench.mailbox,
            status: &mut bench.status,
        };
        task.begin(&goal, &mut ctx);
        assert_eq!(task.evaluate(&goal, &summary, false, &config, &mut ctx), Verdict::Replan);
        assert_eq!(task.dug, 1);
        let summary = PlanSummary {
            already_done: 0,
            ..summary
        };
        assert!(matches!(
            task.evaluate(&goal, &summary, false, &config, &mut ctx),
            Verdict::Done(_)
        ));
    }

    #[test]
    fn fishing_counts_catches() {
        let mut world = GridWorld::flat(8);
        world.give("fishing_rod", 1).unwrap();
        world.set_cast_latency(1);
        world.set_block(Position::new(3, 0, 3), BlockDescriptor::passable("water"));
        let mut bench = Bench::new(world);
        let mut state = TaskState::new(FishTask::default(), shared());
        bench.assign(&mut state, Goal::Fish { catches: 2 });
        assert_eq!(bench.run(&mut state, 30), TaskOutcome::Finished);
        assert_eq!(bench.world.held("cod"), 2);
    }

    #[test]
    fn trade_needs_a_trader() {
        let mut world = GridWorld::flat(8);
        world.give("emerald", 2).unwrap();
        world.add_trade_offer("emerald", 1, "bread", 2);
        let mut bench = Bench::new(world);
        let mut state = TaskState::new(TradeTask, shared());
        let goal = Goal::Trade {
            give: ItemKind::from("emerald"),
            want: ItemKind::from("bread"),
        };
        bench.assign(&mut state, goal.clone());
        assert_eq!(
            bench.run(&mut state, 5),
            TaskOutcome::Failed { fallback: None }
        );

        bench
            .world
            .spawn("villager", EntityCategory::Trader, Position::new(2, 1, 2), None);
        let mut state = TaskState::new(TradeTask, shared());
        bench.assign(&mut state, goal);
        assert_eq!(bench.run(&mut state, 10), TaskOutcome::Finished);
        assert_eq!(bench.world.held("bread"), 2);
    }

    #[test]
    fn explore_visits_every_waypoint() {
        let mut bench = Bench::new(GridWorld::flat(20));
        let mut state = TaskState::new(ExploreTask::new(9), shared());
        bench.assign(&mut state, Goal::Explore { waypoints: 3 });
        assert_eq!(bench.run(&mut state, 20), TaskOutcome::Finished);
        assert_eq!(
            bench.status.latest().map(|m| m.text.as_str()),
            Some("visited 3/3 waypoints")
        );
    }
}
