//! Generic plan executor.
//!
//! An [`Executor`] owns one plan: a queue of [`Step`]s. Each tick it works
//! on the front step through a [`StepDriver`], which turns the step into at
//! most one world action at a time. The executor itself never touches the
//! world; it only sequences what the driver issues.
//!
//! # Failure handling
//!
//! A failed attempt increments the step's retry counter. Below
//! `max_retries` the step moves to the back of the queue; at `max_retries`
//! it is dropped with one status message. A pass is one attempt per step
//! that was queued when the pass began. A pass in which no attempt made
//! progress marks the plan stuck. Stuck is reported once; it is reported
//! again only after some step has made progress in between.
//!
//! # Progress
//!
//! Progress is steps consumed (succeeded or dropped) over the initial step
//! count. It is reported only when it crosses the next multiple of the
//! configured cadence.

use std::collections::VecDeque;

use blockwright_types::{PlanId, StateKind, Step, StepStage};
use blockwright_world::{ActionFuture, ActionResult, WorldError};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::action::{ActionSlot, SlotPoll};
use crate::config::ExecutorConfig;
use crate::context::AgentContext;
use crate::status::StatusKind;

/// Upper bound on driver phases per tick, so an instantly resolving world
/// cannot run a whole plan inside one tick.
const MAX_PHASES_PER_TICK: u32 = 4;

/// Why a step attempt failed. Every variant is retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepFailure {
    /// The inventory lacks a required item.
    #[error("resource shortage: {0}")]
    ResourceShortage(String),

    /// No path to the target, or movement failed.
    #[error("navigation failure: {0}")]
    NavigationFailure(String),

    /// No reference face, or the placed block did not appear.
    #[error("placement failure: {0}")]
    PlacementFailure(String),

    /// The world did not look as expected.
    #[error("world inconsistency: {0}")]
    WorldInconsistency(String),

    /// The action did not resolve within the step timeout.
    #[error("action timed out after {0} ticks")]
    ActionTimeout(u64),
}

impl From<WorldError> for StepFailure {
    fn from(err: WorldError) -> Self {
        let text = err.to_string();
        match err {
            WorldError::NoPath(_) => Self::NavigationFailure(text),
            WorldError::MissingItem { .. } => Self::ResourceShortage(text),
            WorldError::NoReference(_) | WorldError::Occupied(_) => Self::PlacementFailure(text),
            WorldError::Timeout => Self::ActionTimeout(0),
            WorldError::Unloaded(_)
            | WorldError::NothingToBreak(_)
            | WorldError::StationMissing
            | WorldError::EntityNotFound(_)
            | WorldError::Rejected { .. }
            | WorldError::ArithmeticOverflow { .. } => Self::WorldInconsistency(text),
        }
    }
}

/// Where an attempt stands after the driver had its turn.
pub enum Attempt {
    /// An action was issued; wait for it.
    Await(ActionFuture),
    /// The step is done.
    Succeeded,
    /// The target was already in the wanted state; no action was needed.
    AlreadyDone,
    /// The attempt failed.
    Failed(StepFailure),
    /// The attempt changed the world without finishing the step; try the
    /// same step again next tick without counting a retry.
    Again,
}

impl core::fmt::Debug for Attempt {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Await(_) => f.write_str("Await(..)"),
            Self::Succeeded => f.write_str("Succeeded"),
            Self::AlreadyDone => f.write_str("AlreadyDone"),
            Self::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
            Self::Again => f.write_str("Again"),
        }
    }
}

/// Turns steps into world actions.
pub trait StepDriver {
    /// Begin an attempt at `step`.
    fn start(&mut self, step: &mut Step, ctx: &mut AgentContext<'_>) -> Attempt;

    /// Continue after the action issued for `step` resolved.
    fn resume(&mut self, step: &mut Step, result: ActionResult, ctx: &mut AgentContext<'_>) -> Attempt;
}

/// Counts describing a finished (or abandoned) plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanSummary {
    /// Plan identifier.
    pub plan_id: PlanId,
    /// Steps in the plan when it started.
    pub initial: usize,
    /// Steps that succeeded, including those found already done.
    pub succeeded: usize,
    /// Succeeded steps that needed no world action.
    pub already_done: usize,
    /// Steps dropped after exhausting their retries.
    pub dropped: usize,
    /// Steps still queued.
    pub remaining: usize,
}

impl PlanSummary {
    /// Succeeded over initial steps, 1 for an empty plan.
    pub fn success_ratio(&self) -> Decimal {
        ratio(self.succeeded, self.initial)
    }

    /// Success ratio as a whole percentage.
    pub fn success_pct(&self) -> Decimal {
        self.success_ratio()
            .checked_mul(Decimal::ONE_HUNDRED)
            .unwrap_or(Decimal::ONE_HUNDRED)
            .round_dp(0)
    }
}

fn ratio(part: usize, whole: usize) -> Decimal {
    if whole == 0 {
        return Decimal::ONE;
    }
    let part = Decimal::from(u64::try_from(part).unwrap_or(u64::MAX));
    let whole = Decimal::from(u64::try_from(whole).unwrap_or(u64::MAX));
    part.checked_div(whole).unwrap_or(Decimal::ONE)
}

/// Result of one executor tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStatus {
    /// Work remains.
    Running,
    /// The queue is empty.
    Complete(PlanSummary),
    /// A full pass made no progress.
    Stuck(PlanSummary),
}

/// Drives one plan.
#[derive(Debug)]
pub struct Executor {
    plan_id: PlanId,
    owner: StateKind,
    queue: VecDeque<Step>,
    initial: usize,
    succeeded: usize,
    already_done: usize,
    dropped: usize,
    max_retries: u32,
    step_timeout: u64,
    cadence: u32,
    next_report: u32,
    pass_remaining: usize,
    pass_progress: bool,
    stuck_reported: bool,
    slot: ActionSlot,
}

impl Executor {
    /// Start a plan for `owner` with the given steps.
    pub fn new(owner: StateKind, steps: Vec<Step>, config: &ExecutorConfig) -> Self {
        let queue: VecDeque<Step> = steps.into();
        let initial = queue.len();
        let cadence = config.progress_report_pct.clamp(1, 100);
        let plan_id = PlanId::new();
        info!(plan = %plan_id, state = %owner, steps = initial, "plan started");
        Self {
            plan_id,
            owner,
            queue,
            initial,
            succeeded: 0,
            already_done: 0,
            dropped: 0,
            max_retries: config.max_retries.max(1),
            step_timeout: config.step_timeout_ticks,
            cadence,
            next_report: cadence,
            pass_remaining: initial,
            pass_progress: false,
            stuck_reported: false,
            slot: ActionSlot::new(),
        }
    }

    /// Plan identifier.
    pub const fn plan_id(&self) -> PlanId {
        self.plan_id
    }

    /// Steps still queued, front first.
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.queue.iter()
    }

    /// Number of steps still queued.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Whether an action is outstanding.
    pub const fn is_waiting(&self) -> bool {
        self.slot.is_busy()
    }

    /// Current counts.
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            plan_id: self.plan_id,
            initial: self.initial,
            succeeded: self.succeeded,
            already_done: self.already_done,
            dropped: self.dropped,
            remaining: self.queue.len(),
        }
    }

    /// Steps consumed over initial steps.
    pub fn progress(&self) -> Decimal {
        ratio(self.succeeded.saturating_add(self.dropped), self.initial)
    }

    /// Abandon the outstanding action, if any.
    pub fn cancel(&mut self) {
        self.slot.cancel();
        if let Some(step) = self.queue.front_mut() {
            step.stage = StepStage::Pending;
        }
    }

    /// Advance the plan by at most one attempt.
    pub fn tick(&mut self, driver: &mut dyn StepDriver, ctx: &mut AgentContext<'_>) -> PlanStatus {
        for _ in 0..MAX_PHASES_PER_TICK {
            let Some(step) = self.queue.front_mut() else {
                return PlanStatus::Complete(self.summary());
            };
            let attempt = match self.slot.poll(ctx.tick, self.step_timeout) {
                SlotPoll::Pending => return PlanStatus::Running,
                SlotPoll::Empty => driver.start(step, ctx),
                SlotPoll::Ready(result) => driver.resume(step, result, ctx),
                SlotPoll::TimedOut { waited } => Attempt::Failed(StepFailure::ActionTimeout(waited)),
            };
            match attempt {
                Attempt::Await(future) => {
                    self.slot.start(future, ctx.tick);
                }
                Attempt::Succeeded => {
                    self.queue.pop_front();
                    self.succeeded = self.succeeded.saturating_add(1);
                    return self.end_attempt(true, ctx);
                }
                Attempt::AlreadyDone => {
                    self.queue.pop_front();
                    self.succeeded = self.succeeded.saturating_add(1);
                    self.already_done = self.already_done.saturating_add(1);
                    return self.end_attempt(true, ctx);
                }
                Attempt::Failed(failure) => {
                    self.fail_front(&failure, ctx);
                    return self.end_attempt(false, ctx);
                }
                Attempt::Again => {
                    if let Some(step) = self.queue.front_mut() {
                        step.stage = StepStage::Pending;
                    }
                    self.pass_progress = true;
                    self.stuck_reported = false;
                    return PlanStatus::Running;
                }
            }
        }
        PlanStatus::Running
    }

    fn fail_front(&mut self, failure: &StepFailure, ctx: &mut AgentContext<'_>) {
        let Some(mut step) = self.queue.pop_front() else {
            return;
        };
        step.stage = StepStage::Pending;
        step.retries = step.retries.saturating_add(1);
        if step.retries >= self.max_retries {
            self.dropped = self.dropped.saturating_add(1);
            warn!(
                plan = %self.plan_id,
                action = ?step.action,
                target = ?step.target,
                retries = step.retries,
                %failure,
                "step dropped"
            );
            let target = step
                .target
                .map_or_else(|| String::from("no target"), |t| t.to_string());
            ctx.report(
                self.owner,
                StatusKind::StepDropped,
                format!(
                    "gave up on {:?} at {target} after {} attempts: {failure}",
                    step.action, step.retries
                ),
            );
        } else {
            debug!(
                plan = %self.plan_id,
                action = ?step.action,
                retries = step.retries,
                %failure,
                "step deferred"
            );
            self.queue.push_back(step);
        }
    }

    fn end_attempt(&mut self, progressed: bool, ctx: &mut AgentContext<'_>) -> PlanStatus {
        if progressed {
            self.pass_progress = true;
            self.stuck_reported = false;
            self.report_progress(ctx);
        }
        if self.queue.is_empty() {
            let summary = self.summary();
            info!(
                plan = %self.plan_id,
                succeeded = summary.succeeded,
                dropped = summary.dropped,
                "plan complete"
            );
            return PlanStatus::Complete(summary);
        }
        self.pass_remaining = self.pass_remaining.saturating_sub(1);
        if self.pass_remaining == 0 {
            if !self.pass_progress {
                let summary = self.summary();
                if self.stuck_reported {
                    debug!(plan = %self.plan_id, remaining = summary.remaining, "plan still stuck");
                } else {
                    warn!(plan = %self.plan_id, remaining = summary.remaining, "plan stuck");
                    ctx.report(
                        self.owner,
                        StatusKind::PlanStuck,
                        format!(
                            "no progress over a full pass, {} steps left",
                            summary.remaining
                        ),
                    );
                    self.stuck_reported = true;
                }
                self.pass_remaining = self.queue.len();
                return PlanStatus::Stuck(summary);
            }
            self.pass_remaining = self.queue.len();
            self.pass_progress = false;
        }
        PlanStatus::Running
    }

    fn report_progress(&mut self, ctx: &mut AgentContext<'_>) {
        if self.initial == 0 {
            return;
        }
        let consumed = self.succeeded.saturating_add(self.dropped);
        let pct = consumed.saturating_mul(100).checked_div(self.initial).unwrap_or(100);
        let pct = u32::try_from(pct).unwrap_or(100);
        if pct < self.next_report {
            return;
        }
        ctx.report(
            self.owner,
            StatusKind::Progress,
            format!("{pct}% ({consumed}/{})", self.initial),
        );
        let crossed = pct.checked_div(self.cadence).unwrap_or(0);
        self.next_report = crossed.saturating_add(1).saturating_mul(self.cadence);
    }
}
