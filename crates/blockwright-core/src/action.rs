//! The single outstanding action of a plan or state.
//!
//! An [`ActionSlot`] holds at most one [`ActionFuture`] and the tick it was
//! issued on. Polling uses a no-op waker: the slot is checked once per tick,
//! never woken. Dropping the slot (or calling [`ActionSlot::cancel`])
//! abandons the future without awaiting it.

use core::task::{Context, Poll};

use blockwright_world::{ActionFuture, ActionResult};
use futures::FutureExt;
use futures::task::noop_waker_ref;

/// What polling the slot produced.
#[derive(Debug)]
pub enum SlotPoll {
    /// No action is outstanding.
    Empty,
    /// The action is still running.
    Pending,
    /// The action resolved; the slot is empty again.
    Ready(ActionResult),
    /// The action exceeded its tick budget and was abandoned.
    TimedOut {
        /// Ticks spent waiting.
        waited: u64,
    },
}

/// Holder for one in-flight action.
#[derive(Default)]
pub struct ActionSlot {
    pending: Option<(ActionFuture, u64)>,
}

impl core::fmt::Debug for ActionSlot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ActionSlot")
            .field("busy", &self.is_busy())
            .field("started_at", &self.pending.as_ref().map(|(_, t)| *t))
            .finish()
    }
}

impl ActionSlot {
    /// An empty slot.
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// Whether an action is outstanding.
    pub const fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Start tracking `future`, issued at `tick`. Any previous action is
    /// abandoned.
    pub fn start(&mut self, future: ActionFuture, tick: u64) {
        self.pending = Some((future, tick));
    }

    /// Poll the outstanding action once.
    ///
    /// A `timeout` of 0 disables the tick budget.
    pub fn poll(&mut self, tick: u64, timeout: u64) -> SlotPoll {
        let Some((future, started)) = self.pending.as_mut() else {
            return SlotPoll::Empty;
        };
        let mut cx = Context::from_waker(noop_waker_ref());
        if let Poll::Ready(result) = future.poll_unpin(&mut cx) {
            self.pending = None;
            return SlotPoll::Ready(result);
        }
        let waited = tick.saturating_sub(*started);
        if timeout > 0 && waited >= timeout {
            self.pending = None;
            return SlotPoll::TimedOut { waited };
        }
        SlotPoll::Pending
    }

    /// Abandon the outstanding action.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
