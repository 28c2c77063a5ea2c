//! Action futures.
//!
//! World actions take an unbounded but finite number of ticks to resolve.
//! Each one is handed back as an [`ActionFuture`] which the caller polls once
//! per tick with a no-op waker. Nothing here spawns tasks: the future only
//! advances when polled, which keeps execution single-threaded and
//! cooperative.

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use blockwright_types::ItemKind;
use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::error::WorldError;

/// What a successful action produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutput {
    /// The action completed with no item output.
    Completed,
    /// The action added items to the inventory.
    Produced {
        /// Item produced.
        item: ItemKind,
        /// Quantity produced.
        count: u32,
    },
}

/// Result of a world action.
pub type ActionResult = Result<ActionOutput, WorldError>;

/// A pending world action.
pub type ActionFuture = LocalBoxFuture<'static, ActionResult>;

/// A future that resolves to a fixed result after a number of polls.
///
/// Used by the grid world to model action latency.
#[derive(Debug)]
pub struct Delayed {
    remaining: u32,
    result: Option<ActionResult>,
}

impl Delayed {
    /// Resolve to `result` after `polls` pending polls.
    pub const fn new(polls: u32, result: ActionResult) -> Self {
        Self {
            remaining: polls,
            result: Some(result),
        }
    }
}

impl Future for Delayed {
    type Output = ActionResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.remaining > 0 {
            self.remaining = self.remaining.saturating_sub(1);
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }
        match self.result.take() {
            Some(result) => Poll::Ready(result),
            None => Poll::Ready(Err(WorldError::Rejected {
                reason: String::from("action polled after completion"),
            })),
        }
    }
}

/// An action that resolves on the first poll.
pub fn ready(result: ActionResult) -> ActionFuture {
    futures::future::ready(result).boxed_local()
}

/// An action that resolves after `polls` pending polls.
pub fn delayed(polls: u32, result: ActionResult) -> ActionFuture {
    Delayed::new(polls, result).boxed_local()
}

/// An action that never resolves.
pub fn stalled() -> ActionFuture {
    futures::future::pending().boxed_local()
}
