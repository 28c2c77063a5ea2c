//! Human-readable status messages.
//!
//! Terminal events (a step dropped, a plan stuck, a goal unreachable or
//! finished) and cadence-based progress reports are posted here exactly
//! once each. Transient retries are logged at debug level only and never
//! reach the status log.

use std::collections::VecDeque;

use blockwright_types::StateKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// What a status message reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// A step exhausted its retries and left its plan.
    StepDropped,
    /// A full pass over a plan made no progress.
    PlanStuck,
    /// A goal cannot be reached.
    GoalUnreachable,
    /// A goal was completed.
    GoalComplete,
    /// Periodic plan progress.
    Progress,
    /// Anything else worth telling the owner.
    Info,
}

impl StatusKind {
    const fn is_failure(self) -> bool {
        matches!(self, Self::StepDropped | Self::PlanStuck | Self::GoalUnreachable)
    }
}

/// One status message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    /// Controller tick when posted.
    pub tick: u64,
    /// Wall-clock time when posted.
    pub at: DateTime<Utc>,
    /// State that posted it.
    pub state: StateKind,
    /// Category.
    pub kind: StatusKind,
    /// Message text.
    pub text: String,
}

impl core::fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{} {}] {}", self.tick, self.state, self.text)
    }
}

/// Bounded log of recent status messages.
#[derive(Debug, Clone)]
pub struct StatusLog {
    messages: VecDeque<StatusMessage>,
    capacity: usize,
    total: u64,
}

impl StatusLog {
    /// A log keeping at most `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
            total: 0,
        }
    }

    /// Record a message and mirror it to the tracing output.
    pub fn post(&mut self, tick: u64, state: StateKind, kind: StatusKind, text: impl Into<String>) {
        let text = text.into();
        if kind.is_failure() {
            warn!(tick, state = %state, kind = ?kind, "{text}");
        } else {
            info!(tick, state = %state, kind = ?kind, "{text}");
        }
        if self.messages.len() >= self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(StatusMessage {
            tick,
            at: Utc::now(),
            state,
            kind,
            text,
        });
        self.total = self.total.saturating_add(1);
    }

    /// Retained messages, oldest first.
    pub fn messages(&self) -> impl Iterator<Item = &StatusMessage> {
        self.messages.iter()
    }

    /// The newest message.
    pub fn latest(&self) -> Option<&StatusMessage> {
        self.messages.back()
    }

    /// Retained messages of one kind.
    pub fn count_of(&self, kind: StatusKind) -> usize {
        self.messages.iter().filter(|m| m.kind == kind).count()
    }

    /// Messages posted since creation, including evicted ones.
    pub const fn total(&self) -> u64 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oldest_messages_are_evicted() {
        let mut log = StatusLog::new(2);
        log.post(1, StateKind::Build, StatusKind::Progress, "25%");
        log.post(2, StateKind::Build, StatusKind::Progress, "50%");
        log.post(3, StateKind::Build, StatusKind::GoalComplete, "done");
        let ticks: Vec<u64> = log.messages().map(|m| m.tick).collect();
        assert_eq!(ticks, vec![2, 3]);
        assert_eq!(log.total(), 3);
        assert_eq!(log.count_of(StatusKind::Progress), 1);
        assert_eq!(log.latest().map(|m| m.text.as_str()), Some("done"));
    }

    #[test]
    fn display_names_the_state() {
        let mut log = StatusLog::new(4);
        log.post(7, StateKind::Craft, StatusKind::Info, "hello");
        assert_eq!(log.latest().map(ToString::to_string).as_deref(), Some("[7 craft] hello"));
    }
}
