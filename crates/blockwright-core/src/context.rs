//! Agent context handed to states.
//!
//! [`Shared`] is the read-only part, injected into every state when the
//! registry is built. [`AgentContext`] is rebuilt by the controller for each
//! call into a state and carries the world, the directive mailbox, and the
//! status log. States never hold a reference to the controller; anything
//! that would change the active state goes through the [`Mailbox`] and is
//! applied at the next tick boundary.

use std::collections::VecDeque;
use std::sync::Arc;

use blockwright_behaviors::RecipeBook;
use blockwright_types::{Directive, StateKind};
use blockwright_world::World;

use crate::config::AgentConfig;
use crate::status::{StatusKind, StatusLog};

/// Read-only configuration and knowledge shared by every state.
#[derive(Debug, Clone)]
pub struct Shared {
    /// Agent configuration.
    pub config: Arc<AgentConfig>,
    /// Known recipes.
    pub recipes: Arc<RecipeBook>,
}

impl Shared {
    /// Bundle configuration and recipes.
    pub fn new(config: AgentConfig, recipes: RecipeBook) -> Self {
        Self {
            config: Arc::new(config),
            recipes: Arc::new(recipes),
        }
    }
}

/// Directives queued for the next tick boundary.
#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    queue: VecDeque<Directive>,
}

impl Mailbox {
    /// An empty mailbox.
    pub const fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Queue a directive.
    pub fn post(&mut self, directive: Directive) {
        self.queue.push_back(directive);
    }

    /// Take every queued directive, oldest first.
    pub fn drain(&mut self) -> Vec<Directive> {
        self.queue.drain(..).collect()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Per-call context for a state.
pub struct AgentContext<'a> {
    /// The world.
    pub world: &'a mut dyn World,
    /// Current controller tick.
    pub tick: u64,
    /// Directives for the next tick boundary.
    pub mailbox: &'a mut Mailbox,
    /// Status messages.
    pub status: &'a mut StatusLog,
}

impl AgentContext<'_> {
    /// Post a status message stamped with the current tick.
    pub fn report(&mut self, state: StateKind, kind: StatusKind, text: impl Into<String>) {
        self.status.post(self.tick, state, kind, text);
    }
}

/// What a transition predicate may look at.
pub struct TransitionView<'a> {
    /// The active state.
    pub active: StateKind,
    /// Ticks since the active state was entered.
    pub dwell_ticks: u64,
    /// Current controller tick.
    pub tick: u64,
    /// Read-only world access.
    pub world: &'a dyn World,
}
