//! Error types for the `blockwright-behaviors` crate.
//!
//! Planners never panic on a bad request. When a goal cannot be turned into
//! work they return one of these errors and the owning state decides where
//! to go next.

use blockwright_types::ItemKind;

/// Errors raised while turning a goal into a plan or a craft queue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BehaviorError {
    /// No amount of further work can satisfy the goal.
    #[error("goal unreachable ({goal}): {reason}")]
    GoalUnreachable {
        /// Human-readable goal description.
        goal: String,
        /// Why planning gave up.
        reason: String,
    },

    /// The recipe book has no recipe for the requested item.
    #[error("no recipe produces {0}")]
    NoRecipe(ItemKind),
}

impl BehaviorError {
    /// Shorthand for [`BehaviorError::GoalUnreachable`].
    pub fn unreachable(goal: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::GoalUnreachable {
            goal: goal.into(),
            reason: reason.into(),
        }
    }
}
