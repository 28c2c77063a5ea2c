//! Error types for the `blockwright-world` crate.
//!
//! Every world action resolves to either an [`ActionOutput`] or one of these
//! errors. The orchestration core classifies them into retryable step
//! failures; nothing in this crate panics on a bad request.
//!
//! [`ActionOutput`]: crate::action::ActionOutput

use blockwright_types::{EntityId, ItemKind, Position};

/// Errors reported by the world when an action cannot be carried out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// The chunk holding this position is not loaded.
    #[error("position {0} is not loaded")]
    Unloaded(Position),

    /// No path leads to the requested position.
    #[error("no path to {0}")]
    NoPath(Position),

    /// The action did not resolve in time.
    #[error("action timed out")]
    Timeout,

    /// The agent does not hold enough of an item.
    #[error("missing item: needed {needed} of {item}, holding {held}")]
    MissingItem {
        /// Item required.
        item: ItemKind,
        /// Quantity required.
        needed: u32,
        /// Quantity actually held.
        held: u32,
    },

    /// The reference block for a placement is not solid.
    #[error("no solid reference block at {0}")]
    NoReference(Position),

    /// The cell to place into is already occupied.
    #[error("cell {0} is occupied")]
    Occupied(Position),

    /// There is nothing to break at the position.
    #[error("nothing to break at {0}")]
    NothingToBreak(Position),

    /// A crafting station was required but none is usable.
    #[error("no usable crafting station")]
    StationMissing,

    /// The requested entity is not present.
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),

    /// The target refused the request.
    #[error("rejected: {reason}")]
    Rejected {
        /// Description of why the world refused the action.
        reason: String,
    },

    /// An internal counter overflowed.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// Description of what was being computed.
        context: String,
    },
}
