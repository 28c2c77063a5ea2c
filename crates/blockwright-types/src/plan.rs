//! Plan steps.
//!
//! A [`Step`] is one world-affecting unit of work. Planners produce ordered
//! lists of steps; the executor in `blockwright-core` drives them.

use serde::{Deserialize, Serialize};

use crate::geometry::Position;
use crate::structs::ItemKind;

/// What a step does once the agent is in reach of its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionKind {
    /// Place a block into the target cell.
    Place,
    /// Break the block in the target cell.
    Dig,
    /// Walk to within `tolerance` blocks of the target.
    Approach {
        /// Arrival radius.
        tolerance: u32,
    },
    /// Break a mature crop in the target cell.
    Harvest,
    /// Plant the step's resource on the farmland below the target cell.
    Sow,
    /// Cast a fishing rod at the target water cell.
    Cast,
    /// Offer the step's resource to the trader at the target for `want`.
    Barter {
        /// Item requested in exchange.
        want: ItemKind,
    },
}

/// Progress of the current attempt at a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStage {
    /// Nothing issued yet.
    #[default]
    Pending,
    /// Waiting to arrive near the target.
    Approaching,
    /// Waiting for a temporary support block to be placed.
    Supporting,
    /// Waiting for the step's own action.
    Acting,
}

/// One unit of work in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Cell the step acts on, if any.
    pub target: Option<Position>,
    /// Preferred material or item the step consumes.
    pub resource: Option<ItemKind>,
    /// What the step does.
    pub action: ActionKind,
    /// Failed attempts so far.
    pub retries: u32,
    /// Where the current attempt stands. Reset whenever an attempt ends.
    pub stage: StepStage,
    /// Whether a temporary support block was already placed for this step.
    pub supported: bool,
}

impl Step {
    /// Create a step with no retries.
    pub const fn new(action: ActionKind, target: Option<Position>, resource: Option<ItemKind>) -> Self {
        Self {
            target,
            resource,
            action,
            retries: 0,
            stage: StepStage::Pending,
            supported: false,
        }
    }

    /// A placement step for `target`, preferring `material`.
    pub const fn place(target: Position, material: Option<ItemKind>) -> Self {
        Self::new(ActionKind::Place, Some(target), material)
    }

    /// A dig step for `target`.
    pub const fn dig(target: Position) -> Self {
        Self::new(ActionKind::Dig, Some(target), None)
    }

    /// An approach step for `target`.
    pub const fn approach(target: Position, tolerance: u32) -> Self {
        Self::new(ActionKind::Approach { tolerance }, Some(target), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_steps_start_fresh() {
        let step = Step::place(Position::new(0, 1, 0), None);
        assert_eq!(step.retries, 0);
        assert_eq!(step.stage, StepStage::Pending);
        assert!(!step.supported);
        assert_eq!(step.action, ActionKind::Place);
    }
}
