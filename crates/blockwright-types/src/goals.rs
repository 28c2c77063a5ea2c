//! Goals and directives.
//!
//! A [`Goal`] is an intent handed to exactly one state. A [`Directive`] is a
//! request queued for the controller and applied at the next tick boundary,
//! which keeps states from switching the active state mid-tick.

use serde::{Deserialize, Serialize};

use crate::enums::{StateKind, StructureKind};
use crate::geometry::{Dimensions, Position};
use crate::structs::ItemKind;

/// A requested outcome, owned by the state that pursues it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "goal", rename_all = "snake_case")]
pub enum Goal {
    /// Build a structure, optionally overriding its default dimensions.
    Build {
        /// Structure to build.
        kind: StructureKind,
        /// Dimensions override.
        dimensions: Option<Dimensions>,
    },
    /// Craft `count` of `item`.
    Craft {
        /// Item to craft.
        item: ItemKind,
        /// Number of items wanted.
        count: u32,
    },
    /// Collect `count` more of `item`.
    Gather {
        /// Item to collect.
        item: ItemKind,
        /// Number of additional items wanted.
        count: u32,
    },
    /// Dig out `count` blocks of `block`.
    Mine {
        /// Block kind to dig.
        block: ItemKind,
        /// Number of blocks wanted.
        count: u32,
    },
    /// Harvest mature crops nearby and replant them.
    Farm,
    /// Catch `catches` fish.
    Fish {
        /// Number of successful casts wanted.
        catches: u32,
    },
    /// Give `give` to the nearest trader in exchange for `want`.
    Trade {
        /// Item offered.
        give: ItemKind,
        /// Item requested.
        want: ItemKind,
    },
    /// Visit `waypoints` random points around the agent.
    Explore {
        /// Number of waypoints.
        waypoints: u32,
    },
    /// Stay close to the named owner.
    Follow {
        /// Owner's player name.
        owner: String,
    },
    /// Defend a point; `None` means the agent's position when the goal is
    /// accepted.
    Guard {
        /// Point to defend.
        anchor: Option<Position>,
    },
}

impl Goal {
    /// The state that pursues this goal.
    pub const fn state(&self) -> StateKind {
        match self {
            Self::Build { .. } => StateKind::Build,
            Self::Craft { .. } => StateKind::Craft,
            Self::Gather { .. } => StateKind::Gather,
            Self::Mine { .. } => StateKind::Mining,
            Self::Farm => StateKind::Farm,
            Self::Fish { .. } => StateKind::Fish,
            Self::Trade { .. } => StateKind::Trade,
            Self::Explore { .. } => StateKind::Explore,
            Self::Follow { .. } => StateKind::Follow,
            Self::Guard { .. } => StateKind::Defense,
        }
    }
}

impl core::fmt::Display for Goal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Build { kind, .. } => write!(f, "build {kind}"),
            Self::Craft { item, count } => write!(f, "craft {count} {item}"),
            Self::Gather { item, count } => write!(f, "gather {count} {item}"),
            Self::Mine { block, count } => write!(f, "mine {count} {block}"),
            Self::Farm => f.write_str("farm"),
            Self::Fish { catches } => write!(f, "fish {catches}"),
            Self::Trade { give, want } => write!(f, "trade {give} for {want}"),
            Self::Explore { waypoints } => write!(f, "explore {waypoints}"),
            Self::Follow { owner } => write!(f, "follow {owner}"),
            Self::Guard { .. } => f.write_str("guard"),
        }
    }
}

/// A request for the controller, applied at the next tick boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "directive", rename_all = "snake_case")]
pub enum Directive {
    /// Switch to the given state.
    Switch {
        /// Target state.
        state: StateKind,
    },
    /// Hand a goal to its state and switch to it.
    Assign {
        /// The goal.
        goal: Goal,
    },
    /// Withdraw the outstanding follow request.
    Unfollow,
    /// Drop every task goal and return to idle.
    Stop,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goals_route_to_their_state() {
        let goal = Goal::Mine {
            block: ItemKind::from("stone"),
            count: 3,
        };
        assert_eq!(goal.state(), StateKind::Mining);
        assert_eq!(Goal::Guard { anchor: None }.state(), StateKind::Defense);
    }

    #[test]
    fn goal_display_is_readable() {
        let goal = Goal::Craft {
            item: ItemKind::from("crafting_table"),
            count: 1,
        };
        assert_eq!(goal.to_string(), "craft 1 crafting_table");
    }

    #[test]
    fn directive_serializes_with_tag() {
        let json = serde_json::to_value(Directive::Switch {
            state: StateKind::Idle,
        })
        .unwrap_or_default();
        assert_eq!(json["directive"], "switch");
        assert_eq!(json["state"], "idle");
    }
}
