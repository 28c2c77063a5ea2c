//! Enumeration types shared across the workspace.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// State kinds
// ---------------------------------------------------------------------------

/// The twelve operating modes of the agent.
///
/// The controller keys its registry by this enum, so every lookup is checked
/// at compile time rather than by string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    /// Nothing to do; eat when hungry and wait for work.
    Idle,
    /// Dig out blocks of a requested kind.
    Mining,
    /// Fight hostile entities near the agent.
    Combat,
    /// Collect a requested item from its source blocks.
    Gather,
    /// Resolve and execute a crafting goal.
    Craft,
    /// Plan and place a structure.
    Build,
    /// Walk to random waypoints.
    Explore,
    /// Harvest and replant crops.
    Farm,
    /// Cast a fishing rod into water.
    Fish,
    /// Exchange items with a trader.
    Trade,
    /// Fight hostiles near a guarded anchor.
    Defense,
    /// Stay close to the owner.
    Follow,
}

impl StateKind {
    /// Every state kind, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::Idle,
        Self::Mining,
        Self::Combat,
        Self::Gather,
        Self::Craft,
        Self::Build,
        Self::Explore,
        Self::Farm,
        Self::Fish,
        Self::Trade,
        Self::Defense,
        Self::Follow,
    ];

    /// Lower-case name used in commands and logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Mining => "mining",
            Self::Combat => "combat",
            Self::Gather => "gather",
            Self::Craft => "craft",
            Self::Build => "build",
            Self::Explore => "explore",
            Self::Farm => "farm",
            Self::Fish => "fish",
            Self::Trade => "trade",
            Self::Defense => "defense",
            Self::Follow => "follow",
        }
    }

    /// Whether this state may preempt any running task.
    pub const fn is_preemptive(self) -> bool {
        matches!(self, Self::Combat | Self::Defense | Self::Follow)
    }
}

impl core::fmt::Display for StateKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a name does not match any known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName(pub String);

impl core::fmt::Display for UnknownName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "unknown name: {}", self.0)
    }
}

impl std::error::Error for UnknownName {}

impl FromStr for StateKind {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == lower)
            .ok_or(UnknownName(lower))
    }
}

// ---------------------------------------------------------------------------
// Structure kinds
// ---------------------------------------------------------------------------

/// A structure the build planner knows how to lay out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    /// Single-layer upright rectangle.
    Wall,
    /// Hollow square column with solid base and cap.
    Tower,
    /// Floor, walls with a door gap, and an overhanging roof.
    House,
    /// Walkway with railings on both edges.
    Bridge,
    /// Rising steps with rails and support columns.
    Staircase,
}

impl StructureKind {
    /// Every structure kind.
    pub const ALL: [Self; 5] = [
        Self::Wall,
        Self::Tower,
        Self::House,
        Self::Bridge,
        Self::Staircase,
    ];

    /// Lower-case name used in commands and logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Wall => "wall",
            Self::Tower => "tower",
            Self::House => "house",
            Self::Bridge => "bridge",
            Self::Staircase => "staircase",
        }
    }
}

impl core::fmt::Display for StructureKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StructureKind {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == lower)
            .ok_or(UnknownName(lower))
    }
}

// ---------------------------------------------------------------------------
// Entity categories
// ---------------------------------------------------------------------------

/// Coarse classification of a visible entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    /// Attacks the agent on sight.
    Hostile,
    /// Animals and other harmless mobs.
    Passive,
    /// Another player, possibly the owner.
    Player,
    /// A villager that accepts trades.
    Trader,
}
