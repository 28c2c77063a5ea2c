//! Core value structs: items, blocks, entities, vitals, and recipes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::EntityCategory;
use crate::geometry::Position;
use crate::ids::EntityId;

// ---------------------------------------------------------------------------
// Items and blocks
// ---------------------------------------------------------------------------

/// Name of an item or block kind (`"cobblestone"`, `"log"`, `"wheat"`).
///
/// Items and blocks share one namespace: placing the item `crafting_table`
/// produces a block of kind `crafting_table`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKind(String);

impl ItemKind {
    /// The kind of an empty cell.
    pub const AIR: &'static str = "air";

    /// Create an item kind from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The item name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemKind {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

/// One inventory slot: an item kind, how many, and which slot holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// The item held.
    pub kind: ItemKind,
    /// Number of items in the slot.
    pub count: u32,
    /// Inventory slot index.
    pub slot: u16,
}

/// Crop growth stage at which a crop can be harvested.
pub const MATURE_CROP_STAGE: u8 = 7;

/// What the world reports about one block cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDescriptor {
    /// Block kind.
    pub kind: ItemKind,
    /// Whether the block occupies its cell and can serve as a reference face.
    pub solid: bool,
    /// Growth stage for crops, `None` for every other block.
    pub growth: Option<u8>,
}

impl BlockDescriptor {
    /// An empty cell.
    pub fn air() -> Self {
        Self {
            kind: ItemKind::new(ItemKind::AIR),
            solid: false,
            growth: None,
        }
    }

    /// A solid block of the given kind.
    pub fn solid(kind: impl Into<ItemKind>) -> Self {
        Self {
            kind: kind.into(),
            solid: true,
            growth: None,
        }
    }

    /// A non-solid block such as water or tall grass.
    pub fn passable(kind: impl Into<ItemKind>) -> Self {
        Self {
            kind: kind.into(),
            solid: false,
            growth: None,
        }
    }

    /// A crop at the given growth stage.
    pub fn crop(kind: impl Into<ItemKind>, stage: u8) -> Self {
        Self {
            kind: kind.into(),
            solid: false,
            growth: Some(stage),
        }
    }

    /// Whether the cell holds nothing at all.
    pub fn is_air(&self) -> bool {
        self.kind.as_str() == ItemKind::AIR
    }

    /// Whether the block is a crop ready to harvest.
    pub fn is_mature_crop(&self) -> bool {
        self.growth.is_some_and(|stage| stage >= MATURE_CROP_STAGE)
    }
}

// ---------------------------------------------------------------------------
// Entities and vitals
// ---------------------------------------------------------------------------

/// A visible entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityInfo {
    /// World-assigned identifier.
    pub id: EntityId,
    /// Entity type name (`"zombie"`, `"villager"`, `"player"`).
    pub kind: String,
    /// Display name for players, `None` for mobs.
    pub name: Option<String>,
    /// Current block position.
    pub position: Position,
    /// Coarse classification.
    pub category: EntityCategory,
}

impl EntityInfo {
    /// Whether this entity attacks on sight.
    pub fn is_hostile(&self) -> bool {
        self.category == EntityCategory::Hostile
    }
}

/// Maximum health and food values.
pub const MAX_VITAL: u32 = 20;

/// Health and food levels of the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vitals {
    /// Health points, 0 to [`MAX_VITAL`].
    pub health: u32,
    /// Food points, 0 to [`MAX_VITAL`].
    pub food: u32,
}

impl Default for Vitals {
    fn default() -> Self {
        Self {
            health: MAX_VITAL,
            food: MAX_VITAL,
        }
    }
}

// ---------------------------------------------------------------------------
// Recipes and requirements
// ---------------------------------------------------------------------------

/// A crafting recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Stable recipe identifier (`"planks_from_log"`).
    pub id: String,
    /// Item produced.
    pub output: ItemKind,
    /// Items produced per craft.
    pub output_count: u32,
    /// Ingredients consumed per craft.
    pub ingredients: BTreeMap<ItemKind, u32>,
    /// Whether the recipe needs a placed crafting table.
    pub requires_station: bool,
}

impl Recipe {
    /// Number of crafts needed to produce at least `count` items.
    pub fn crafts_for(&self, count: u32) -> u32 {
        if self.output_count == 0 {
            return 0;
        }
        count.div_ceil(self.output_count)
    }
}

/// An `(item, count)` pair that must be held.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceRequirement {
    /// Item required.
    pub item: ItemKind,
    /// Quantity required.
    pub count: u32,
}

impl ResourceRequirement {
    /// Create a requirement.
    pub fn new(item: impl Into<ItemKind>, count: u32) -> Self {
        Self {
            item: item.into(),
            count,
        }
    }
}
