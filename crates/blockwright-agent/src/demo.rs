//! Demo world for running the agent without a game server.
//!
//! Lays out a flat grass plain with a few trees, a stone outcrop, a pond, a
//! small wheat field, and a trader, then stocks the agent's inventory. The
//! `demo` section of `blockwright.yaml` overrides the size, the starting
//! items, and where hostiles and the owner appear.

use std::collections::BTreeMap;
use std::path::Path;

use blockwright_types::{BlockDescriptor, EntityCategory, MATURE_CROP_STAGE, Position};
use blockwright_world::GridWorld;
use serde::Deserialize;
use tracing::info;

use crate::error::AgentError;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Demo world layout, loaded from the `demo` section of `blockwright.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DemoConfig {
    /// Half-width of the grass plain.
    #[serde(default = "default_radius")]
    pub radius: i32,

    /// Items the agent starts with.
    #[serde(default = "default_items")]
    pub items: BTreeMap<String, u32>,

    /// Where hostile mobs spawn.
    #[serde(default)]
    pub hostiles: Vec<[i32; 3]>,

    /// Where the owner stands, if an owner is configured.
    #[serde(default = "default_owner_at")]
    pub owner_at: [i32; 3],
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            radius: default_radius(),
            items: default_items(),
            hostiles: Vec::new(),
            owner_at: default_owner_at(),
        }
    }
}

const fn default_radius() -> i32 {
    24
}

fn default_items() -> BTreeMap<String, u32> {
    [
        ("cobblestone", 64),
        ("log", 2),
        ("bread", 3),
        ("fishing_rod", 1),
        ("emerald", 4),
        ("wheat_seeds", 4),
    ]
    .into_iter()
    .map(|(item, count)| (String::from(item), count))
    .collect()
}

const fn default_owner_at() -> [i32; 3] {
    [6, 1, 6]
}

/// Load the `demo` section of the config file, or defaults.
///
/// A missing file or a missing `demo` key yields [`DemoConfig::default`].
pub fn load_demo_config(path: &Path) -> Result<DemoConfig, AgentError> {
    if !path.exists() {
        return Ok(DemoConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| AgentError::Demo {
        message: format!("failed to read config file: {e}"),
    })?;
    if contents.trim().is_empty() {
        return Ok(DemoConfig::default());
    }
    let raw: serde_yml::Value = serde_yml::from_str(&contents).map_err(|e| AgentError::Demo {
        message: format!("failed to parse config YAML: {e}"),
    })?;
    match raw.get("demo") {
        Some(section) => serde_yml::from_value(section.clone()).map_err(|e| AgentError::Demo {
            message: format!("failed to parse demo config: {e}"),
        }),
        None => Ok(DemoConfig::default()),
    }
}

// -----------------------------------------------------------------------
// World
// -----------------------------------------------------------------------

const TREES: [(i32, i32); 3] = [(9, 8), (-10, 6), (5, -11)];
const TREE_HEIGHT: i32 = 4;

fn at([x, y, z]: [i32; 3]) -> Position {
    Position::new(x, y, z)
}

/// Build the demo world. `owner` spawns a player of that name.
pub fn build_world(config: &DemoConfig, owner: Option<&str>) -> Result<GridWorld, AgentError> {
    let radius = config.radius.clamp(8, 64);
    let mut world = GridWorld::flat(radius);

    for (x, z) in TREES {
        world.fill(
            Position::new(x, 1, z),
            Position::new(x, TREE_HEIGHT, z),
            &BlockDescriptor::solid("oak_log"),
        );
    }

    // Stone outcrop.
    world.fill(
        Position::new(-7, 1, -7),
        Position::new(-5, 2, -5),
        &BlockDescriptor::solid("stone"),
    );

    // Pond.
    world.fill(
        Position::new(10, 0, -6),
        Position::new(12, 0, -4),
        &BlockDescriptor::passable("water"),
    );

    // Wheat field: ripe crops on farmland, plus bare farmland to sow.
    for x in -4..=-2 {
        world.set_block(Position::new(x, 0, 9), BlockDescriptor::solid("farmland"));
        world.set_block(
            Position::new(x, 1, 9),
            BlockDescriptor::crop("wheat", MATURE_CROP_STAGE),
        );
        world.set_block(Position::new(x, 0, 10), BlockDescriptor::solid("farmland"));
    }

    world.spawn(
        "villager",
        EntityCategory::Trader,
        Position::new(6, 1, -6),
        Some("trader"),
    );
    world.add_trade_offer("emerald", 1, "bread", 2);

    if let Some(name) = owner {
        world.spawn("player", EntityCategory::Player, at(config.owner_at), Some(name));
    }
    for spot in &config.hostiles {
        world.spawn("zombie", EntityCategory::Hostile, at(*spot), None);
    }

    for (item, count) in &config.items {
        world.give(item, *count)?;
    }

    info!(
        radius,
        items = config.items.len(),
        hostiles = config.hostiles.len(),
        owner = owner.unwrap_or("-"),
        "Demo world ready"
    );
    Ok(world)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use blockwright_world::World;

    use super::*;

    #[test]
    fn default_world_has_its_landmarks() {
        let world = build_world(&DemoConfig::default(), Some("alex")).unwrap();
        assert!(world.is_solid(Position::new(9, TREE_HEIGHT, 8)));
        assert!(world.is_solid(Position::new(-6, 2, -6)));
        assert_eq!(world.held("cobblestone"), 64);
        let players = world
            .entities()
            .into_iter()
            .filter(|e| e.category == EntityCategory::Player)
            .count();
        assert_eq!(players, 1);
    }

    #[test]
    fn demo_section_overrides_defaults() {
        let yaml = "demo:\n  radius: 10\n  items:\n    dirt: 5\n  hostiles:\n    - [3, 1, 3]\n";
        let raw: serde_yml::Value = serde_yml::from_str(yaml).unwrap();
        let config: DemoConfig = serde_yml::from_value(raw.get("demo").unwrap().clone()).unwrap();
        assert_eq!(config.radius, 10);
        assert_eq!(config.owner_at, default_owner_at());

        let world = build_world(&config, None).unwrap();
        assert_eq!(world.held("dirt"), 5);
        assert_eq!(world.held("cobblestone"), 0);
        assert!(world.entities().iter().any(|e| e.category == EntityCategory::Hostile));
    }

    #[test]
    fn missing_file_means_defaults() {
        let config = load_demo_config(Path::new("does-not-exist.yaml")).unwrap();
        assert_eq!(config, DemoConfig::default());
    }
}
