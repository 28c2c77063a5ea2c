//! Gather target selection.
//!
//! Items the agent can collect map to the block kinds that drop them. A log
//! comes from any kind of log block, cobblestone from stone, and so on. Items
//! missing from the table are assumed to drop from a block of the same name.

use blockwright_types::{ItemKind, Position, Step};
use blockwright_world::World;

/// Source blocks for each gatherable item.
const SOURCES: &[(&str, &[&str])] = &[
    ("log", &["oak_log", "birch_log", "spruce_log", "jungle_log"]),
    ("cobblestone", &["stone", "cobblestone"]),
    ("dirt", &["dirt", "grass_block"]),
    ("raw_iron", &["iron_ore"]),
    ("sand", &["sand"]),
    ("string", &["cobweb"]),
    ("coal", &["coal_ore"]),
];

/// Block kinds that drop `item`.
pub fn source_blocks(item: &ItemKind) -> Vec<ItemKind> {
    SOURCES
        .iter()
        .find(|(name, _)| *name == item.as_str())
        .map_or_else(
            || vec![item.clone()],
            |(_, blocks)| blocks.iter().map(|b| ItemKind::from(*b)).collect(),
        )
}

/// Up to `count` source blocks for `item` within `radius`, nearest first.
pub fn select_targets(world: &dyn World, item: &ItemKind, radius: u32, count: usize) -> Vec<Position> {
    let origin = world.position();
    let mut found: Vec<Position> = source_blocks(item)
        .iter()
        .flat_map(|kind| world.find_nearest_of_kind(kind, radius, count))
        .collect();
    found.sort_by_key(|p| (p.distance_squared(origin), *p));
    found.dedup();
    found.truncate(count);
    found
}

/// Dig steps for the given targets.
pub fn dig_steps(targets: &[Position]) -> Vec<Step> {
    targets.iter().copied().map(Step::dig).collect()
}
