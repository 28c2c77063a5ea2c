//! Farming and food helpers.

use std::collections::BTreeMap;

use blockwright_types::{ActionKind, ItemKind, Position, Step};
use blockwright_world::World;

/// Crop block kinds the farmer tends.
pub const CROPS: [&str; 3] = ["wheat", "carrots", "potatoes"];

/// Seed item replanted for a harvested crop.
pub fn seed_for(crop: &ItemKind) -> ItemKind {
    match crop.as_str() {
        "carrots" => ItemKind::from("carrot"),
        "potatoes" => ItemKind::from("potato"),
        _ => ItemKind::from("wheat_seeds"),
    }
}

/// Items the agent will eat, best first.
pub const FOODS: [&str; 6] = ["cooked_beef", "bread", "cooked_cod", "apple", "carrot", "cod"];

/// The best food held, if any.
pub fn best_food(held: &BTreeMap<ItemKind, u32>) -> Option<ItemKind> {
    FOODS
        .into_iter()
        .map(ItemKind::from)
        .find(|food| held.get(food).copied().unwrap_or(0) > 0)
}

/// Whether food has dropped below the threshold.
pub const fn is_hungry(food: u32, threshold: u32) -> bool {
    food < threshold
}

/// Mature crops within `radius`, nearest first.
pub fn mature_crops(world: &dyn World, radius: u32, limit: usize) -> Vec<Position> {
    let origin = world.position();
    let mut found: Vec<Position> = CROPS
        .into_iter()
        .map(ItemKind::from)
        .flat_map(|crop| world.find_nearest_of_kind(&crop, radius, limit))
        .filter(|pos| world.query_block(*pos).is_some_and(|b| b.is_mature_crop()))
        .collect();
    found.sort_by_key(|p| (p.distance_squared(origin), *p));
    found.truncate(limit);
    found
}

/// Harvest-then-replant steps for each crop position.
pub fn harvest_steps(world: &dyn World, crops: &[Position]) -> Vec<Step> {
    let mut steps = Vec::new();
    for &pos in crops {
        let seed = world
            .query_block(pos)
            .map_or_else(|| ItemKind::from("wheat_seeds"), |b| seed_for(&b.kind));
        steps.push(Step::new(ActionKind::Harvest, Some(pos), None));
        steps.push(Step::new(ActionKind::Sow, Some(pos), Some(seed)));
    }
    steps
}
