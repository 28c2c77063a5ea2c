//! Combat and defense target selection.

use blockwright_types::{EntityInfo, Position};
use blockwright_world::World;

/// Hostile entities within `radius` of `center`, nearest first, ties broken
/// by entity id.
pub fn threats_near(world: &dyn World, center: Position, radius: u32) -> Vec<EntityInfo> {
    let mut threats: Vec<EntityInfo> = world
        .entities()
        .into_iter()
        .filter(|e| e.is_hostile() && e.position.chebyshev(center) <= radius)
        .collect();
    threats.sort_by_key(|e| (e.position.distance_squared(center), e.id));
    threats
}

/// The hostile to engage around `center`, if any.
pub fn select_target(world: &dyn World, center: Position, radius: u32) -> Option<EntityInfo> {
    threats_near(world, center, radius).into_iter().next()
}
