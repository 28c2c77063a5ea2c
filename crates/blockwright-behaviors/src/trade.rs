//! Trader lookup.

use blockwright_types::{ActionKind, EntityCategory, EntityInfo, ItemKind, Position, Step};
use blockwright_world::World;

/// Nearest trader within `radius` of the agent.
pub fn nearest_trader(world: &dyn World, radius: u32) -> Option<EntityInfo> {
    let origin = world.position();
    world
        .entities()
        .into_iter()
        .filter(|e| e.category == EntityCategory::Trader && e.position.chebyshev(origin) <= radius)
        .min_by_key(|e| (e.position.distance_squared(origin), e.id))
}

/// A barter step offering `give` for `want` at the trader's position.
pub fn barter_step(trader_at: Position, give: &ItemKind, want: &ItemKind) -> Step {
    Step::new(
        ActionKind::Barter { want: want.clone() },
        Some(trader_at),
        Some(give.clone()),
    )
}
