//! Fishing helpers.

use blockwright_types::{ActionKind, ItemKind, Position, Step};
use blockwright_world::World;

/// Item needed to fish.
pub const ROD: &str = "fishing_rod";

/// Nearest water block within `radius`.
pub fn find_water(world: &dyn World, radius: u32) -> Option<Position> {
    world
        .find_nearest_of_kind(&ItemKind::from("water"), radius, 1)
        .into_iter()
        .next()
}

/// `casts` cast steps aimed at `water`.
pub fn cast_steps(water: Position, casts: u32) -> Vec<Step> {
    (0..casts)
        .map(|_| Step::new(ActionKind::Cast, Some(water), Some(ItemKind::from(ROD))))
        .collect()
}

#[cfg(test)]
mod tests {
    use blockwright_types::BlockDescriptor;
    use blockwright_world::GridWorld;

    use super::*;

    #[test]
    fn finds_nearest_water() {
        let mut world = GridWorld::flat(8);
        assert!(find_water(&world, 8).is_none());
        world.set_block(Position::new(4, 0, 4), BlockDescriptor::passable("water"));
        world.set_block(Position::new(2, 0, 1), BlockDescriptor::passable("water"));
        assert_eq!(find_water(&world, 8), Some(Position::new(2, 0, 1)));
        assert_eq!(cast_steps(Position::new(2, 0, 1), 3).len(), 3);
    }
}
