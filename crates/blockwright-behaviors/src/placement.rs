//! Placement protocol helpers.
//!
//! A block can only be placed against the face of an existing solid block.
//! [`reference_face`] finds that block for a target cell, checking the six
//! neighbours in [`Face::SEARCH_ORDER`] (below, above, then the four lateral
//! sides). When none is solid, [`support_candidate`] picks a neighbouring
//! cell that does have a reference so a temporary support can be placed
//! there first. Support placement is one level deep: a support never needs
//! its own support.

use std::collections::BTreeMap;

use blockwright_types::{Face, ItemKind, Position};
use blockwright_world::World;

/// Building blocks accepted as substitutes, best first.
pub const DEFAULT_MATERIALS: [&str; 8] = [
    "cobblestone",
    "stone",
    "planks",
    "dirt",
    "stone_bricks",
    "sandstone",
    "andesite",
    "log",
];

/// A place call: which solid block to click and which of its faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Solid neighbour of the target cell.
    pub reference: Position,
    /// Face of `reference` that touches the target cell.
    pub face: Face,
}

impl Placement {
    /// The cell this placement fills.
    pub const fn target(self) -> Position {
        self.reference.neighbor(self.face)
    }
}

/// A solid neighbour of `target` to place against, if any.
pub fn reference_face(world: &dyn World, target: Position) -> Option<Placement> {
    Face::SEARCH_ORDER.into_iter().find_map(|dir| {
        let neighbour = target.neighbor(dir);
        world
            .query_block(neighbour)
            .filter(|b| b.solid)
            .map(|_| Placement {
                reference: neighbour,
                face: dir.opposite(),
            })
    })
}

/// A placement that fills an empty neighbour of `target`, giving `target`
/// a reference for a later attempt.
pub fn support_candidate(world: &dyn World, target: Position) -> Option<Placement> {
    Face::SEARCH_ORDER.into_iter().find_map(|dir| {
        let cell = target.neighbor(dir);
        let open = world
            .query_block(cell)
            .is_some_and(|b| !b.solid && b.growth.is_none());
        if open {
            reference_face(world, cell)
        } else {
            None
        }
    })
}

/// Pick the block to place: the preferred kind if held, otherwise the first
/// held entry of `ranking`.
pub fn pick_material(
    preferred: Option<&ItemKind>,
    held: &BTreeMap<ItemKind, u32>,
    ranking: &[ItemKind],
) -> Option<ItemKind> {
    let has = |kind: &ItemKind| held.get(kind).copied().unwrap_or(0) > 0;
    preferred
        .filter(|kind| has(kind))
        .or_else(|| ranking.iter().find(|kind| has(kind)))
        .cloned()
}

/// The default ranking as item kinds.
pub fn default_ranking() -> Vec<ItemKind> {
    DEFAULT_MATERIALS.into_iter().map(ItemKind::from).collect()
}

/// Total of every ranked material held.
pub fn materials_held(held: &BTreeMap<ItemKind, u32>, ranking: &[ItemKind]) -> u32 {
    ranking
        .iter()
        .filter_map(|kind| held.get(kind))
        .fold(0_u32, |acc, n| acc.saturating_add(*n))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use blockwright_types::BlockDescriptor;
    use blockwright_world::GridWorld;

    use super::*;

    #[test]
    fn reference_prefers_the_block_below() {
        let mut world = GridWorld::flat(4);
        world.set_block(Position::new(1, 1, 0), BlockDescriptor::solid("stone"));
        let placement = reference_face(&world, Position::new(0, 1, 0)).unwrap();
        assert_eq!(placement.reference, Position::new(0, 0, 0));
        assert_eq!(placement.face, Face::Up);
        assert_eq!(placement.target(), Position::new(0, 1, 0));
    }

    #[test]
    fn lateral_reference_when_nothing_below() {
        let mut world = GridWorld::flat(4);
        world.set_block(Position::new(1, 3, 0), BlockDescriptor::solid("stone"));
        let placement = reference_face(&world, Position::new(0, 3, 0)).unwrap();
        assert_eq!(placement.reference, Position::new(1, 3, 0));
        assert_eq!(placement.target(), Position::new(0, 3, 0));
    }

    #[test]
    fn floating_cell_gets_a_support_below() {
        let world = GridWorld::flat(4);
        let target = Position::new(0, 2, 0);
        assert!(reference_face(&world, target).is_none());
        let support = support_candidate(&world, target).unwrap();
        assert_eq!(support.target(), Position::new(0, 1, 0));
    }

    #[test]
    fn no_support_two_levels_up() {
        let world = GridWorld::flat(4);
        assert!(support_candidate(&world, Position::new(0, 4, 0)).is_none());
    }

    #[test]
    fn material_substitution_follows_ranking() {
        let ranking = default_ranking();
        let held = BTreeMap::from([(ItemKind::from("dirt"), 3), (ItemKind::from("planks"), 0)]);
        let chosen = pick_material(Some(&ItemKind::from("cobblestone")), &held, &ranking);
        assert_eq!(chosen, Some(ItemKind::from("dirt")));
        assert_eq!(pick_material(None, &BTreeMap::new(), &ranking), None);
        assert_eq!(materials_held(&held, &ranking), 3);
    }
}
