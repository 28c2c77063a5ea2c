//! The world/agent interface.
//!
//! The orchestration core never touches world state directly. It reads
//! through the query methods and mutates only by issuing one of the action
//! calls, each of which returns an [`ActionFuture`]. A game-client adapter
//! and the in-memory [`GridWorld`] both implement this trait.
//!
//! [`GridWorld`]: crate::grid::GridWorld

use blockwright_types::{
    BlockDescriptor, EntityId, EntityInfo, Face, ItemKind, ItemStack, Position, Recipe, Vitals,
};

use crate::action::ActionFuture;

/// Queries and fallible action primitives exposed by the world.
pub trait World {
    /// The agent's current block position.
    fn position(&self) -> Position;

    /// The agent's health and food.
    fn vitals(&self) -> Vitals;

    /// The block at `pos`, or `None` if that chunk is not loaded.
    fn query_block(&self, pos: Position) -> Option<BlockDescriptor>;

    /// Every occupied inventory slot.
    fn query_inventory(&self) -> Vec<ItemStack>;

    /// Entities currently visible to the agent.
    fn entities(&self) -> Vec<EntityInfo>;

    /// Up to `count` positions of blocks of `kind` within `max_distance`
    /// (Chebyshev) of the agent, nearest first.
    fn find_nearest_of_kind(&self, kind: &ItemKind, max_distance: u32, count: usize)
    -> Vec<Position>;

    /// Walk until within `tolerance` blocks of `pos`.
    fn move_near(&mut self, pos: Position, tolerance: u32) -> ActionFuture;

    /// Break the block at `pos`.
    fn break_block(&mut self, pos: Position) -> ActionFuture;

    /// Place `item` against `face` of the solid block at `reference`.
    fn place_block(&mut self, reference: Position, face: Face, item: &ItemKind) -> ActionFuture;

    /// Apply `recipe` `count` times, using the crafting table at `station`
    /// when the recipe needs one.
    fn craft(&mut self, recipe: &Recipe, count: u32, station: Option<Position>) -> ActionFuture;

    /// Hit an entity once.
    fn attack(&mut self, entity: EntityId) -> ActionFuture;

    /// Use a held item, optionally aimed at a block (eat, cast a rod).
    fn use_item(&mut self, item: &ItemKind, target: Option<Position>) -> ActionFuture;

    /// Exchange `give` for `want` with a trader.
    fn trade(&mut self, entity: EntityId, give: &ItemKind, want: &ItemKind) -> ActionFuture;
}
