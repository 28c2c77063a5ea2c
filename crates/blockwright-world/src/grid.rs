//! A deterministic in-memory block world.
//!
//! [`GridWorld`] implements [`World`] over a sparse block map with a loaded
//! bounding box. Effects of an action are applied when the action is issued
//! and its result is delivered after a configurable number of polls, which is
//! enough to exercise every waiting path in the executor. Individual cells
//! can be rigged to stall, refuse paths, or silently swallow placements so
//! tests can reach each failure branch.

use std::collections::{BTreeMap, BTreeSet};

use blockwright_types::{
    BlockDescriptor, EntityCategory, EntityId, EntityInfo, Face, ItemKind, ItemStack, MAX_VITAL,
    Position, Recipe, Vitals,
};
use tracing::debug;

use crate::action::{self, ActionFuture, ActionOutput, ActionResult};
use crate::error::WorldError;
use crate::interface::World;
use crate::inventory::Inventory;

/// Chebyshev reach for crafting at a station and for melee.
pub const INTERACT_REACH: u32 = 5;

/// Hits a spawned entity takes before it is removed.
pub const DEFAULT_ENTITY_HEALTH: u32 = 3;

/// Item caught by a successful cast.
pub const CATCH_ITEM: &str = "cod";

/// Food value restored by edible items.
fn food_value(item: &str) -> Option<u32> {
    match item {
        "bread" | "cooked_cod" | "cooked_beef" => Some(5),
        "apple" => Some(4),
        "cod" | "carrot" => Some(2),
        _ => None,
    }
}

/// What breaking a block yields, if anything.
fn drop_for(block: &BlockDescriptor) -> Option<ItemKind> {
    let name = block.kind.as_str();
    if block.growth.is_some() {
        return Some(if block.is_mature_crop() {
            block.kind.clone()
        } else {
            ItemKind::from("wheat_seeds")
        });
    }
    if name.ends_with("_log") {
        return Some(ItemKind::from("log"));
    }
    match name {
        "stone" => Some(ItemKind::from("cobblestone")),
        "grass_block" | "farmland" => Some(ItemKind::from("dirt")),
        "iron_ore" => Some(ItemKind::from("raw_iron")),
        _ => Some(block.kind.clone()),
    }
}

/// One action the grid world accepted, in issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRecord {
    /// `move_near`
    Move(Position),
    /// `break_block`
    Break(Position),
    /// `place_block` into the given cell.
    Place(Position, ItemKind),
    /// `craft` by recipe id and count.
    Craft(String, u32),
    /// `attack`
    Attack(EntityId),
    /// `use_item`
    Use(ItemKind),
    /// `trade`
    Trade(EntityId),
}

impl ActionRecord {
    /// Whether the action changes blocks or inventory through crafting.
    pub const fn is_mutation(&self) -> bool {
        matches!(self, Self::Break(_) | Self::Place(..) | Self::Craft(..))
    }
}

#[derive(Debug, Clone)]
struct GridEntity {
    info: EntityInfo,
    health: u32,
}

/// A sparse, bounded, deterministic block world.
#[derive(Debug, Clone)]
pub struct GridWorld {
    min: Position,
    max: Position,
    blocks: BTreeMap<Position, BlockDescriptor>,
    agent: Position,
    vitals: Vitals,
    inventory: Inventory,
    entities: BTreeMap<EntityId, GridEntity>,
    next_entity: u32,
    latency: u32,
    cast_latency: u32,
    blocked_paths: BTreeSet<Position>,
    stalled: BTreeSet<Position>,
    phantom: BTreeSet<Position>,
    trade_offers: BTreeMap<(ItemKind, ItemKind), (u32, u32)>,
    log: Vec<ActionRecord>,
}

impl GridWorld {
    /// An empty (all air) world loaded between `min` and `max` inclusive.
    pub const fn new(min: Position, max: Position) -> Self {
        Self {
            min,
            max,
            blocks: BTreeMap::new(),
            agent: Position::new(0, 0, 0),
            vitals: Vitals {
                health: MAX_VITAL,
                food: MAX_VITAL,
            },
            inventory: Inventory::new(),
            entities: BTreeMap::new(),
            next_entity: 1,
            latency: 0,
            cast_latency: 3,
            blocked_paths: BTreeSet::new(),
            stalled: BTreeSet::new(),
            phantom: BTreeSet::new(),
            trade_offers: BTreeMap::new(),
            log: Vec::new(),
        }
    }

    /// A world with a grass floor at `y = 0` spanning `radius` blocks around
    /// the origin, loaded from `y = -4` to `y = 32`, agent standing at
    /// `(0, 1, 0)`.
    pub fn flat(radius: i32) -> Self {
        let r = radius.abs();
        let mut world = Self::new(
            Position::new(r.saturating_neg(), -4, r.saturating_neg()),
            Position::new(r, 32, r),
        );
        world.fill(
            Position::new(r.saturating_neg(), 0, r.saturating_neg()),
            Position::new(r, 0, r),
            &BlockDescriptor::solid("grass_block"),
        );
        world.agent = Position::new(0, 1, 0);
        world
    }

    // -- Setup ---------------------------------------------------------------

    /// Set one block. Setting air clears the cell.
    pub fn set_block(&mut self, pos: Position, block: BlockDescriptor) {
        if block.is_air() {
            self.blocks.remove(&pos);
        } else {
            self.blocks.insert(pos, block);
        }
    }

    /// Fill the inclusive box between `a` and `b`.
    pub fn fill(&mut self, a: Position, b: Position, block: &BlockDescriptor) {
        for x in a.x.min(b.x)..=a.x.max(b.x) {
            for y in a.y.min(b.y)..=a.y.max(b.y) {
                for z in a.z.min(b.z)..=a.z.max(b.z) {
                    self.set_block(Position::new(x, y, z), block.clone());
                }
            }
        }
    }

    /// Put items into the agent's inventory.
    pub fn give(&mut self, item: &str, count: u32) -> Result<(), WorldError> {
        self.inventory.add(&ItemKind::from(item), count)
    }

    /// Teleport the agent.
    pub const fn set_agent_position(&mut self, pos: Position) {
        self.agent = pos;
    }

    /// Overwrite the agent's vitals.
    pub const fn set_vitals(&mut self, vitals: Vitals) {
        self.vitals = vitals;
    }

    /// Spawn an entity and return its id.
    pub fn spawn(
        &mut self,
        kind: &str,
        category: EntityCategory,
        position: Position,
        name: Option<&str>,
    ) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity = self.next_entity.saturating_add(1);
        self.entities.insert(
            id,
            GridEntity {
                info: EntityInfo {
                    id,
                    kind: kind.to_owned(),
                    name: name.map(str::to_owned),
                    position,
                    category,
                },
                health: DEFAULT_ENTITY_HEALTH,
            },
        );
        id
    }

    /// Move an existing entity.
    pub fn move_entity(&mut self, id: EntityId, position: Position) {
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.info.position = position;
        }
    }

    /// Remove an entity.
    pub fn despawn(&mut self, id: EntityId) {
        self.entities.remove(&id);
    }

    /// Deliver every action result after `polls` pending polls.
    pub const fn set_latency(&mut self, polls: u32) {
        self.latency = polls;
    }

    /// Polls a fishing cast takes before the catch arrives.
    pub const fn set_cast_latency(&mut self, polls: u32) {
        self.cast_latency = polls;
    }

    /// Make `move_near` to this position fail with no path.
    pub fn block_path(&mut self, pos: Position) {
        self.blocked_paths.insert(pos);
    }

    /// Make every action aimed at this position hang forever.
    pub fn stall_at(&mut self, pos: Position) {
        self.stalled.insert(pos);
    }

    /// Make placements into this cell report success without taking effect.
    pub fn phantom_at(&mut self, pos: Position) {
        self.phantom.insert(pos);
    }

    /// Register a trade every trader accepts.
    pub fn add_trade_offer(&mut self, give: &str, give_count: u32, want: &str, want_count: u32) {
        self.trade_offers.insert(
            (ItemKind::from(give), ItemKind::from(want)),
            (give_count, want_count),
        );
    }

    // -- Inspection ----------------------------------------------------------

    /// Count of `item` held.
    pub fn held(&self, item: &str) -> u32 {
        self.inventory.count(&ItemKind::from(item))
    }

    /// Every action accepted so far.
    pub fn action_log(&self) -> &[ActionRecord] {
        &self.log
    }

    /// Whether the cell holds a solid block.
    pub fn is_solid(&self, pos: Position) -> bool {
        self.blocks.get(&pos).is_some_and(|b| b.solid)
    }

    // -- Internals -----------------------------------------------------------

    const fn is_loaded(&self, pos: Position) -> bool {
        pos.x >= self.min.x
            && pos.x <= self.max.x
            && pos.y >= self.min.y
            && pos.y <= self.max.y
            && pos.z >= self.min.z
            && pos.z <= self.max.z
    }

    fn block_at(&self, pos: Position) -> Option<BlockDescriptor> {
        if !self.is_loaded(pos) {
            return None;
        }
        Some(
            self.blocks
                .get(&pos)
                .cloned()
                .unwrap_or_else(BlockDescriptor::air),
        )
    }

    fn respond(&self, result: ActionResult) -> ActionFuture {
        action::delayed(self.latency, result)
    }

    fn do_place(&mut self, reference: Position, face: Face, item: &ItemKind) -> ActionResult {
        let target = reference.neighbor(face);
        let reference_block = self
            .block_at(reference)
            .ok_or(WorldError::Unloaded(reference))?;
        if !reference_block.solid {
            return Err(WorldError::NoReference(reference));
        }
        let existing = self.block_at(target).ok_or(WorldError::Unloaded(target))?;
        if existing.solid || existing.growth.is_some() {
            return Err(WorldError::Occupied(target));
        }
        let placed = if item.as_str() == "wheat_seeds" {
            if reference_block.kind.as_str() != "farmland" || face != Face::Up {
                return Err(WorldError::Rejected {
                    reason: String::from("seeds need farmland below"),
                });
            }
            BlockDescriptor::crop("wheat", 0)
        } else {
            BlockDescriptor::solid(item.clone())
        };
        self.inventory.remove(item, 1)?;
        self.log.push(ActionRecord::Place(target, item.clone()));
        if self.phantom.contains(&target) {
            debug!(%target, "placement swallowed by phantom cell");
        } else {
            self.set_block(target, placed);
        }
        Ok(ActionOutput::Completed)
    }

    fn do_break(&mut self, pos: Position) -> ActionResult {
        let block = self.block_at(pos).ok_or(WorldError::Unloaded(pos))?;
        if block.is_air() || (!block.solid && block.growth.is_none()) {
            return Err(WorldError::NothingToBreak(pos));
        }
        self.blocks.remove(&pos);
        self.log.push(ActionRecord::Break(pos));
        if block.is_mature_crop() {
            self.inventory.add(&ItemKind::from("wheat_seeds"), 1)?;
        }
        match drop_for(&block) {
            Some(item) => {
                self.inventory.add(&item, 1)?;
                Ok(ActionOutput::Produced { item, count: 1 })
            }
            None => Ok(ActionOutput::Completed),
        }
    }

    fn do_craft(&mut self, recipe: &Recipe, count: u32, station: Option<Position>) -> ActionResult {
        if recipe.requires_station {
            let usable = station.is_some_and(|pos| {
                self.block_at(pos)
                    .is_some_and(|b| b.kind.as_str() == "crafting_table")
                    && pos.chebyshev(self.agent) <= INTERACT_REACH
            });
            if !usable {
                return Err(WorldError::StationMissing);
            }
        }
        for (item, &per_craft) in &recipe.ingredients {
            let needed = per_craft.saturating_mul(count);
            let held = self.inventory.count(item);
            if held < needed {
                return Err(WorldError::MissingItem {
                    item: item.clone(),
                    needed,
                    held,
                });
            }
        }
        for (item, &per_craft) in &recipe.ingredients {
            self.inventory.remove(item, per_craft.saturating_mul(count))?;
        }
        let produced = recipe.output_count.saturating_mul(count);
        self.inventory.add(&recipe.output, produced)?;
        self.log.push(ActionRecord::Craft(recipe.id.clone(), count));
        Ok(ActionOutput::Produced {
            item: recipe.output.clone(),
            count: produced,
        })
    }

    fn do_attack(&mut self, id: EntityId) -> ActionResult {
        let agent = self.agent;
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(WorldError::EntityNotFound(id))?;
        if entity.info.position.chebyshev(agent) > INTERACT_REACH {
            return Err(WorldError::Rejected {
                reason: format!("entity {id} out of reach"),
            });
        }
        entity.health = entity.health.saturating_sub(1);
        let dead = entity.health == 0;
        self.log.push(ActionRecord::Attack(id));
        if dead {
            debug!(entity = %id, "entity killed");
            self.entities.remove(&id);
        }
        Ok(ActionOutput::Completed)
    }

    fn do_use(&mut self, item: &ItemKind, target: Option<Position>) -> ActionResult {
        let held = self.inventory.count(item);
        if held == 0 {
            return Err(WorldError::MissingItem {
                item: item.clone(),
                needed: 1,
                held,
            });
        }
        if let Some(restore) = food_value(item.as_str()) {
            self.inventory.remove(item, 1)?;
            self.vitals.food = self.vitals.food.saturating_add(restore).min(MAX_VITAL);
            self.log.push(ActionRecord::Use(item.clone()));
            return Ok(ActionOutput::Completed);
        }
        if item.as_str() == "fishing_rod" {
            let water = target
                .and_then(|pos| self.block_at(pos))
                .is_some_and(|b| b.kind.as_str() == "water");
            if !water {
                return Err(WorldError::Rejected {
                    reason: String::from("rod must be cast into water"),
                });
            }
            let catch = ItemKind::from(CATCH_ITEM);
            self.inventory.add(&catch, 1)?;
            self.log.push(ActionRecord::Use(item.clone()));
            return Ok(ActionOutput::Produced {
                item: catch,
                count: 1,
            });
        }
        Err(WorldError::Rejected {
            reason: format!("{item} cannot be used"),
        })
    }

    fn do_trade(&mut self, id: EntityId, give: &ItemKind, want: &ItemKind) -> ActionResult {
        let entity = self.entities.get(&id).ok_or(WorldError::EntityNotFound(id))?;
        if entity.info.category != EntityCategory::Trader {
            return Err(WorldError::Rejected {
                reason: format!("entity {id} does not trade"),
            });
        }
        let &(give_count, want_count) = self
            .trade_offers
            .get(&(give.clone(), want.clone()))
            .ok_or_else(|| WorldError::Rejected {
                reason: format!("no offer of {want} for {give}"),
            })?;
        self.inventory.remove(give, give_count)?;
        self.inventory.add(want, want_count)?;
        self.log.push(ActionRecord::Trade(id));
        Ok(ActionOutput::Produced {
            item: want.clone(),
            count: want_count,
        })
    }
}

impl World for GridWorld {
    fn position(&self) -> Position {
        self.agent
    }

    fn vitals(&self) -> Vitals {
        self.vitals
    }

    fn query_block(&self, pos: Position) -> Option<BlockDescriptor> {
        self.block_at(pos)
    }

    fn query_inventory(&self) -> Vec<ItemStack> {
        self.inventory.stacks()
    }

    fn entities(&self) -> Vec<EntityInfo> {
        self.entities.values().map(|e| e.info.clone()).collect()
    }

    fn find_nearest_of_kind(
        &self,
        kind: &ItemKind,
        max_distance: u32,
        count: usize,
    ) -> Vec<Position> {
        let origin = self.agent;
        let mut found: Vec<Position> = self
            .blocks
            .iter()
            .filter(|(pos, block)| &block.kind == kind && pos.chebyshev(origin) <= max_distance)
            .map(|(pos, _)| *pos)
            .collect();
        found.sort_by_key(|pos| (pos.distance_squared(origin), *pos));
        found.truncate(count);
        found
    }

    fn move_near(&mut self, pos: Position, tolerance: u32) -> ActionFuture {
        if self.stalled.contains(&pos) {
            return action::stalled();
        }
        if self.blocked_paths.contains(&pos) {
            return self.respond(Err(WorldError::NoPath(pos)));
        }
        if self.agent.chebyshev(pos) > tolerance {
            self.agent = pos;
        }
        self.log.push(ActionRecord::Move(pos));
        self.respond(Ok(ActionOutput::Completed))
    }

    fn break_block(&mut self, pos: Position) -> ActionFuture {
        if self.stalled.contains(&pos) {
            return action::stalled();
        }
        let result = self.do_break(pos);
        self.respond(result)
    }

    fn place_block(&mut self, reference: Position, face: Face, item: &ItemKind) -> ActionFuture {
        if self.stalled.contains(&reference.neighbor(face)) {
            return action::stalled();
        }
        let result = self.do_place(reference, face, item);
        self.respond(result)
    }

    fn craft(&mut self, recipe: &Recipe, count: u32, station: Option<Position>) -> ActionFuture {
        let result = self.do_craft(recipe, count, station);
        self.respond(result)
    }

    fn attack(&mut self, entity: EntityId) -> ActionFuture {
        let result = self.do_attack(entity);
        self.respond(result)
    }

    fn use_item(&mut self, item: &ItemKind, target: Option<Position>) -> ActionFuture {
        if target.is_some_and(|pos| self.stalled.contains(&pos)) {
            return action::stalled();
        }
        let is_cast = item.as_str() == "fishing_rod";
        let result = self.do_use(item, target);
        if is_cast {
            action::delayed(self.cast_latency.saturating_add(self.latency), result)
        } else {
            self.respond(result)
        }
    }

    fn trade(&mut self, entity: EntityId, give: &ItemKind, want: &ItemKind) -> ActionFuture {
        let result = self.do_trade(entity, give, want);
        self.respond(result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use core::task::{Context, Poll};

    use futures::FutureExt;
    use futures::task::noop_waker_ref;

    use super::*;

    fn resolve(mut fut: ActionFuture) -> ActionResult {
        let mut cx = Context::from_waker(noop_waker_ref());
        for _ in 0..100 {
            if let Poll::Ready(result) = fut.poll_unpin(&mut cx) {
                return result;
            }
        }
        Err(WorldError::Timeout)
    }

    #[test]
    fn flat_world_has_floor_and_air() {
        let world = GridWorld::flat(4);
        assert!(world.query_block(Position::new(2, 0, 2)).unwrap().solid);
        assert!(world.query_block(Position::new(2, 1, 2)).unwrap().is_air());
        assert!(world.query_block(Position::new(50, 1, 2)).is_none());
    }

    #[test]
    fn place_consumes_item_and_sets_block() {
        let mut world = GridWorld::flat(4);
        world.give("cobblestone", 2).unwrap();
        let fut = world.place_block(Position::new(1, 0, 1), Face::Up, &ItemKind::from("cobblestone"));
        assert_eq!(resolve(fut), Ok(ActionOutput::Completed));
        assert!(world.is_solid(Position::new(1, 1, 1)));
        assert_eq!(world.held("cobblestone"), 1);
    }

    #[test]
    fn place_without_reference_fails() {
        let mut world = GridWorld::flat(4);
        world.give("cobblestone", 1).unwrap();
        let fut = world.place_block(Position::new(1, 5, 1), Face::Up, &ItemKind::from("cobblestone"));
        assert_eq!(resolve(fut), Err(WorldError::NoReference(Position::new(1, 5, 1))));
        assert_eq!(world.held("cobblestone"), 1);
    }

    #[test]
    fn phantom_placement_reports_success_but_leaves_air() {
        let mut world = GridWorld::flat(4);
        world.give("dirt", 1).unwrap();
        world.phantom_at(Position::new(0, 1, 1));
        let fut = world.place_block(Position::new(0, 0, 1), Face::Up, &ItemKind::from("dirt"));
        assert!(resolve(fut).is_ok());
        assert!(!world.is_solid(Position::new(0, 1, 1)));
    }

    #[test]
    fn breaking_a_log_yields_generic_log() {
        let mut world = GridWorld::flat(4);
        world.set_block(Position::new(2, 1, 2), BlockDescriptor::solid("oak_log"));
        let result = resolve(world.break_block(Position::new(2, 1, 2)));
        assert_eq!(
            result,
            Ok(ActionOutput::Produced {
                item: ItemKind::from("log"),
                count: 1
            })
        );
        assert_eq!(world.held("log"), 1);
    }

    #[test]
    fn craft_checks_ingredients_and_station() {
        let mut world = GridWorld::flat(4);
        world.give("log", 1).unwrap();
        let recipe = Recipe {
            id: String::from("planks_from_log"),
            output: ItemKind::from("planks"),
            output_count: 4,
            ingredients: BTreeMap::from([(ItemKind::from("log"), 1)]),
            requires_station: false,
        };
        assert!(resolve(world.craft(&recipe, 1, None)).is_ok());
        assert_eq!(world.held("planks"), 4);
        assert!(resolve(world.craft(&recipe, 1, None)).is_err());

        let station_recipe = Recipe {
            requires_station: true,
            ..recipe
        };
        world.give("log", 1).unwrap();
        assert_eq!(
            resolve(world.craft(&station_recipe, 1, None)),
            Err(WorldError::StationMissing)
        );
    }

    #[test]
    fn latency_delays_results() {
        let mut world = GridWorld::flat(4);
        world.set_latency(2);
        let mut fut = world.move_near(Position::new(3, 1, 3), 0);
        let mut cx = Context::from_waker(noop_waker_ref());
        assert!(fut.poll_unpin(&mut cx).is_pending());
        assert!(fut.poll_unpin(&mut cx).is_pending());
        assert!(fut.poll_unpin(&mut cx).is_ready());
        assert_eq!(world.position(), Position::new(3, 1, 3));
    }

    #[test]
    fn attacks_kill_after_default_health() {
        let mut world = GridWorld::flat(4);
        let zombie = world.spawn("zombie", EntityCategory::Hostile, Position::new(1, 1, 0), None);
        for _ in 0..DEFAULT_ENTITY_HEALTH {
            assert!(resolve(world.attack(zombie)).is_ok());
        }
        assert!(world.entities().is_empty());
    }

    #[test]
    fn find_nearest_sorts_by_distance() {
        let mut world = GridWorld::flat(8);
        world.set_block(Position::new(5, 1, 0), BlockDescriptor::solid("stone"));
        world.set_block(Position::new(2, 1, 0), BlockDescriptor::solid("stone"));
        world.set_block(Position::new(7, 1, 7), BlockDescriptor::solid("stone"));
        let found = world.find_nearest_of_kind(&ItemKind::from("stone"), 6, 5);
        assert_eq!(found, vec![Position::new(2, 1, 0), Position::new(5, 1, 0)]);
    }

    #[test]
    fn fishing_needs_water() {
        let mut world = GridWorld::flat(4);
        world.give("fishing_rod", 1).unwrap();
        world.set_cast_latency(0);
        let rod = ItemKind::from("fishing_rod");
        assert!(resolve(world.use_item(&rod, Some(Position::new(1, 1, 1)))).is_err());
        world.set_block(Position::new(1, 1, 1), BlockDescriptor::passable("water"));
        assert!(resolve(world.use_item(&rod, Some(Position::new(1, 1, 1)))).is_ok());
        assert_eq!(world.held(CATCH_ITEM), 1);
    }
}
