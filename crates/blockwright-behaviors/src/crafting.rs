//! Crafting resolution.
//!
//! Turns "make N of item X" into an ordered list of craft orders plus the
//! raw materials that have to be gathered first.
//!
//! - [`RecipeBook`] holds every known recipe, keyed by output
//! - [`select_recipe`] prefers a recipe that is already satisfiable and
//!   otherwise the one with the fewest distinct ingredients
//! - [`gap_analysis`] lists the per-ingredient shortfall
//! - [`resolve`] expands the dependency chain with an explicit work stack
//!   over a virtual inventory. A per-chain visited set and a depth bound
//!   make misconfigured (cyclic) recipe graphs fail with
//!   [`BehaviorError::GoalUnreachable`] instead of recursing forever
//! - [`CraftQueue`] runs the resulting orders front to back, rotating blocked
//!   entries to the back and reporting a livelock after a full pass in which
//!   every entry was blocked
//! - [`resolve_station`] picks how a crafting station will be provided

use std::collections::{BTreeMap, VecDeque};

use blockwright_types::{Face, ItemKind, Position, Recipe, ResourceRequirement};
use blockwright_world::World;
use tracing::debug;

use crate::error::BehaviorError;

/// Default bound on dependency depth.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Block kind of a crafting station.
pub const STATION: &str = "crafting_table";

// ---------------------------------------------------------------------------
// Recipe book
// ---------------------------------------------------------------------------

/// Every recipe the agent knows, grouped by output item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeBook {
    by_output: BTreeMap<ItemKind, Vec<Recipe>>,
}

fn recipe(id: &str, output: &str, output_count: u32, ingredients: &[(&str, u32)], station: bool) -> Recipe {
    Recipe {
        id: id.to_owned(),
        output: ItemKind::from(output),
        output_count,
        ingredients: ingredients
            .iter()
            .map(|(item, n)| (ItemKind::from(*item), *n))
            .collect(),
        requires_station: station,
    }
}

impl RecipeBook {
    /// An empty book.
    pub const fn new() -> Self {
        Self {
            by_output: BTreeMap::new(),
        }
    }

    /// The recipes the agent ships with.
    pub fn standard() -> Self {
        let mut book = Self::new();
        for r in [
            recipe("planks_from_log", "planks", 4, &[("log", 1)], false),
            recipe("sticks", "stick", 4, &[("planks", 2)], false),
            recipe("crafting_table", STATION, 1, &[("planks", 4)], false),
            recipe("wooden_pickaxe", "wooden_pickaxe", 1, &[("planks", 3), ("stick", 2)], true),
            recipe("stone_pickaxe", "stone_pickaxe", 1, &[("cobblestone", 3), ("stick", 2)], true),
            recipe("iron_pickaxe", "iron_pickaxe", 1, &[("iron_ingot", 3), ("stick", 2)], true),
            recipe("furnace", "furnace", 1, &[("cobblestone", 8)], true),
            recipe("bread", "bread", 1, &[("wheat", 3)], true),
            recipe("fishing_rod", "fishing_rod", 1, &[("stick", 3), ("string", 2)], true),
            recipe("torch", "torch", 4, &[("stick", 1), ("coal", 1)], false),
        ] {
            book.insert(r);
        }
        book
    }

    /// Add a recipe. Recipes for one output keep insertion order.
    pub fn insert(&mut self, recipe: Recipe) {
        self.by_output
            .entry(recipe.output.clone())
            .or_default()
            .push(recipe);
    }

    /// Every recipe producing `item`, in insertion order.
    pub fn recipes_for(&self, item: &ItemKind) -> &[Recipe] {
        self.by_output.get(item).map_or(&[], Vec::as_slice)
    }

    /// Whether `item` has no recipe and must be gathered.
    pub fn is_raw(&self, item: &ItemKind) -> bool {
        self.recipes_for(item).is_empty()
    }

    /// Number of recipes in the book.
    pub fn len(&self) -> usize {
        self.by_output.values().map(Vec::len).sum()
    }

    /// Whether the book is empty.
    pub fn is_empty(&self) -> bool {
        self.by_output.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Selection and gap analysis
// ---------------------------------------------------------------------------

fn held_of(held: &BTreeMap<ItemKind, u32>, item: &ItemKind) -> u32 {
    held.get(item).copied().unwrap_or(0)
}

/// Shortfall per ingredient for running `recipe` `crafts` times.
pub fn gap_analysis(
    recipe: &Recipe,
    crafts: u32,
    held: &BTreeMap<ItemKind, u32>,
) -> Vec<ResourceRequirement> {
    recipe
        .ingredients
        .iter()
        .filter_map(|(item, per_craft)| {
            let needed = per_craft.saturating_mul(crafts);
            let short = needed.saturating_sub(held_of(held, item));
            (short > 0).then(|| ResourceRequirement {
                item: item.clone(),
                count: short,
            })
        })
        .collect()
}

/// Choose the recipe to produce `count` of an item.
pub fn select_recipe<'a>(
    recipes: &'a [Recipe],
    held: &BTreeMap<ItemKind, u32>,
    count: u32,
) -> Option<&'a Recipe> {
    recipes
        .iter()
        .find(|r| gap_analysis(r, r.crafts_for(count), held).is_empty())
        .or_else(|| recipes.iter().min_by_key(|r| r.ingredients.len()))
}

// ---------------------------------------------------------------------------
// Dependency resolution
// ---------------------------------------------------------------------------

/// One batch of crafts, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CraftOrder {
    /// Recipe to apply.
    pub recipe: Recipe,
    /// Number of times to apply it.
    pub crafts: u32,
}

/// Outcome of [`resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Craft orders, dependencies first.
    pub orders: Vec<CraftOrder>,
    /// Raw materials that must be gathered before the orders can run.
    pub raw: Vec<ResourceRequirement>,
}

impl Resolution {
    /// Whether any order needs a crafting station.
    pub fn needs_station(&self) -> bool {
        self.orders.iter().any(|o| o.recipe.requires_station)
    }

    /// Whether the orders can run with what is held now.
    pub fn is_ready(&self) -> bool {
        self.raw.is_empty()
    }
}

enum Frame {
    Need {
        item: ItemKind,
        count: u32,
        chain: Vec<ItemKind>,
    },
    Produce {
        recipe: Recipe,
        crafts: u32,
        consumed: u32,
    },
}

/// Expand `targets` into craft orders and raw-material requirements.
///
/// Works against a copy of `held`, so intermediates produced by an earlier
/// order are available to later ones. Each frame carries the chain of items
/// that led to it; meeting an item already on its own chain, or a chain
/// longer than `max_depth`, aborts with [`BehaviorError::GoalUnreachable`].
pub fn resolve(
    book: &RecipeBook,
    targets: &[ResourceRequirement],
    held: &BTreeMap<ItemKind, u32>,
    max_depth: usize,
) -> Result<Resolution, BehaviorError> {
    let goal = targets
        .iter()
        .map(|t| format!("{} {}", t.count, t.item))
        .collect::<Vec<_>>()
        .join(", ");
    let mut virtual_held = held.clone();
    let mut raw: BTreeMap<ItemKind, u32> = BTreeMap::new();
    let mut orders = Vec::new();
    let mut stack: Vec<Frame> = targets
        .iter()
        .rev()
        .map(|t| Frame::Need {
            item: t.item.clone(),
            count: t.count,
            chain: Vec::new(),
        })
        .collect();

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Need { item, count, chain } => {
                let have = held_of(&virtual_held, &item);
                let short = count.saturating_sub(have);
                virtual_held.insert(item.clone(), have.saturating_sub(count));
                if short == 0 {
                    continue;
                }
                if book.is_raw(&item) {
                    let entry = raw.entry(item).or_insert(0);
                    *entry = entry.saturating_add(short);
                    continue;
                }
                if chain.contains(&item) {
                    return Err(BehaviorError::unreachable(
                        goal,
                        format!("recipe cycle through {item}"),
                    ));
                }
                if chain.len() >= max_depth {
                    return Err(BehaviorError::unreachable(
                        goal,
                        format!("dependency chain deeper than {max_depth} at {item}"),
                    ));
                }
                let recipe = select_recipe(book.recipes_for(&item), &virtual_held, short)
                    .ok_or_else(|| BehaviorError::NoRecipe(item.clone()))?
                    .clone();
                if recipe.output_count == 0 {
                    return Err(BehaviorError::unreachable(
                        goal,
                        format!("recipe {} produces nothing", recipe.id),
                    ));
                }
                let crafts = recipe.crafts_for(short);
                let mut next_chain = chain;
                next_chain.push(item);
                let ingredients: Vec<(ItemKind, u32)> = recipe
                    .ingredients
                    .iter()
                    .map(|(ing, per)| (ing.clone(), per.saturating_mul(crafts)))
                    .collect();
                stack.push(Frame::Produce {
                    recipe,
                    crafts,
                    consumed: short,
                });
                for (ing, needed) in ingredients.into_iter().rev() {
                    stack.push(Frame::Need {
                        item: ing,
                        count: needed,
                        chain: next_chain.clone(),
                    });
                }
            }
            Frame::Produce {
                recipe,
                crafts,
                consumed,
            } => {
                let produced = recipe.output_count.saturating_mul(crafts);
                let surplus = produced.saturating_sub(consumed);
                let entry = virtual_held.entry(recipe.output.clone()).or_insert(0);
                *entry = entry.saturating_add(surplus);
                debug!(recipe = %recipe.id, crafts, "craft order resolved");
                orders.push(CraftOrder { recipe, crafts });
            }
        }
    }

    Ok(Resolution {
        orders,
        raw: raw
            .into_iter()
            .map(|(item, count)| ResourceRequirement { item, count })
            .collect(),
    })
}

// ---------------------------------------------------------------------------
// Craft queue
// ---------------------------------------------------------------------------

/// A queued craft order and what it was last missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CraftEntry {
    /// The order.
    pub order: CraftOrder,
    /// Ingredient shortfall seen on the last check, empty when ready.
    pub missing: Vec<ResourceRequirement>,
}

/// Result of asking the queue for work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueStatus {
    /// The front entry can run now.
    Ready,
    /// Nothing left to craft.
    Empty,
    /// Every entry was checked once and every one was blocked.
    Unreachable {
        /// Combined shortfall of all blocked entries.
        missing: Vec<ResourceRequirement>,
    },
}

/// Ordered craft orders with a livelock check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CraftQueue {
    entries: VecDeque<CraftEntry>,
    completed: usize,
}

impl CraftQueue {
    /// Build a queue from resolved orders.
    pub fn new(orders: Vec<CraftOrder>) -> Self {
        Self {
            entries: orders
                .into_iter()
                .map(|order| CraftEntry {
                    order,
                    missing: Vec::new(),
                })
                .collect(),
            completed: 0,
        }
    }

    /// Entries still queued.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries remain.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Orders finished so far.
    pub const fn completed(&self) -> usize {
        self.completed
    }

    /// The entry at the front.
    pub fn front(&self) -> Option<&CraftEntry> {
        self.entries.front()
    }

    /// Bring a runnable entry to the front.
    ///
    /// Blocked entries record their shortfall and rotate to the back. After
    /// one full pass with every entry blocked the queue reports
    /// [`QueueStatus::Unreachable`].
    pub fn next_ready(&mut self, held: &BTreeMap<ItemKind, u32>) -> QueueStatus {
        for _ in 0..self.entries.len() {
            let Some(front) = self.entries.front_mut() else {
                break;
            };
            front.missing = gap_analysis(&front.order.recipe, front.order.crafts, held);
            if front.missing.is_empty() {
                return QueueStatus::Ready;
            }
            debug!(
                recipe = %front.order.recipe.id,
                missing = front.missing.len(),
                "craft entry blocked, requeued"
            );
            self.entries.rotate_left(1);
        }
        if self.entries.is_empty() {
            return QueueStatus::Empty;
        }
        let mut missing: BTreeMap<ItemKind, u32> = BTreeMap::new();
        for req in self.entries.iter().flat_map(|e| e.missing.iter()) {
            let entry = missing.entry(req.item.clone()).or_insert(0);
            *entry = entry.saturating_add(req.count);
        }
        QueueStatus::Unreachable {
            missing: missing
                .into_iter()
                .map(|(item, count)| ResourceRequirement { item, count })
                .collect(),
        }
    }

    /// Remove the front entry after it was crafted.
    pub fn complete_front(&mut self) -> Option<CraftEntry> {
        let done = self.entries.pop_front();
        if done.is_some() {
            self.completed = self.completed.saturating_add(1);
        }
        done
    }

    /// Move the front entry to the back.
    pub fn defer_front(&mut self) {
        if let Some(entry) = self.entries.pop_front() {
            self.entries.push_back(entry);
        }
    }

    /// Queue orders ahead of everything else, keeping their order.
    pub fn push_front_all(&mut self, orders: Vec<CraftOrder>) {
        for order in orders.into_iter().rev() {
            self.entries.push_front(CraftEntry {
                order,
                missing: Vec::new(),
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Station resolution
// ---------------------------------------------------------------------------

/// How a crafting station will be provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationPlan {
    /// The remembered station is still standing.
    Known(Position),
    /// A station was found nearby.
    Found(Position),
    /// A held station can be placed against `reference`.
    PlaceFromInventory {
        /// Solid block to place against.
        reference: Position,
        /// Face of `reference` to place on.
        face: Face,
    },
    /// A station has to be crafted first.
    CraftThenPlace,
    /// No spot next to the agent accepts a station.
    Unavailable,
}

fn is_station(world: &dyn World, pos: Position) -> bool {
    world
        .query_block(pos)
        .is_some_and(|b| b.kind.as_str() == STATION)
}

/// A spot beside the agent where a station can stand.
pub fn station_spot(world: &dyn World) -> Option<(Position, Face)> {
    let agent = world.position();
    Face::LATERAL.into_iter().find_map(|dir| {
        let spot = agent.neighbor(dir);
        let open = world
            .query_block(spot)
            .is_some_and(|b| !b.solid && b.growth.is_none());
        let floor = world.query_block(spot.below()).is_some_and(|b| b.solid);
        (open && floor).then_some((spot.below(), Face::Up))
    })
}

/// Decide how to get a station: remembered, found, placed, or crafted.
pub fn resolve_station(
    world: &dyn World,
    known: Option<Position>,
    search_radius: u32,
    held: &BTreeMap<ItemKind, u32>,
) -> StationPlan {
    if let Some(pos) = known.filter(|pos| is_station(world, *pos)) {
        return StationPlan::Known(pos);
    }
    let kind = ItemKind::from(STATION);
    if let Some(pos) = world
        .find_nearest_of_kind(&kind, search_radius, 1)
        .into_iter()
        .next()
    {
        return StationPlan::Found(pos);
    }
    if held_of(held, &kind) == 0 {
        return StationPlan::CraftThenPlace;
    }
    match station_spot(world) {
        Some((reference, face)) => StationPlan::PlaceFromInventory { reference, face },
        None => StationPlan::Unavailable,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use blockwright_types::BlockDescriptor;
    use blockwright_world::GridWorld;

    use super::*;

    fn held(items: &[(&str, u32)]) -> BTreeMap<ItemKind, u32> {
        items
            .iter()
            .map(|(k, n)| (ItemKind::from(*k), *n))
            .collect()
    }

    fn need(item: &str, count: u32) -> Vec<ResourceRequirement> {
        vec![ResourceRequirement::new(item, count)]
    }

    #[test]
    fn table_from_one_log_queues_planks_then_table() {
        let book = RecipeBook::standard();
        let res = resolve(&book, &need(STATION, 1), &held(&[("log", 1)]), DEFAULT_MAX_DEPTH).unwrap();
        let ids: Vec<&str> = res.orders.iter().map(|o| o.recipe.id.as_str()).collect();
        assert_eq!(ids, vec!["planks_from_log", "crafting_table"]);
        assert!(res.is_ready());
        assert!(!res.needs_station());
    }

    #[test]
    fn missing_logs_become_raw_requirements() {
        let book = RecipeBook::standard();
        let res = resolve(&book, &need("wooden_pickaxe", 1), &BTreeMap::new(), DEFAULT_MAX_DEPTH).unwrap();
        // 3 planks for the head leave 1 spare, sticks need 1 more: 2 logs.
        assert_eq!(res.raw, vec![ResourceRequirement::new("log", 2)]);
        assert!(res.needs_station());
        let ids: Vec<&str> = res.orders.iter().map(|o| o.recipe.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["planks_from_log", "planks_from_log", "sticks", "wooden_pickaxe"]
        );
    }

    #[test]
    fn surplus_intermediates_are_reused() {
        let book = RecipeBook::standard();
        let res = resolve(
            &book,
            &[ResourceRequirement::new("stick", 4), ResourceRequirement::new(STATION, 1)],
            &held(&[("log", 2)]),
            DEFAULT_MAX_DEPTH,
        )
        .unwrap();
        let planks_crafts: u32 = res
            .orders
            .iter()
            .filter(|o| o.recipe.id == "planks_from_log")
            .map(|o| o.crafts)
            .sum();
        // 2 planks for sticks + 4 for the table, one craft leaves 2 spare.
        assert_eq!(planks_crafts, 2);
        assert!(res.is_ready());
    }

    #[test]
    fn cyclic_recipes_are_unreachable() {
        let mut book = RecipeBook::new();
        book.insert(recipe("a_from_b", "a", 1, &[("b", 1)], false));
        book.insert(recipe("b_from_a", "b", 1, &[("a", 1)], false));
        let err = resolve(&book, &need("a", 1), &BTreeMap::new(), DEFAULT_MAX_DEPTH).unwrap_err();
        assert!(matches!(err, BehaviorError::GoalUnreachable { .. }));
    }

    #[test]
    fn depth_bound_is_enforced() {
        let mut book = RecipeBook::new();
        for i in 0..10 {
            let output = format!("tier{i}");
            let input = format!("tier{}", i + 1);
            book.insert(recipe(&output, &output, 1, &[(input.as_str(), 1)], false));
        }
        let err = resolve(&book, &need("tier0", 1), &BTreeMap::new(), 4).unwrap_err();
        assert!(matches!(err, BehaviorError::GoalUnreachable { .. }));
        assert!(resolve(&book, &need("tier0", 1), &BTreeMap::new(), 12).is_ok());
    }

    #[test]
    fn satisfied_recipe_wins_over_simpler_one() {
        let recipes = vec![
            recipe("rich", "x", 1, &[("gold", 1), ("gem", 1)], false),
            recipe("simple", "x", 1, &[("dirt", 9)], false),
        ];
        let chosen = select_recipe(&recipes, &held(&[("gold", 1), ("gem", 1)]), 1).unwrap();
        assert_eq!(chosen.id, "rich");
        let chosen = select_recipe(&recipes, &BTreeMap::new(), 1).unwrap();
        assert_eq!(chosen.id, "simple");
    }

    #[test]
    fn gap_analysis_reports_shortfall_only() {
        let r = recipe("furnace", "furnace", 1, &[("cobblestone", 8)], true);
        let gaps = gap_analysis(&r, 2, &held(&[("cobblestone", 10)]));
        assert_eq!(gaps, vec![ResourceRequirement::new("cobblestone", 6)]);
    }

    #[test]
    fn queue_rotates_blocked_entries() {
        let book = RecipeBook::standard();
        let table = book.recipes_for(&ItemKind::from(STATION)).first().cloned().unwrap();
        let planks = book.recipes_for(&ItemKind::from("planks")).first().cloned().unwrap();
        let mut queue = CraftQueue::new(vec![
            CraftOrder { recipe: table, crafts: 1 },
            CraftOrder { recipe: planks, crafts: 1 },
        ]);
        assert_eq!(queue.next_ready(&held(&[("log", 1)])), QueueStatus::Ready);
        assert_eq!(queue.front().map(|e| e.order.recipe.id.as_str()), Some("planks_from_log"));
        queue.complete_front();
        assert_eq!(queue.next_ready(&held(&[("planks", 4)])), QueueStatus::Ready);
        queue.complete_front();
        assert_eq!(queue.next_ready(&BTreeMap::new()), QueueStatus::Empty);
        assert_eq!(queue.completed(), 2);
    }

    #[test]
    fn unobtainable_queue_is_unreachable_within_one_pass() {
        let book = RecipeBook::standard();
        let iron = book.recipes_for(&ItemKind::from("iron_pickaxe")).first().cloned().unwrap();
        let furnace = book.recipes_for(&ItemKind::from("furnace")).first().cloned().unwrap();
        let mut queue = CraftQueue::new(vec![
            CraftOrder { recipe: iron, crafts: 1 },
            CraftOrder { recipe: furnace, crafts: 1 },
        ]);
        assert_eq!(
            queue.next_ready(&BTreeMap::new()),
            QueueStatus::Unreachable {
                missing: vec![
                    ResourceRequirement::new("cobblestone", 8),
                    ResourceRequirement::new("iron_ingot", 3),
                    ResourceRequirement::new("stick", 2),
                ]
            }
        );
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn push_front_keeps_order() {
        let book = RecipeBook::standard();
        let planks = book.recipes_for(&ItemKind::from("planks")).first().cloned().unwrap();
        let sticks = book.recipes_for(&ItemKind::from("stick")).first().cloned().unwrap();
        let mut queue = CraftQueue::new(vec![CraftOrder { recipe: sticks.clone(), crafts: 1 }]);
        queue.push_front_all(vec![CraftOrder { recipe: planks, crafts: 1 }]);
        assert_eq!(queue.front().map(|e| e.order.recipe.id.as_str()), Some("planks_from_log"));
        queue.defer_front();
        assert_eq!(queue.front().map(|e| e.order.recipe.id.as_str()), Some(sticks.id.as_str()));
    }

    #[test]
    fn station_fallbacks_in_order() {
        let mut world = GridWorld::flat(8);
        let none = BTreeMap::new();
        assert_eq!(resolve_station(&world, None, 16, &none), StationPlan::CraftThenPlace);

        let with_table = held(&[(STATION, 1)]);
        assert!(matches!(
            resolve_station(&world, None, 16, &with_table),
            StationPlan::PlaceFromInventory { face: Face::Up, .. }
        ));

        let table = Position::new(3, 1, 3);
        world.set_block(table, BlockDescriptor::solid(STATION));
        assert_eq!(resolve_station(&world, None, 16, &none), StationPlan::Found(table));
        assert_eq!(resolve_station(&world, Some(table), 16, &none), StationPlan::Known(table));

        world.set_block(table, BlockDescriptor::air());
        assert_eq!(
            resolve_station(&world, Some(table), 16, &none),
            StationPlan::CraftThenPlace
        );
    }
}
