//! End-to-end scenarios driving the full controller over a grid world.

#![allow(clippy::unwrap_used)]

use blockwright_behaviors::RecipeBook;
use blockwright_core::Controller;
use blockwright_core::config::AgentConfig;
use blockwright_core::context::Shared;
use blockwright_core::status::{StatusKind, StatusMessage};
use blockwright_types::{
    ActionKind, BlockDescriptor, Dimensions, Directive, EntityCategory, Goal, ItemKind, Position,
    Recipe, StateKind, StructureKind,
};
use blockwright_world::{GridWorld, World};

fn controller() -> Controller {
    Controller::new(Shared::new(AgentConfig::default(), RecipeBook::standard())).unwrap()
}

fn wall(dimensions: Option<Dimensions>) -> Directive {
    Directive::Assign {
        goal: Goal::Build {
            kind: StructureKind::Wall,
            dimensions,
        },
    }
}

/// Tick until a status message of `kind` appears. Returns the message.
fn run_until(
    controller: &mut Controller,
    world: &mut GridWorld,
    kind: StatusKind,
    limit: u64,
) -> Option<StatusMessage> {
    for _ in 0..limit {
        controller.tick(world);
        if let Some(found) = controller.status().messages().find(|m| m.kind == kind) {
            return Some(found.clone());
        }
    }
    None
}

fn wall_cells(anchor: Position, width: i32, height: i32) -> Vec<Position> {
    let mut cells = Vec::new();
    for y in 0..height {
        for x in 0..width {
            cells.push(anchor.offset(x, y, 0));
        }
    }
    cells
}

#[test]
fn wall_of_fifteen_blocks_is_built_completely() {
    let mut world = GridWorld::flat(12);
    world.give("cobblestone", 20).unwrap();
    let mut controller = controller();
    controller.submit(wall(None));

    let done = run_until(&mut controller, &mut world, StatusKind::GoalComplete, 400).unwrap();
    assert!(done.text.contains("15/15 blocks placed (100%)"), "{}", done.text);
    assert_eq!(world.held("cobblestone"), 5);
    for cell in wall_cells(Position::new(0, 1, 0), 5, 3) {
        assert!(world.is_solid(cell), "{cell} not placed");
    }

    controller.tick(&mut world);
    assert_eq!(controller.active(), StateKind::Idle);
    assert!(controller.is_settled());
}

#[test]
fn crafting_table_from_a_single_log() {
    let mut world = GridWorld::flat(6);
    world.give("log", 1).unwrap();
    let mut controller = controller();
    controller.submit(Directive::Assign {
        goal: Goal::Craft {
            item: ItemKind::from("crafting_table"),
            count: 1,
        },
    });

    assert!(run_until(&mut controller, &mut world, StatusKind::GoalComplete, 100).is_some());
    assert_eq!(world.held("crafting_table"), 1);
    assert_eq!(world.held("log"), 0);
    assert_eq!(controller.status().count_of(StatusKind::GoalUnreachable), 0);
}

#[test]
fn combat_preempts_a_build_and_the_build_replans() {
    let mut world = GridWorld::flat(20);
    world.give("cobblestone", 20).unwrap();
    world.set_latency(1);
    let mut controller = controller();
    controller.submit(wall(None));
    for _ in 0..6 {
        controller.tick(&mut world);
    }
    assert_eq!(controller.active(), StateKind::Build);
    assert!(controller.state(StateKind::Build).unwrap().plan().is_some());

    world.spawn("zombie", EntityCategory::Hostile, Position::new(0, 1, 5), None);
    controller.tick(&mut world);
    assert_eq!(controller.active(), StateKind::Combat);
    let build = controller.state(StateKind::Build).unwrap();
    assert!(build.plan().is_none());
    assert!(build.goal().is_some());

    let done = run_until(&mut controller, &mut world, StatusKind::GoalComplete, 600).unwrap();
    assert_eq!(done.state, StateKind::Build);
    assert!(done.text.contains("15/15"), "{}", done.text);
    assert!(world.entities().is_empty());
    assert_eq!(
        controller
            .status()
            .messages()
            .filter(|m| m.state == StateKind::Combat)
            .count(),
        1
    );
}

#[test]
fn buried_agent_clears_the_site_before_building() {
    let mut world = GridWorld::flat(14);
    world.fill(
        Position::new(-14, 1, -14),
        Position::new(14, 6, 14),
        &BlockDescriptor::solid("stone"),
    );
    world.set_agent_position(Position::new(0, 5, 0));
    world.give("cobblestone", 10).unwrap();
    world.set_latency(1);
    let mut controller = controller();
    controller.submit(wall(Some(Dimensions::new(3, 1, 2))));
    controller.tick(&mut world);

    let plan = controller.state(StateKind::Build).unwrap().plan().unwrap();
    let actions: Vec<ActionKind> = plan.steps().map(|s| s.action.clone()).collect();
    assert_eq!(actions.len(), 12);
    assert!(actions.iter().take(6).all(|a| *a == ActionKind::Dig));

    let done = run_until(&mut controller, &mut world, StatusKind::GoalComplete, 400).unwrap();
    assert!(done.text.contains("at (0, 5, 0)"), "{}", done.text);
    for cell in wall_cells(Position::new(0, 5, 0), 3, 2) {
        assert!(world.is_solid(cell), "{cell} not placed");
    }
}

#[test]
fn failing_step_is_dropped_after_its_retries() {
    let mut world = GridWorld::flat(12);
    world.give("cobblestone", 20).unwrap();
    world.phantom_at(Position::new(2, 3, 0));
    let mut controller = controller();
    controller.submit(wall(None));

    let done = run_until(&mut controller, &mut world, StatusKind::GoalComplete, 400).unwrap();
    assert!(done.text.contains("14/15"), "{}", done.text);
    assert_eq!(controller.status().count_of(StatusKind::StepDropped), 1);
    // Three swallowed placements, one per attempt.
    assert_eq!(world.held("cobblestone"), 3);
}

#[test]
fn cyclic_recipe_goal_is_reported_unreachable() {
    let mut book = RecipeBook::new();
    for (id, output, input) in [("a", "alpha", "beta"), ("b", "beta", "alpha")] {
        book.insert(Recipe {
            id: String::from(id),
            output: ItemKind::from(output),
            output_count: 1,
            ingredients: [(ItemKind::from(input), 1)].into_iter().collect(),
            requires_station: false,
        });
    }
    let mut controller = Controller::new(Shared::new(AgentConfig::default(), book)).unwrap();
    let mut world = GridWorld::flat(4);
    controller.submit(Directive::Assign {
        goal: Goal::Craft {
            item: ItemKind::from("alpha"),
            count: 1,
        },
    });
    assert!(run_until(&mut controller, &mut world, StatusKind::GoalUnreachable, 10).is_some());
    controller.tick(&mut world);
    assert_eq!(controller.active(), StateKind::Idle);
    assert!(controller.pending_goals().is_empty());
}

#[test]
fn exactly_one_state_is_active_through_a_busy_run() {
    let mut world = GridWorld::flat(16);
    world.give("cobblestone", 30).unwrap();
    world.spawn("player", EntityCategory::Player, Position::new(12, 1, 12), Some("alex"));
    let mut controller = controller();
    controller.submit(wall(None));
    controller.submit(Directive::Assign {
        goal: Goal::Follow {
            owner: String::from("alex"),
        },
    });
    let mut seen = Vec::new();
    for tick in 0..300_u64 {
        if tick == 40 {
            let near = world.position().offset(2, 0, 0);
            world.spawn("zombie", EntityCategory::Hostile, near, None);
        }
        controller.tick(&mut world);
        let active = controller.active();
        assert!(controller.state(active).is_some());
        if seen.last() != Some(&active) {
            seen.push(active);
        }
    }
    assert!(seen.contains(&StateKind::Follow));
    assert!(seen.contains(&StateKind::Combat));
    assert!(seen.contains(&StateKind::Build));
}

#[test]
fn unreachable_owner_does_not_starve_the_build() {
    let mut world = GridWorld::flat(24);
    world.give("cobblestone", 20).unwrap();
    let owner_at = Position::new(20, 1, 20);
    world.spawn("player", EntityCategory::Player, owner_at, Some("alex"));
    world.block_path(owner_at);
    let mut controller = controller();
    controller.submit(wall(None));
    controller.submit(Directive::Assign {
        goal: Goal::Follow {
            owner: String::from("alex"),
        },
    });

    let mut follows = 0;
    let mut previous = controller.active();
    let mut done = None;
    for _ in 0..600 {
        controller.tick(&mut world);
        let active = controller.active();
        if active == StateKind::Follow && previous != StateKind::Follow {
            follows += 1;
        }
        previous = active;
        done = controller
            .status()
            .messages()
            .find(|m| m.kind == StatusKind::GoalComplete)
            .cloned();
        if done.is_some() {
            break;
        }
    }
    let done = done.unwrap();
    assert_eq!(done.state, StateKind::Build);
    assert!(done.text.contains("15/15"), "{}", done.text);
    assert!(follows <= 1, "follow entered {follows} times");
}

#[test]
fn unreachable_hostile_is_given_up_and_the_build_finishes() {
    let mut world = GridWorld::flat(20);
    world.give("cobblestone", 20).unwrap();
    let skeleton_at = Position::new(6, 1, 6);
    world.spawn("skeleton", EntityCategory::Hostile, skeleton_at, None);
    world.block_path(skeleton_at);
    let mut controller = controller();
    controller.submit(wall(None));

    let done = run_until(&mut controller, &mut world, StatusKind::GoalComplete, 600).unwrap();
    assert_eq!(done.state, StateKind::Build);
    assert_eq!(world.entities().len(), 1);
    let given_up = controller
        .status()
        .messages()
        .filter(|m| m.kind == StatusKind::GoalUnreachable && m.state == StateKind::Combat)
        .count();
    assert_eq!(given_up, 1);
}
