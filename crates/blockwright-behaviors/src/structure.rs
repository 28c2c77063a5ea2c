//! Structure planning: site search and layout generation.
//!
//! - [`default_dimensions`] returns the structure-kind table entry
//! - [`layout`] generates the ordered cell offsets for a structure, relative
//!   to its anchor (the minimum corner of the first layer)
//! - [`find_site`] runs the expanding-ring search for an open, supported
//!   volume around the agent
//! - [`plan_build`] ties the two together and falls back to clearing the
//!   area at the agent's position when no site is found
//!
//! Layouts are pure functions of kind and dimensions, ordered bottom-up,
//! then by z, then by x, so re-planning the same request always yields the
//! same step list.

use blockwright_types::{Dimensions, ItemKind, Position, Step, StructureKind};
use blockwright_world::World;
use tracing::{debug, info};

/// Default ring radius for the site search.
pub const DEFAULT_SEARCH_RADIUS: u32 = 10;

/// How far below the agent's feet a supporting surface may lie.
pub const DEFAULT_MAX_SURFACE_DROP: u32 = 3;

/// Largest accepted extent along any axis.
pub const MAX_EXTENT: u32 = 64;

// ---------------------------------------------------------------------------
// Structure-kind table
// ---------------------------------------------------------------------------

/// Default dimensions for each structure kind.
pub const fn default_dimensions(kind: StructureKind) -> Dimensions {
    match kind {
        StructureKind::Wall => Dimensions::new(5, 1, 3),
        StructureKind::Tower => Dimensions::new(5, 5, 8),
        StructureKind::House => Dimensions::new(7, 7, 4),
        StructureKind::Bridge => Dimensions::new(3, 8, 1),
        StructureKind::Staircase => Dimensions::new(1, 5, 5),
    }
}

fn extent(n: u32) -> i32 {
    i32::try_from(n.min(MAX_EXTENT)).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Layouts
// ---------------------------------------------------------------------------

/// Cell offsets for `kind` at `dims`, ordered bottom-up, then by z, then by x.
pub fn layout(kind: StructureKind, dims: Dimensions) -> Vec<Position> {
    let mut cells = match kind {
        StructureKind::Wall => wall(dims),
        StructureKind::Tower => tower(dims),
        StructureKind::House => house(dims),
        StructureKind::Bridge => bridge(dims),
        StructureKind::Staircase => staircase(dims),
    };
    cells.sort_by_key(|c| (c.y, c.z, c.x));
    cells.dedup();
    cells
}

fn wall(dims: Dimensions) -> Vec<Position> {
    let (w, h) = (extent(dims.width), extent(dims.height));
    let mut cells = Vec::new();
    for y in 0..h {
        for x in 0..w {
            cells.push(Position::new(x, y, 0));
        }
    }
    cells
}

/// Whether `(x, z)` lies on the outer ring of a `w` by `l` footprint.
const fn on_perimeter(x: i32, z: i32, w: i32, l: i32) -> bool {
    x == 0 || z == 0 || x == w.saturating_sub(1) || z == l.saturating_sub(1)
}

fn tower(dims: Dimensions) -> Vec<Position> {
    let (w, l, h) = (
        extent(dims.width),
        extent(dims.length),
        extent(dims.height),
    );
    let top = h.saturating_sub(1);
    let mut cells = Vec::new();
    for y in 0..h {
        let solid_layer = y == 0 || y == top;
        for z in 0..l {
            for x in 0..w {
                if solid_layer || on_perimeter(x, z, w, l) {
                    cells.push(Position::new(x, y, z));
                }
            }
        }
    }
    cells
}

fn house(dims: Dimensions) -> Vec<Position> {
    let (w, l, h) = (
        extent(dims.width),
        extent(dims.length),
        extent(dims.height),
    );
    let door_x = w / 2;
    let mut cells = Vec::new();
    for z in 0..l {
        for x in 0..w {
            cells.push(Position::new(x, 0, z));
        }
    }
    for y in 1..=h {
        for z in 0..l {
            for x in 0..w {
                let door = z == 0 && x == door_x && y <= 2;
                if on_perimeter(x, z, w, l) && !door {
                    cells.push(Position::new(x, y, z));
                }
            }
        }
    }
    let roof = h.saturating_add(1);
    for z in -1..=l {
        for x in -1..=w {
            cells.push(Position::new(x, roof, z));
        }
    }
    cells
}

fn bridge(dims: Dimensions) -> Vec<Position> {
    let (w, l) = (extent(dims.width).max(1), extent(dims.length));
    // A single-cell deck keeps its walkway and hangs the rails beside it.
    let (left, right) = if w < 2 { (-1, w) } else { (0, w.saturating_sub(1)) };
    let mut cells = Vec::new();
    for z in 0..l {
        for x in 0..w {
            cells.push(Position::new(x, 0, z));
        }
        cells.push(Position::new(left, 1, z));
        cells.push(Position::new(right, 1, z));
    }
    cells
}

fn staircase(dims: Dimensions) -> Vec<Position> {
    let rise = extent(dims.height.min(dims.length));
    let mut cells = Vec::new();
    for i in 0..rise {
        for y in 0..i {
            cells.push(Position::new(0, y, i));
        }
        cells.push(Position::new(0, i, i));
        cells.push(Position::new(-1, i, i));
        cells.push(Position::new(1, i, i));
    }
    cells
}

// ---------------------------------------------------------------------------
// Site search
// ---------------------------------------------------------------------------

/// Parameters for [`find_site`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteSearch {
    /// Largest Chebyshev ring examined.
    pub radius: u32,
    /// Deepest supporting surface accepted below the agent's feet.
    pub max_surface_drop: u32,
}

impl Default for SiteSearch {
    fn default() -> Self {
        Self {
            radius: DEFAULT_SEARCH_RADIUS,
            max_surface_drop: DEFAULT_MAX_SURFACE_DROP,
        }
    }
}

/// Column offsets on Chebyshev ring `r`, ordered by z then x.
pub fn ring(r: i32) -> Vec<(i32, i32)> {
    if r <= 0 {
        return vec![(0, 0)];
    }
    let mut out = Vec::new();
    for dz in r.saturating_neg()..=r {
        for dx in r.saturating_neg()..=r {
            if dx.abs() == r || dz.abs() == r {
                out.push((dx, dz));
            }
        }
    }
    out
}

/// The first solid block straight below `top`, at most `max_drop` down.
fn surface_below(world: &dyn World, top: Position, max_drop: u32) -> Option<Position> {
    let depth = extent(max_drop);
    for drop in 1..=depth {
        let pos = top.offset(0, drop.saturating_neg(), 0);
        let block = world.query_block(pos)?;
        if block.solid {
            return Some(pos);
        }
    }
    None
}

/// Whether a cell can receive a new block without clearing.
fn is_open(world: &dyn World, pos: Position) -> bool {
    world
        .query_block(pos)
        .is_some_and(|b| !b.solid && b.growth.is_none())
}

/// Expanding-ring search for an anchor whose layout volume is open and
/// which stands on a solid surface.
pub fn find_site(world: &dyn World, cells: &[Position], search: SiteSearch) -> Option<Position> {
    let origin = world.position();
    for r in 0..=extent(search.radius) {
        for (dx, dz) in ring(r) {
            let column = origin.offset(dx, 0, dz);
            let Some(surface) = surface_below(world, column, search.max_surface_drop) else {
                continue;
            };
            let anchor = surface.above();
            if cells
                .iter()
                .all(|c| is_open(world, anchor.offset(c.x, c.y, c.z)))
            {
                debug!(%anchor, ring = r, "build site found");
                return Some(anchor);
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Build plans
// ---------------------------------------------------------------------------

/// A generated build plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    /// Structure being built.
    pub kind: StructureKind,
    /// Dimensions in effect.
    pub dimensions: Dimensions,
    /// Minimum corner of the first layer.
    pub anchor: Position,
    /// Whether the ring search failed and the area is cleared first.
    pub cleared: bool,
    /// Dig steps (when clearing) followed by placement steps.
    pub steps: Vec<Step>,
}

/// Placement steps for `kind` at a known anchor.
pub fn placement_steps(
    anchor: Position,
    kind: StructureKind,
    dims: Dimensions,
    material: Option<&ItemKind>,
) -> Vec<Step> {
    layout(kind, dims)
        .into_iter()
        .map(|c| Step::place(anchor.offset(c.x, c.y, c.z), material.cloned()))
        .collect()
}

/// Solid cells inside the layout volume at `anchor`, top-down.
pub fn obstructions(world: &dyn World, anchor: Position, cells: &[Position]) -> Vec<Position> {
    let mut blocked: Vec<Position> = cells
        .iter()
        .map(|c| anchor.offset(c.x, c.y, c.z))
        .filter(|pos| world.query_block(*pos).is_some_and(|b| b.solid))
        .collect();
    blocked.sort_by_key(|p| (core::cmp::Reverse(p.y), p.z, p.x));
    blocked
}

/// Plan a structure near the agent.
///
/// When `anchor` is given the site search is skipped, which lets an
/// interrupted build resume at the same place.
pub fn plan_build(
    world: &dyn World,
    kind: StructureKind,
    dims: Option<Dimensions>,
    anchor: Option<Position>,
    search: SiteSearch,
    material: Option<&ItemKind>,
) -> BuildPlan {
    let dimensions = dims.unwrap_or_else(|| default_dimensions(kind));
    let cells = layout(kind, dimensions);

    let (anchor, cleared) = match anchor.or_else(|| find_site(world, &cells, search)) {
        Some(anchor) => (anchor, false),
        None => {
            let anchor = world.position();
            info!(
                %kind,
                %anchor,
                radius = search.radius,
                "no open site found, clearing area at agent position"
            );
            (anchor, true)
        }
    };

    let mut steps: Vec<Step> = if cleared {
        obstructions(world, anchor, &cells)
            .into_iter()
            .map(Step::dig)
            .collect()
    } else {
        Vec::new()
    };
    steps.extend(placement_steps(anchor, kind, dimensions, material));

    BuildPlan {
        kind,
        dimensions,
        anchor,
        cleared,
        steps,
    }
}
