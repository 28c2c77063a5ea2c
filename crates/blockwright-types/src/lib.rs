//! Shared type definitions for the Blockwright agent.
//!
//! This crate is the single source of truth for the value types passed
//! between the world interface, the behavior modules, and the orchestration
//! core.
//!
//! # Modules
//!
//! - [`ids`] -- UUID wrappers for goals and plans, world entity ids
//! - [`geometry`] -- Grid positions, block faces, structure dimensions
//! - [`enums`] -- State kinds, structure kinds, entity categories
//! - [`structs`] -- Items, blocks, entities, vitals, recipes
//! - [`goals`] -- Goals and controller directives
//! - [`plan`] -- Plan steps

pub mod enums;
pub mod geometry;
pub mod goals;
pub mod ids;
pub mod plan;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{EntityCategory, StateKind, StructureKind, UnknownName};
pub use geometry::{Dimensions, Face, Position};
pub use goals::{Directive, Goal};
pub use ids::{EntityId, GoalId, PlanId};
pub use plan::{ActionKind, Step, StepStage};
pub use structs::{
    BlockDescriptor, EntityInfo, ItemKind, ItemStack, MATURE_CROP_STAGE, MAX_VITAL, Recipe,
    ResourceRequirement, Vitals,
};
