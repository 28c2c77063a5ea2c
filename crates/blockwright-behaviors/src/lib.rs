//! Behavior modules for the Blockwright agent.
//!
//! Everything here is planning logic over read-only world queries: no
//! module issues a world action. The orchestration core turns the plans and
//! queues produced here into action calls.
//!
//! # Modules
//!
//! - [`structure`] -- Structure layouts, site search, build plans
//! - [`placement`] -- Reference-face search, supports, material substitution
//! - [`crafting`] -- Recipe book, dependency resolution, craft queue, stations
//! - [`combat`] -- Hostile target selection for combat and defense
//! - [`gather`] -- Item-to-source-block table and gather targets
//! - [`farming`] -- Crop scanning, harvest plans, food choice
//! - [`fishing`] -- Water lookup and cast plans
//! - [`trade`] -- Trader lookup and barter steps
//! - [`explore`] -- Seeded exploration waypoints
//! - [`error`] -- `BehaviorError`

pub mod combat;
pub mod crafting;
pub mod error;
pub mod explore;
pub mod farming;
pub mod fishing;
pub mod gather;
pub mod placement;
pub mod structure;
pub mod trade;

pub use crafting::{CraftQueue, QueueStatus, RecipeBook, Resolution, StationPlan};
pub use error::BehaviorError;
pub use structure::{BuildPlan, SiteSearch};
