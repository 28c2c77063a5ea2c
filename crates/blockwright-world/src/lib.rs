//! World/agent interface for the Blockwright agent.
//!
//! The orchestration core talks to the world only through the [`World`]
//! trait. This crate also ships [`GridWorld`], a deterministic in-memory
//! implementation used by the test suites and the demo binary.
//!
//! # Modules
//!
//! - [`interface`] -- The `World` trait: queries and action primitives
//! - [`action`] -- Action futures and their results
//! - [`error`] -- `WorldError`
//! - [`inventory`] -- Inventory totals and the mutable inventory store
//! - [`grid`] -- `GridWorld`, the in-memory world

pub mod action;
pub mod error;
pub mod grid;
pub mod interface;
pub mod inventory;

pub use action::{ActionFuture, ActionOutput, ActionResult};
pub use error::WorldError;
pub use grid::{ActionRecord, GridWorld};
pub use interface::World;
pub use inventory::Inventory;
