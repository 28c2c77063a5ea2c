//! State controller, plan executor, and tick runner for the Blockwright agent.
//!
//! The controller keeps exactly one [`State`] active and re-arbitrates every
//! tick. Task states hand their step plans to the [`Executor`], which
//! retries, defers, and drops steps and reports progress through the
//! [`StatusLog`]. Crafting runs its own queue on top of the resolver in
//! `blockwright-behaviors`.
//!
//! # Modules
//!
//! - [`action`] -- One-outstanding-future slot polled once per tick
//! - [`command`] -- Text command parsing into directives
//! - [`config`] -- Configuration loading from `blockwright.yaml`
//! - [`context`] -- Shared configuration and the per-call agent context
//! - [`controller`] -- The single-slot state controller
//! - [`driver`] -- Turns plan steps into world actions
//! - [`error`] -- Controller, command, and runner errors
//! - [`executor`] -- Generic plan executor
//! - [`runner`] -- Async tick loop with live command input
//! - [`states`] -- The twelve agent states
//! - [`status`] -- Human-readable status messages
//!
//! [`State`]: states::State
//! [`Executor`]: executor::Executor
//! [`StatusLog`]: status::StatusLog

pub mod action;
pub mod command;
pub mod config;
pub mod context;
pub mod controller;
pub mod driver;
pub mod error;
pub mod executor;
pub mod runner;
pub mod states;
pub mod status;

pub use controller::Controller;
pub use error::{CommandError, ControllerError, RunnerError};
