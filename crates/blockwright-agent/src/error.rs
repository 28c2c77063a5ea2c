//! Error types for the agent binary.
//!
//! [`AgentError`] is the top-level error type that wraps every failure mode
//! during startup and the run itself.

/// Top-level error for the agent binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: blockwright_core::config::ConfigError,
    },

    /// The controller could not be assembled.
    #[error("controller error: {source}")]
    Controller {
        /// The underlying controller error.
        #[from]
        source: blockwright_core::ControllerError,
    },

    /// The demo world could not be set up.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: blockwright_world::WorldError,
    },

    /// The run ended with an error.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: blockwright_core::RunnerError,
    },

    /// The demo world section of the config file is malformed.
    #[error("demo config error: {message}")]
    Demo {
        /// Description of the failure.
        message: String,
    },
}
