//! Error types for the controller, command routing, and the runner.

use blockwright_types::StateKind;

/// Errors raised while assembling the controller.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// The registry has no state to fall back to.
    #[error("registry has no {fallback} state")]
    MissingFallback {
        /// The state every switch falls back to.
        fallback: StateKind,
    },
}

/// Errors raised while parsing a command line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The line was blank.
    #[error("empty command")]
    Empty,

    /// The first word is not a command.
    #[error("unknown command: {word}")]
    Unknown {
        /// The unrecognised word.
        word: String,
    },

    /// A required argument is missing.
    #[error("{command}: missing {argument}")]
    MissingArgument {
        /// Command being parsed.
        command: &'static str,
        /// Name of the missing argument.
        argument: &'static str,
    },

    /// An argument did not parse.
    #[error("{command}: invalid {argument} {value:?}")]
    InvalidArgument {
        /// Command being parsed.
        command: &'static str,
        /// Name of the bad argument.
        argument: &'static str,
        /// The text that failed to parse.
        value: String,
    },

    /// More words than the command takes.
    #[error("{command}: unexpected {extra:?}")]
    TrailingInput {
        /// Command being parsed.
        command: &'static str,
        /// The first unexpected word.
        extra: String,
    },
}

/// Errors that end a run early.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A startup script line did not parse.
    #[error("script line {line}: {source}")]
    Script {
        /// One-based line number within the script.
        line: usize,
        /// The parse failure.
        source: CommandError,
    },
}
