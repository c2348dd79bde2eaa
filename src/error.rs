//! Error handling for the mocra template runner.
//! Defines the error type and result alias used throughout the crate.

use thiserror::Error;

/// Errors that abort a template run.
///
/// Parsing never produces one of these: malformed command output degrades to
/// empty results or placeholder credentials. Only unmet preconditions of the
/// orchestration (and the collaborators it calls) end up here.
#[derive(Error, Debug)]
pub enum Error {
    /// An external command could not be spawned or exited non-zero
    #[error("Command '{command}' failed: {reason}.")]
    CommandExecutionError { command: String, reason: String },

    /// The chosen slice is not among the slices reported by the provider
    #[error("Slice '{name}' not found (available: {available}).")]
    SliceNotFoundError { name: String, available: String },

    /// The slice listing returned nothing to choose from
    #[error("No slices returned by '{command}'.")]
    NoSlicesError { command: String },

    /// A config lookup command printed nothing
    #[error("'{command}' returned no value.")]
    MissingConfigValueError { command: String },

    /// The user could not be prompted or the scripted answers ran out
    #[error("Prompt error: {0}.")]
    PromptError(String),

    /// Represents errors that occur during configuration parsing or processing
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    /// A generated file could not be produced or modified
    #[error("Template error: {0}.")]
    TemplateError(String),

    #[error("Template rendering error: {0}.")]
    MinijinjaError(#[from] minijinja::Error),

    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] std::io::Error),
}

/// Convenience type alias for Results with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
