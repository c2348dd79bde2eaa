//! mocra provisions the infrastructure of a freshly generated Rails
//! application: it picks a Slicehost slice, points DNS at it, creates the
//! GitHub repository, optionally sets up authentication (including a Twitter
//! OAuth registration) and deploys with Capistrano.
//!
//! All interaction with the outside world goes through three small traits
//! so the whole workflow can be replayed against canned answers and output.

/// Append-only `<verb>  <description>` record of a run
pub mod action_log;

/// Command-line interface module for the mocra binary
pub mod cli;

/// External command execution: shell, dry-run and canned responses
pub mod command;

/// Template configuration (mocra.json, mocra.yml, mocra.yaml)
pub mod config;

/// Error types and handling for the mocra application
pub mod error;

/// In-memory and on-disk destinations for generated files
pub mod file_store;

/// Parsing of slice listings, OAuth registrations and config lookups
pub mod parser;

/// User input and interaction handling
pub mod prompt;

/// Generated file templates, rendered with MiniJinja
pub mod renderer;

/// The provisioning workflow
pub mod runner;
