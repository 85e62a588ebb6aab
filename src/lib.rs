#![warn(missing_docs)]
//! Library support for the hubqueue CLI.

use std::result::Result as StdResult;

/// Archive download and extraction for template imports.
mod archive;
/// Command-line interface wiring and dispatch.
mod cli;
/// Command implementations.
mod commands;
/// Configuration loading and persistence.
mod config;
/// Runtime settings shared by commands.
mod context;
/// Common diagnostics and warning aggregation.
mod diagnostics;
/// Error handling for the crate.
mod error;
/// Local git invocations.
mod git;
/// Typed GitHub REST client.
mod github;
/// Tracing subscriber setup.
mod logging;
/// Color palette and styling for CLI output.
mod palette;
/// Path expansion and normalization utilities.
mod paths;
/// Fixed-interval polling with an injectable clock.
mod poll;
/// Version bumps and release notes.
mod release;
/// README, .gitignore, and LICENSE generation.
mod scaffold;
/// Host inspection and environment setup.
mod system;
/// Column-aligned text tables.
mod table;
/// Project template store and renderer.
mod template;
/// Shared test fixtures.
#[cfg(test)]
mod testutil;

pub use crate::error::{Error, ErrorKind, Report, Result};

/// Run the CLI, returning a printable report on failure.
pub async fn run() -> StdResult<(), Report> {
    cli::run().await
}
