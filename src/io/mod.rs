//! Input/output, configuration and error handling

/// Command-line parsing and subcommand dispatch
pub mod cli;
/// Constants and defaults
pub mod configuration;
/// Crate-wide error type
pub mod error;
/// PNG loading and saving
pub mod image;
/// Tracing subscriber setup
pub mod logging;
/// Terminal progress bars
pub mod progress;
/// Line-oriented text and TSV files
pub mod tsv;
