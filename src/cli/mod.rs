//! CLI module
//!
//! Command-line interface over the paginated dashboard lists.
//!
//! # Commands
//!
//! - `list` - Print one page of a resource
//! - `browse` - Page through a resource interactively
//! - `delete` - Delete a record

mod commands;
mod runner;

pub use commands::{BrowseCommand, Cli, Commands, ListQuery, OutputFormat};
pub use runner::Runner;
