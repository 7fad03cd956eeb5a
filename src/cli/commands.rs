//! CLI commands and argument parsing

use crate::resource::{FilterContext, ResourceKind};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Paginated admin dashboard lists from the command line
#[derive(Parser, Debug)]
#[command(name = "admin-pager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL (overrides config and environment)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Bearer token (overrides config and environment)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print one page of a resource
    List {
        /// Resource to list
        resource: ResourceKind,

        /// Page to show (earlier pages are fetched to reach it)
        #[arg(short, long, default_value = "1")]
        page: u32,

        #[command(flatten)]
        query: ListQuery,
    },

    /// Page through a resource interactively
    ///
    /// Commands: `n` next, `p` previous, a page number, `r` refresh,
    /// `s <term>` search (`s` alone clears it), `q` quit.
    Browse {
        /// Resource to browse
        resource: ResourceKind,

        #[command(flatten)]
        query: ListQuery,
    },

    /// Delete a record
    Delete {
        /// Resource the record belongs to
        resource: ResourceKind,

        /// Record id
        id: String,
    },
}

/// Page size and filters of a list
#[derive(Args, Debug, Clone, Default)]
pub struct ListQuery {
    /// Records per page (defaults to the configured page size)
    #[arg(short, long)]
    pub limit: Option<u32>,

    /// Free-text search
    #[arg(short, long)]
    pub search: Option<String>,

    /// Role filter (admins)
    #[arg(long)]
    pub role: Option<String>,
}

impl ListQuery {
    /// Filter context of the query
    pub fn filter(&self) -> FilterContext {
        let mut filter = FilterContext::new();
        if let Some(search) = &self.search {
            filter = filter.with_search(search.clone());
        }
        if let Some(role) = &self.role {
            filter = filter.with_role(role.clone());
        }
        filter
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

/// One line typed at the `browse` prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Next,
    Prev,
    Goto(u32),
    Refresh,
    Search(Option<String>),
    Quit,
    Help,
}

impl std::str::FromStr for BrowseCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (head, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(head, rest)| (head, rest.trim()));

        match head {
            "n" | "next" => Ok(Self::Next),
            "p" | "prev" => Ok(Self::Prev),
            "r" | "refresh" => Ok(Self::Refresh),
            "q" | "quit" | "exit" => Ok(Self::Quit),
            "h" | "help" | "?" => Ok(Self::Help),
            "s" | "search" => Ok(Self::Search(
                (!rest.is_empty()).then(|| rest.to_string()),
            )),
            number => number
                .parse::<u32>()
                .ok()
                .filter(|page| *page > 0)
                .map(Self::Goto)
                .ok_or_else(|| format!("unknown command '{line}' (type h for help)")),
        }
    }
}
