//! CLI runner - executes commands

use crate::cli::commands::{BrowseCommand, Cli, Commands, ListQuery, OutputFormat};
use crate::config::DashboardConfig;
use crate::error::{Error, Result, ResultExt};
use crate::fetch::{HttpPageFetcher, MutationOutcome};
use crate::pagination::{ListSnapshot, NavOutcome, PaginationController};
use crate::resource::{AdminUser, ContactInquiry, Product, ResourceKind};
use crate::types::{LogLevel, Record};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

type RecordPager = PaginationController<HttpPageFetcher<Record>>;

const BROWSE_HELP: &str =
    "n next | p previous | <number> go to page | r refresh | s <term> search | q quit";

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Log level for the subscriber
    ///
    /// `--verbose` wins; otherwise the configured level. A config that fails
    /// to load falls back to the default here and is reported by `run()`.
    pub fn log_level(&self) -> LogLevel {
        if self.cli.verbose {
            return LogLevel::Debug;
        }
        DashboardConfig::resolve(self.cli.config.as_deref())
            .map(|config| config.log_level)
            .unwrap_or_default()
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;
        debug!(?config, "Configuration loaded");

        match &self.cli.command {
            Commands::List {
                resource,
                page,
                query,
            } => self.list(&config, *resource, *page, query).await,
            Commands::Browse { resource, query } => self.browse(&config, *resource, query).await,
            Commands::Delete { resource, id } => self.delete(&config, *resource, id).await,
        }
    }

    /// File, then environment, then command-line flags
    fn load_config(&self) -> Result<DashboardConfig> {
        let mut config = DashboardConfig::resolve(self.cli.config.as_deref())?;

        if let Some(base_url) = &self.cli.base_url {
            config.base_url.clone_from(base_url);
        }
        if let Some(token) = &self.cli.token {
            config.auth_token = Some(token.clone());
        }

        config.validate()?;
        Ok(config)
    }

    fn pager(
        &self,
        config: &DashboardConfig,
        resource: ResourceKind,
        query: &ListQuery,
    ) -> Result<RecordPager> {
        let client = config.http_client()?;
        let fetcher = config.fetcher(client, resource);
        let items_per_page = query.limit.unwrap_or(config.items_per_page);
        if items_per_page == 0 {
            return Err(Error::invalid_value("limit", "must be greater than zero"));
        }

        Ok(
            PaginationController::with_options(fetcher, items_per_page, query.filter())
                .with_retry_policy(config.retry_policy()),
        )
    }

    // ========================================================================
    // Commands
    // ========================================================================

    async fn list(
        &self,
        config: &DashboardConfig,
        resource: ResourceKind,
        page: u32,
        query: &ListQuery,
    ) -> Result<()> {
        let mut pager = self.pager(config, resource, query)?;
        let outcome = pager.go_to_page(page).await?;
        self.output_page(resource, &pager.snapshot(), Some(&outcome));
        Ok(())
    }

    async fn browse(
        &self,
        config: &DashboardConfig,
        resource: ResourceKind,
        query: &ListQuery,
    ) -> Result<()> {
        let mut pager = self.pager(config, resource, query)?;

        let cancel = pager.cancel_handle();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });

        if self.cli.format == OutputFormat::Pretty {
            let mut updates = pager.subscribe();
            tokio::spawn(async move {
                while updates.changed().await.is_ok() {
                    if updates.borrow_and_update().is_loading() {
                        eprintln!("Loading...");
                    }
                }
            });
        }

        let first = pager.go_to_page(1).await;
        if matches!(first, Err(Error::Cancelled)) {
            return Ok(());
        }
        self.output_page(resource, &pager.snapshot(), first.as_ref().ok());

        let quit = pager.cancel_handle();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            if self.cli.format == OutputFormat::Pretty {
                eprint!("{resource}> ");
            }
            let line = tokio::select! {
                () = quit.cancelled() => break,
                line = lines.next_line() => line?,
            };
            let Some(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let command = match line.parse::<BrowseCommand>() {
                Ok(command) => command,
                Err(message) => {
                    eprintln!("{message}");
                    continue;
                }
            };

            let result = match command {
                BrowseCommand::Quit => break,
                BrowseCommand::Help => {
                    eprintln!("{BROWSE_HELP}");
                    continue;
                }
                BrowseCommand::Next => pager.next_page().await,
                BrowseCommand::Prev => pager.prev_page().await,
                BrowseCommand::Goto(page) => pager.go_to_page(page).await,
                BrowseCommand::Refresh => pager.refresh().await,
                BrowseCommand::Search(term) => {
                    let mut filter = pager.filter().clone();
                    filter.search = term;
                    pager.apply_filter(filter).await
                }
            };

            // A failed navigation is shown with the page; only teardown ends the session.
            if matches!(result, Err(Error::Cancelled)) {
                break;
            }
            self.output_page(resource, &pager.snapshot(), result.as_ref().ok());
        }

        info!(resource = %resource, "Browse session ended");
        Ok(())
    }

    async fn delete(&self, config: &DashboardConfig, resource: ResourceKind, id: &str) -> Result<()> {
        let client = config.http_client()?;
        let records = config.record_client(client, resource);
        let outcome = records
            .delete(id)
            .await
            .with_context(|| format!("Failed to delete {resource} {id}"))?;
        self.output_mutation(resource, id, &outcome);
        Ok(())
    }

    // ========================================================================
    // Output
    // ========================================================================

    fn output_page(
        &self,
        resource: ResourceKind,
        snapshot: &ListSnapshot<Record>,
        outcome: Option<&NavOutcome>,
    ) {
        let view = snapshot.view();
        match self.cli.format {
            OutputFormat::Json => {
                self.output_message(&json!({
                    "type": "PAGE",
                    "resource": resource,
                    "status": snapshot.status,
                    "state": snapshot.state,
                    "outcome": outcome,
                    "pager": view,
                    "error": snapshot.error,
                    "items": &*snapshot.items,
                }));
            }
            OutputFormat::Pretty => {
                if let Some(error) = &snapshot.error {
                    println!("! {error}");
                }
                if snapshot.items.is_empty() {
                    println!("No {resource} found.");
                    return;
                }
                println!(
                    "{resource}: {}-{} (page {})",
                    view.start_index, view.end_index, view.current_page
                );
                for item in snapshot.items.iter() {
                    println!("  {}", summarize(resource, item));
                }
                let mut controls = Vec::new();
                if view.can_go_prev {
                    controls.push("< prev");
                }
                if view.can_go_next {
                    controls.push("next >");
                }
                println!("  {}   {}", view.render(), controls.join("  "));
            }
        }
    }

    fn output_mutation(&self, resource: ResourceKind, id: &str, outcome: &MutationOutcome) {
        match self.cli.format {
            OutputFormat::Json => self.output_message(&json!({
                "type": "DELETED",
                "resource": resource,
                "id": id,
                "message": outcome.message,
            })),
            OutputFormat::Pretty => println!(
                "{}",
                outcome
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("Deleted {resource} {id}"))
            ),
        }
    }

    fn output_message(&self, msg: &Value) {
        println!("{}", serde_json::to_string(msg).unwrap_or_default());
    }
}

/// One-line summary of a record, typed where the row decodes
fn summarize(resource: ResourceKind, item: &Record) -> String {
    let typed = match resource {
        ResourceKind::Products => serde_json::from_value::<Product>(item.clone())
            .ok()
            .map(|p| format!("#{} {} ({}) {}", p.id, p.name, p.category, p.price)),
        ResourceKind::Admins => serde_json::from_value::<AdminUser>(item.clone())
            .ok()
            .map(|a| format!("{} <{}> {}", a.full_name, a.email, a.role.as_str())),
        ResourceKind::Contacts => serde_json::from_value::<ContactInquiry>(item.clone())
            .ok()
            .map(|c| {
                format!(
                    "#{} {} <{}> {}",
                    c.id,
                    c.name,
                    c.email,
                    c.subject.unwrap_or_default()
                )
            }),
    };
    typed.unwrap_or_else(|| item.to_string())
}
