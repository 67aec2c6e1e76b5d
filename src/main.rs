use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::warn;

use ticketdesk::cmd::config::{self as config_cmd, ConfigArgs};
use ticketdesk::cmd::dashboard::{self, HistoryArgs, TicketsArgs};
use ticketdesk::cmd::ticket::{self, TicketArgs};
use ticketdesk::config::AppConfig;
use ticketdesk::context::AppContext;
use ticketdesk::error::AppResult;
use ticketdesk::infra::http::HttpBackend;
use ticketdesk::infra::preview::BlobPreviews;
use ticketdesk::logging;

#[derive(Parser)]
#[command(name = "ticketdesk", author, version, about = "Ticket dashboard client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tickets, optionally filtered.
    Tickets(TicketsArgs),
    /// Inspect and edit a single ticket.
    Ticket(TicketArgs),
    /// List technicians.
    Technicians,
    /// Show the ticket history log.
    History(HistoryArgs),
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config(args) => config_cmd::run(args.command),
        command => run_against_backend(command).await,
    }
}

async fn run_against_backend(command: Commands) -> AppResult<()> {
    let config = AppConfig::load()?;
    logging::init(config.log_format)?;

    if config.base_url.is_none() {
        warn!(
            "backend base URL not configured; run `ticketdesk config init` or set TICKETDESK_BASE_URL"
        );
    }

    let backend = Arc::new(HttpBackend::new(
        config.base_url.clone(),
        config.request_timeout,
    )?);
    let previews = Arc::new(BlobPreviews::new());
    let context = AppContext::new(config, backend, previews);

    match command {
        Commands::Tickets(args) => dashboard::run_tickets(&context, args).await,
        Commands::Ticket(args) => ticket::run(&context, args.command).await,
        Commands::Technicians => dashboard::run_technicians(&context).await,
        Commands::History(args) => dashboard::run_history(&context, args).await,
        Commands::Config(args) => config_cmd::run(args.command),
    }
}
