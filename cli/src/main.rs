//! Aquabill treasurer CLI
//!
//! ```sh
//! # What can be billed right now, with preview amounts
//! treasurer billable
//!
//! # Bill two connections
//! treasurer generate -c 12 -c 31
//!
//! # Bill everything billable, then retry transient failures once
//! treasurer generate --all --retry-failed
//!
//! # Validate config without touching the backend
//! treasurer --config /etc/aquabill/treasurer.toml check
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use aquabill::application::BillingService;
use aquabill::domain::BatchReport;
use aquabill::logging::{init_default_tracing, init_tracing};
use aquabill::notifications::EventSubscriber;
use aquabill::shared::RetryConfig;
use aquabill::{create_event_bus, default_config_path, AppConfig, AppError, HttpBillingApi};

/// Bulk bill generation against the Aquabill backend.
#[derive(Parser, Debug)]
#[command(name = "treasurer", version, about = "Treasurer tools for water utility billing")]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "AQUABILL_CONFIG")]
    config: Option<PathBuf>,

    /// Override the backend base URL.
    #[arg(long, env = "AQUABILL_API_URL")]
    api_url: Option<String>,

    /// Override the bearer token.
    #[arg(long, env = "AQUABILL_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration and print it.
    Check,
    /// List connections with an approved, unbilled reading.
    Billable,
    /// List existing bills.
    Bills,
    /// Generate bills for selected connections.
    Generate {
        /// Bill every billable connection.
        #[arg(long, conflicts_with = "connections")]
        all: bool,

        /// Connection id to bill (repeatable).
        #[arg(short = 'c', long = "connection", value_name = "ID")]
        connections: Vec<String>,

        /// Resubmit network/server failures once, after re-checking them.
        #[arg(long)]
        retry_failed: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, AppError> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);

    let mut config = match AppConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            init_default_tracing();
            error!("Failed to load config from {}: {}", config_path.display(), e);
            return Err(e.into());
        }
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    if let Some(token) = cli.token {
        config.api.auth_token = Some(token);
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_tracing(&config.logging);
    config.validate()?;
    info!("Configuration loaded from {}", config_path.display());

    let api = Arc::new(HttpBillingApi::new(&config.api)?);
    let event_bus = create_event_bus();
    let service = BillingService::new(api, event_bus.clone())
        .with_read_retry(RetryConfig::from(&config.retry));

    match cli.command {
        Command::Check => {
            println!("Configuration is valid");
            println!("   Config file : {}", config_path.display());
            println!("   Backend     : {}", config.api.base_url);
            println!(
                "   Token       : {}",
                if config.api.auth_token.is_some() { "set" } else { "not set" }
            );
            println!("   Timeout     : {}s", config.api.timeout_secs);
            println!("   Log level   : {}", config.logging.level);
        }
        Command::Billable => {
            let rate = service.active_rate().await?;
            let billable = service.billable_connections().await?;
            println!(
                "Active rate {}: {} per m³ + {} fixed",
                rate.id, rate.price_per_cubic_meter, rate.fixed_charge
            );
            for b in &billable {
                let amount = BillingService::preview_amount(&b.reading, &rate)
                    .map_or_else(|| "out of range".to_string(), |a| a.to_string());
                println!(
                    "  {:<12} reading {:<8} {:>8} m³  {:>12}  {}",
                    b.connection.id,
                    b.reading.id,
                    b.reading.consumption(),
                    amount,
                    b.connection.customer_name.as_deref().unwrap_or("")
                );
            }
            println!("{} billable connection(s)", billable.len());
        }
        Command::Bills => {
            let bills = service.bills().await?;
            for bill in &bills {
                let due = bill.due_date.map(|d| d.to_string()).unwrap_or_default();
                println!(
                    "  {:<8} connection {:<10} {:>12}  due {:<10}  {}",
                    bill.id, bill.connection_id, bill.amount, due, bill.status
                );
            }
            println!("{} bill(s)", bills.len());
        }
        Command::Generate {
            all,
            connections,
            retry_failed,
        } => {
            let prepared = if all {
                service.prepare_all().await?
            } else {
                service.prepare_batch(&connections).await?
            };
            for skipped in &prepared.skipped {
                println!("  skipped {}: {}", skipped.connection_id, skipped.reason);
            }

            let mut events = event_bus.subscribe();
            let report = service.generate_bills(&prepared.requests).await?;
            print_report(&report);

            let retried = if retry_failed {
                service.retry_failed(&report).await?
            } else {
                None
            };
            if let Some(retried) = &retried {
                println!("Retry:");
                print_report(retried);
            }

            refresh_stale_views(&service, &mut events).await?;

            if report.all_failed_with_retry(retried.as_ref()) {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_report(report: &BatchReport) {
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(bill) => println!(
                "  ok      connection {:<10} bill {:<8} {:>12}",
                outcome.connection_id, bill.id, bill.amount
            ),
            Err(err) => println!(
                "  failed  connection {:<10} [{}] {}",
                outcome.connection_id, err.kind, err.message
            ),
        }
    }
    println!("{}", report.summary());
}

/// Re-fetch whatever the finished batches declared stale.
async fn refresh_stale_views(
    service: &BillingService,
    events: &mut EventSubscriber,
) -> Result<(), AppError> {
    let mut stale = false;
    while let Some(message) = events.try_recv() {
        stale |= !message.event.stale_views().is_empty();
    }
    if stale {
        let views = service.refresh_views().await?;
        println!(
            "Now {} billable connection(s), {} bill(s) on record",
            views.billable.len(),
            views.bills.len()
        );
    }
    Ok(())
}
