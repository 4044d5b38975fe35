//! Subscription Registry Development Console
//!
//! Loads configuration, wires a registry service and reads one command per
//! line from stdin. Results are printed to stdout as JSON; logs and
//! notifications go to stderr.
//!
//! ```text
//! 0xS1 subscribe 0xA1 5
//! 0xA1 count
//! 0xA1 subscriber-at 0
//! 0xS1 unsubscribe 0xA1
//! audit
//! ```

mod console;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use sr_common::logging::{init_logging_with, LogFormat};
use sr_config::{AppConfig, ConfigLoader};
use sr_registry::{DomainEvent, RegistryService, TsidSubscriptionFactory};

use console::{Console, Outcome};

#[derive(Parser, Debug)]
#[command(name = "sr-dev")]
#[command(about = "Subscription Registry development console")]
struct Args {
    /// Path to a TOML config file
    #[arg(long, env = "SUBREG_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides logging.format from the config: text or json
    #[arg(long)]
    log_format: Option<String>,

    /// Print an example config file and exit
    #[arg(long)]
    print_example_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_example_config {
        print!("{}", AppConfig::example_toml());
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => ConfigLoader::with_path(path).load()?,
        None => AppConfig::load()?,
    };

    let format = args
        .log_format
        .as_deref()
        .unwrap_or(config.logging.format.as_str());
    init_logging_with("sr-dev", LogFormat::parse(format), &config.logging.level);

    info!(
        notification_capacity = config.registry.notification_capacity,
        handle_prefix = %config.factory.handle_prefix,
        "Starting subscription registry console"
    );

    let factory = Arc::new(TsidSubscriptionFactory::new(
        config.factory.handle_prefix.clone(),
    ));
    let service = RegistryService::new(factory, config.registry.notification_capacity);

    let mut notifications = service.notifications();
    let listener = tokio::spawn(async move {
        loop {
            match notifications.recv().await {
                Ok(notification) => {
                    let event = notification.event();
                    info!(
                        event_type = event.event_type(),
                        subject = event.subject(),
                        message_group = event.message_group(),
                        principal = event.principal_id(),
                        "Notification"
                    );
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Notification listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let console = Console::new(service);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match console.execute_line(&line) {
                    Outcome::Reply(value) => println!("{}", value),
                    Outcome::Skip => {}
                    Outcome::Quit => break,
                }
            }
            _ = signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    drop(console);
    listener.abort();
    info!("Console stopped");

    Ok(())
}
