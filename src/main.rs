//! event-broker
//!
//! Inspect the event catalog and push events through a locally wired broker.
//!
//! ```sh
//! # List every kind and its payload type
//! event-broker kinds
//!
//! # Validate a payload and publish it; prints the delivery report
//! event-broker emit order.created '{"orderId":"o1"}'
//!
//! # Validate the config file without doing anything else
//! event-broker --config /etc/event-broker/config.toml check
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use event_broker::bootstrap::init_tracing;
use event_broker::{
    create_event_broker, default_config_path, AppConfig, Event, EventKind, CATALOG_VERSION,
};

#[derive(Parser, Debug)]
#[command(
    name = "event-broker",
    version,
    about = "In-process typed event broker: catalog inspection and test publishing"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "EVENT_BROKER_CONFIG")]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Override the per-kind listener warning threshold (0 disables it).
    #[arg(long)]
    max_listeners: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the event catalog.
    Kinds,
    /// Validate a JSON payload for a kind and publish it.
    Emit {
        /// Wire name, e.g. `order.created`.
        kind: String,
        /// JSON payload matching the kind's shape.
        payload: String,
    },
    /// Validate the configuration and print the effective settings.
    Check,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = AppConfig::load_or_default(&config_path)?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(max) = cli.max_listeners {
        config.broker.max_listeners = max;
    }

    if let Err(e) = init_tracing(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
    }
    info!(path = %config_path.display(), "Configuration loaded");

    match cli.command {
        Command::Kinds => {
            println!("catalog v{CATALOG_VERSION}");
            for kind in EventKind::ALL {
                println!("  {:<22} {}", kind.as_str(), kind.payload_type());
            }
        }
        Command::Check => {
            if config.broker.max_listeners == 0 {
                warn!("Listener leak warning is disabled (max_listeners = 0)");
            }
            print!("{}", toml::to_string_pretty(&config)?);
        }
        Command::Emit { kind, payload } => {
            let payload: serde_json::Value = serde_json::from_str(&payload)?;
            let event = match Event::from_json(&kind, payload) {
                Ok(event) => event,
                Err(e) => {
                    error!(error = %e, label = e.as_label(), "Event rejected");
                    return Err(e.into());
                }
            };

            let broker = create_event_broker(&config.broker);
            let report = broker.publish_event(event);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
