//! Feedsift - Personal Relevance Filter
//!
//! Command-line entry point: runs the filter daemon, or performs a single
//! rating / prediction / settings operation against the local store (or
//! against a running daemon with `--via-daemon`).

use clap::{ArgGroup, Parser, Subcommand};
use feedsift_core::{
    daemon::{self, FilterDaemon},
    error::{FeedsiftError, Result},
    ContentId, ContentItem, DecisionEngine, FeedsiftConfig, FilterRequest, FilterResponse,
    FilterService, Rating, Settings, SqliteStore,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, Level};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(name = "feedsift")]
#[command(about = "Personal like/dislike filter for social timelines", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Configuration file (TOML)
    #[arg(short, long, env = "FEEDSIFT_CONFIG")]
    config: Option<PathBuf>,

    /// Database path (overrides the configured path)
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Send rate/predict/settings requests to a running daemon instead of the local store
    #[arg(long)]
    via_daemon: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the filter daemon on a Unix socket
    Serve {
        /// Socket path (overrides the configured path)
        #[arg(long)]
        socket: Option<PathBuf>,
    },

    /// Rate a post
    #[command(group(ArgGroup::new("verdict").required(true).args(["like", "dislike"])))]
    Rate {
        /// Content ID
        id: String,

        #[arg(long)]
        like: bool,

        #[arg(long)]
        dislike: bool,

        /// Post text
        #[arg(short, long)]
        text: String,

        /// Post author handle
        #[arg(short, long, default_value = "")]
        author: String,
    },

    /// Predict whether a post would be liked, and whether it would be hidden
    Predict {
        /// Content ID
        id: String,

        /// Post text
        #[arg(short, long)]
        text: String,
    },

    /// Show or change filter settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Rebuild the preference model from every stored rating
    Train,

    /// Show store, model and filter status
    Status,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print current settings
    Show,

    /// Update settings; omitted values keep their current value
    Set {
        /// Enable or disable the filter
        #[arg(long)]
        enabled: Option<bool>,

        /// Hide dislikes with confidence strictly above this percentage (0-100)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        threshold: Option<u8>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn open_service(config: &FeedsiftConfig) -> Result<FilterService> {
    let db_path = config.storage.db_path();
    debug!("Using database: {}", db_path.display());

    let store = SqliteStore::open(&db_path).await?;
    let engine = Arc::new(DecisionEngine::from_config(&config.model));
    Ok(FilterService::new(engine, Arc::new(store), &config.training))
}

/// Open the local store and train from its ratings
async fn local_service(config: &FeedsiftConfig) -> Result<FilterService> {
    let service = open_service(config).await?;
    service.retrain().await?;
    Ok(service)
}

/// Whether handling `request` already retrains, making an upfront train redundant
fn trains_itself(config: &FeedsiftConfig, request: &FilterRequest) -> bool {
    config.training.retrain_on_rating && matches!(request, FilterRequest::SaveRating { .. })
}

/// Send a request locally or through the daemon, failing on error responses
async fn request(
    config: &FeedsiftConfig,
    via_daemon: bool,
    request: FilterRequest,
) -> Result<FilterResponse> {
    let response = if via_daemon {
        let timeout = Duration::from_millis(config.daemon.request_timeout_ms);
        daemon::send_request(&config.daemon.socket_path(), request, timeout).await?
    } else if trains_itself(config, &request) {
        open_service(config).await?.handle(request).await
    } else {
        local_service(config).await?.handle(request).await
    };

    match response {
        FilterResponse::Error { message } => Err(FeedsiftError::Other(message)),
        other => Ok(other),
    }
}

async fn current_settings(config: &FeedsiftConfig, via_daemon: bool) -> Result<Settings> {
    match request(config, via_daemon, FilterRequest::GetSettings).await? {
        FilterResponse::Settings { settings } => Ok(settings),
        other => Err(FeedsiftError::Other(format!(
            "Unexpected response to getSettings: {:?}",
            other
        ))),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::new(format!(
        "feedsift={level},feedsift_core={level}",
        level = level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // Write logs to stderr, not stdout
        .init();

    debug!("Feedsift v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = FeedsiftConfig::load(cli.config.as_deref())?;
    if let Some(db_path) = cli.db_path {
        config.storage.db_path = Some(db_path);
    }

    match cli.command {
        Commands::Serve { socket } => {
            if let Some(socket) = socket {
                config.daemon.socket_path = Some(socket);
            }
            let socket_path = config.daemon.socket_path();
            let daemon = FilterDaemon::open(config).await?;

            eprintln!("Feedsift daemon listening on {}", socket_path.display());
            daemon.run_until(tokio::signal::ctrl_c()).await
        }

        Commands::Rate {
            id,
            like,
            dislike: _,
            text,
            author,
        } => {
            let rating = if like { Rating::Like } else { Rating::Dislike };
            let mut item = ContentItem::new(id, author, text);
            item.set_rating(rating, chrono::Utc::now());

            let response =
                request(&config, cli.via_daemon, FilterRequest::SaveRating { item }).await?;
            print_json(&response)
        }

        Commands::Predict { id, text } => {
            let response = request(
                &config,
                cli.via_daemon,
                FilterRequest::Predict {
                    id: ContentId::from(id),
                    text,
                },
            )
            .await?;
            print_json(&response)
        }

        Commands::Settings { action } => match action {
            SettingsAction::Show => print_json(&current_settings(&config, cli.via_daemon).await?),
            SettingsAction::Set { enabled, threshold } => {
                let mut settings = current_settings(&config, cli.via_daemon).await?;
                if let Some(enabled) = enabled {
                    settings.filter_enabled = enabled;
                }
                if let Some(threshold) = threshold {
                    settings.filter_threshold = threshold;
                }

                let response = request(
                    &config,
                    cli.via_daemon,
                    FilterRequest::UpdateSettings { settings },
                )
                .await?;
                print_json(&response)
            }
        },

        Commands::Train => {
            let outcome = open_service(&config).await?.retrain().await?;
            print_json(&outcome)
        }

        Commands::Status => {
            let status = local_service(&config).await?.status().await?;
            print_json(&status)
        }
    }
}
