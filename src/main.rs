//! spa-router command line.
//!
//! # Architecture Overview
//!
//! ```text
//!     navigate(path)
//!     ─────────────────▶ normalize ──▶ history.push ──▶ emit(path)
//!                                                          │
//!                                                          ▼
//!                           ┌──────────────────────────────────────────┐
//!                           │ clear every clearing mount target        │
//!                           │ routes by priority → first match wins    │
//!                           │ none → "404" fallback, emit(404)         │
//!                           └──────────────────┬───────────────────────┘
//!                                              ▼
//!                           handler(dynamic) ──▶ surface.render ──▶ emit(load)
//!
//!     Cross-cutting: config (TOML + watch) · observability (tracing, metrics)
//!                    lifecycle (startup, shutdown) · audience · deferred
//! ```
//!
//! Every command prints JSON on stdout; logs go to stderr.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use spa_router::audience::{Audience, AudienceFilter, IpInfoClient};
use spa_router::config::watcher::ConfigWatcher;
use spa_router::config::{load_config, AppConfig};
use spa_router::lifecycle::{self, App, Shutdown};
use spa_router::observability::{logging, metrics};
use spa_router::routing::{self, match_path, RouterState};
use spa_router::{Dispatch, View};

#[derive(Parser)]
#[command(name = "spa-router")]
#[command(about = "Headless client-side router", long_about = None)]
struct Cli {
    /// Log level; overrides the configured one.
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a path
    Normalize {
        path: String,
        /// Drop a single trailing slash
        #[arg(long)]
        strip_trailing: bool,
    },
    /// Match a path against a pattern
    Match { pattern: String, path: String },
    /// Dispatch paths through the routes of a config file
    Dispatch {
        #[arg(short, long)]
        config: PathBuf,
        paths: Vec<String>,
    },
    /// Dispatch a path and re-dispatch it on every config change
    Watch {
        #[arg(short, long)]
        config: PathBuf,
        path: Option<String>,
    },
    /// Look up the caller's info record, or evaluate a filter
    Audience {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Filter as JSON, e.g. {"kind":"probability","criteria":0.5}
        #[arg(short, long)]
        filter: Option<String>,
    },
}

#[derive(Serialize)]
struct MatchReport {
    matched: bool,
    params: routing::DynamicMap,
}

#[derive(Serialize)]
struct DispatchReport {
    #[serde(flatten)]
    dispatch: Dispatch,
    state: RouterState,
    rendered: Vec<View>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let level = cli.log_level.as_deref();

    match cli.command {
        Commands::Normalize {
            path,
            strip_trailing,
        } => {
            logging::init(level.unwrap_or("info"));
            print_json(&routing::normalize(&path, strip_trailing))?;
        }
        Commands::Match { pattern, path } => {
            logging::init(level.unwrap_or("info"));
            let result = match_path(&pattern, &path);
            print_json(&MatchReport {
                matched: result.is_match(),
                params: result.into_params().unwrap_or_default(),
            })?;
        }
        Commands::Dispatch { config, paths } => {
            let config = load(&config, level)?;
            let app = lifecycle::build(&config)?;
            let paths = if paths.is_empty() {
                vec![config.router.default_path.clone()]
            } else {
                paths
            };
            for path in paths {
                let dispatch = app.navigate(&path).await?;
                print_json(&report(&app, dispatch))?;
            }
        }
        Commands::Watch { config: path, path: target } => {
            watch(&path, target, level).await?;
        }
        Commands::Audience { config, filter } => {
            let config = match config {
                Some(path) => load(&path, level)?,
                None => {
                    logging::init(level.unwrap_or("info"));
                    AppConfig::default()
                }
            };
            let client = IpInfoClient::from_config(&config.audience)?;
            let audience = Audience::new(Arc::new(client), config.audience.user_agent.clone());

            match filter {
                Some(filter) => {
                    let filter: AudienceFilter = serde_json::from_str(&filter)?;
                    print_json(&audience.user_filter(&filter).await)?;
                }
                None => print_json(&audience.user_info().await)?,
            }
        }
    }

    Ok(())
}

fn load(path: &Path, level: Option<&str>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = load_config(path)?;
    logging::init(level.unwrap_or(config.observability.log_level.as_str()));
    tracing::info!(
        path = ?path,
        routes = config.routes.len(),
        lowercase = config.router.lowercase,
        "Configuration loaded"
    );
    Ok(config)
}

async fn watch(
    path: &Path,
    target: Option<String>,
    level: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load(path, level)?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let mut app = lifecycle::build(&config)?;
    let mut current = target.unwrap_or_else(|| config.router.default_path.clone());
    let dispatch = app.navigate(&current).await?;
    print_json(&report(&app, dispatch))?;

    let (watcher, mut updates) = ConfigWatcher::new(path);
    let _watcher = watcher.run()?;

    let shutdown = Shutdown::new();
    let mut stop = shutdown.subscribe();
    shutdown.trigger_on_ctrl_c();

    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(next) = update else { break };
                if let Some(path) = app.router.state().current_path.clone() {
                    current = path;
                }
                match lifecycle::build(&next) {
                    Ok(rebuilt) => {
                        app = rebuilt;
                        let dispatch = app.navigate(&current).await?;
                        print_json(&report(&app, dispatch))?;
                    }
                    Err(e) => tracing::error!(error = %e, "Rejected reloaded routes, keeping current table"),
                }
            }
            _ = stop.recv() => break,
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

fn report(app: &App, dispatch: Dispatch) -> DispatchReport {
    DispatchReport {
        dispatch,
        state: RouterState::clone(&app.router.state()),
        rendered: app.rendered(),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
