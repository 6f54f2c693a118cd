//! CLI entry point for lot_watch.
//!
//! Mounts the dashboard or a lot's detail view, re-renders whenever the
//! polled model changes, and follows navigation typed on stdin
//! (`/`, `/details/2`, ...).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lot_watch::{
    api::{Endpoints, OccupancySource, ParkingApi},
    config::SyncConfig,
    fetch::BasicClient,
    model::{AggregateState, DetailState},
    present::{dashboard_screen, detail_screen},
    reconcile::ViewModel,
    render::{dashboard_text, detail_text, to_json},
    route::Route,
    view::{AggregateView, DetailView},
};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "lot_watch")]
#[command(about = "Live occupancy monitor for parking lots", long_about = None)]
struct Cli {
    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Backend base URL (overrides config and LOT_WATCH_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Cadence of background refresh in milliseconds
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a view and keep it refreshed; type routes on stdin to navigate
    Watch {
        /// Initial location, `/` or `/details/{lotId}`
        #[arg(value_name = "ROUTE", default_value = "/")]
        route: String,

        /// Print screens as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Exit after this many renders (0 = run until Ctrl+C)
        #[arg(short = 'n', long, default_value_t = 0)]
        renders: usize,
    },
    /// Print the live video stream URL for a lot
    StreamUrl {
        #[arg(value_name = "LOT_ID")]
        lot: String,
    },
    /// Check that the backend is up
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/lot_watch.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("lot_watch.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let endpoints = Endpoints::new(&config.base_url)?;

    match cli.command {
        Commands::Watch {
            route,
            json,
            renders,
        } => {
            let route: Route = route.parse()?;
            let client = BasicClient::with_timeout(config.request_timeout())?;
            let api = ParkingApi::new(client, endpoints.clone());
            watch_views(Arc::new(api), &config, &endpoints, route, json, renders).await?;
        }
        Commands::StreamUrl { lot } => {
            println!("{}", endpoints.video_stream(&lot));
        }
        Commands::Health => {
            let client = BasicClient::with_timeout(config.request_timeout())?;
            let api = ParkingApi::new(client, endpoints);
            match api.health().await {
                Ok(status) if status.is_healthy() => {
                    info!(status = %status.status, "Backend healthy")
                }
                Ok(status) => {
                    warn!(status = %status.status, "Backend reported unexpected status");
                    anyhow::bail!("backend status: {}", status.status);
                }
                Err(e) => {
                    error!(error = %e, "Health check failed");
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}

/// Config file, then `LOT_WATCH_BASE_URL`, then command-line flags.
fn resolve_config(cli: &Cli) -> Result<SyncConfig> {
    let mut config = match &cli.config {
        Some(path) => SyncConfig::load(path)?,
        None => SyncConfig::default(),
    };
    if let Ok(base_url) = std::env::var("LOT_WATCH_BASE_URL") {
        config.base_url = base_url;
    }
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(ms) = cli.poll_interval_ms {
        config.poll_interval_ms = ms;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// The view currently on screen and a receiver for its model.
enum Active {
    Dashboard {
        view: AggregateView,
        rx: watch::Receiver<ViewModel<AggregateState>>,
    },
    Details {
        view: DetailView,
        rx: watch::Receiver<ViewModel<DetailState>>,
    },
}

impl Active {
    fn mount(
        route: &Route,
        source: &Arc<dyn OccupancySource>,
        config: &SyncConfig,
    ) -> Result<Self> {
        Ok(match route {
            Route::Dashboard => {
                let view = AggregateView::mount(Arc::clone(source), config)?;
                let rx = view.subscribe();
                Active::Dashboard { view, rx }
            }
            Route::Details { lot_id } => {
                let view = DetailView::mount(Arc::clone(source), config, lot_id.clone())?;
                let rx = view.subscribe();
                Active::Details { view, rx }
            }
        })
    }

    /// Stays on the mounted view when the route names the same kind of view,
    /// switching lots in place; otherwise unmounts and mounts anew.
    fn navigate(
        self,
        route: &Route,
        source: &Arc<dyn OccupancySource>,
        config: &SyncConfig,
    ) -> Result<Self> {
        match (self, route.lot_id()) {
            (dashboard @ Active::Dashboard { .. }, None) => Ok(dashboard),
            (Active::Details { mut view, .. }, Some(lot_id)) => {
                view.set_lot(lot_id)?;
                let rx = view.subscribe();
                Ok(Active::Details { view, rx })
            }
            (current, _) => {
                current.unmount();
                Self::mount(route, source, config)
            }
        }
    }

    fn unmount(self) {
        match self {
            Active::Dashboard { view, .. } => {
                view.unmount();
            }
            Active::Details { view, .. } => {
                view.unmount();
            }
        }
    }

    /// Resolves on the next model change. Never resolves once the model's
    /// sender is gone.
    async fn changed(&mut self) {
        let open = match self {
            Active::Dashboard { rx, .. } => rx.changed().await.is_ok(),
            Active::Details { rx, .. } => rx.changed().await.is_ok(),
        };
        if !open {
            std::future::pending::<()>().await;
        }
    }

    fn render(&mut self, config: &SyncConfig, endpoints: &Endpoints, json: bool) -> Result<String> {
        match self {
            Active::Dashboard { rx, .. } => {
                let model = rx.borrow_and_update().clone();
                let screen = dashboard_screen(&model, &config.lots);
                if json {
                    to_json(&screen)
                } else {
                    Ok(with_footer(dashboard_text(&screen), &model))
                }
            }
            Active::Details { view, rx } => {
                let model = rx.borrow_and_update().clone();
                let screen = detail_screen(&model, view.lot_id(), endpoints);
                if json {
                    to_json(&screen)
                } else {
                    Ok(with_footer(detail_text(&screen), &model))
                }
            }
        }
    }
}

fn with_footer<M>(mut text: String, model: &ViewModel<M>) -> String {
    if let Some(at) = model.updated_at {
        text.push_str(&format!("\nLast updated: {}\n", at.format("%H:%M:%S")));
    }
    text
}

async fn next_route(stdin: &mut Option<Lines<BufReader<Stdin>>>) -> Option<String> {
    match stdin.as_mut() {
        Some(lines) => match lines.next_line().await {
            Ok(Some(line)) => Some(line),
            Ok(None) | Err(_) => {
                *stdin = None;
                None
            }
        },
        None => std::future::pending().await,
    }
}

#[tracing::instrument(skip(source, config, endpoints), fields(route = %route))]
async fn watch_views(
    source: Arc<dyn OccupancySource>,
    config: &SyncConfig,
    endpoints: &Endpoints,
    route: Route,
    json: bool,
    renders: usize,
) -> Result<()> {
    if renders == 0 {
        info!("Watching. Press Ctrl+C to stop.");
    }

    let mut active = Active::mount(&route, &source, config)?;
    let mut stdin = Some(BufReader::new(tokio::io::stdin()).lines());
    let mut render_count = 0;
    let mut dirty = true;

    loop {
        if dirty {
            println!("{}", active.render(config, endpoints, json)?);
            render_count += 1;
            if renders > 0 && render_count >= renders {
                break;
            }
            dirty = false;
        }

        tokio::select! {
            _ = active.changed() => dirty = true,
            line = next_route(&mut stdin) => {
                let Some(line) = line.filter(|l| !l.trim().is_empty()) else { continue };
                match line.parse::<Route>() {
                    Ok(route) => {
                        info!(route = %route, "Navigating");
                        active = active.navigate(&route, &source, config)?;
                        dirty = true;
                    }
                    Err(e) => warn!(error = %e, "Ignoring navigation"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    active.unmount();
    Ok(())
}
