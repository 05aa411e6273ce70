use std::{fs::OpenOptions, net::SocketAddr, process::exit, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{
    EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt,
};

use riconcilia_rs::{AppState, ReconciliationConfig, build_router, graceful_shutdown};

/// The REST API server for riconcilia_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// How many days apart a bank transaction and a ledger entry may be
    /// dated and still be considered a match.
    #[arg(long, default_value_t = 7)]
    date_window_days: i64,

    /// The score, between 0 and 1, a unique best match must exceed to be
    /// matched automatically.
    #[arg(long, default_value_t = 0.5)]
    auto_match_threshold: f64,

    /// The largest difference in cents at which amounts still count as equal.
    #[arg(long, default_value_t = 0)]
    amount_tolerance_cents: i64,
}

impl Args {
    fn reconciliation_config(&self) -> ReconciliationConfig {
        ReconciliationConfig {
            date_window_days: self.date_window_days,
            auto_match_threshold: self.auto_match_threshold,
            amount_tolerance: self.amount_tolerance_cents,
        }
    }
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    if args.date_window_days < 0 || args.amount_tolerance_cents < 0 {
        tracing::error!("--date-window-days and --amount-tolerance-cents must not be negative");
        exit(1);
    }

    if !(0.0..=1.0).contains(&args.auto_match_threshold) {
        tracing::error!("--auto-match-threshold must be between 0 and 1");
        exit(1);
    }

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let conn = Connection::open(&args.db_path).unwrap_or_else(|error| {
        tracing::error!("Could not open database at {}: {error}", args.db_path);
        exit(1);
    });

    let config = args.reconciliation_config();
    tracing::info!("Using {config:?}");

    let state = AppState::new(conn, config).unwrap_or_else(|error| {
        tracing::error!("Could not initialize database: {error}");
        exit(1);
    });

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));

    tracing::info!("HTTP server listening on {}", addr);
    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("Server error: {error}");
        exit(1);
    }
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    // RUST_LOG overrides the stdout level, the log file always gets debug events.
    let stdout_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(stdout_log.with_filter(stdout_filter))
        .with(debug_log.with_filter(filter::LevelFilter::DEBUG))
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged by the route handlers, so skip the default 5xx logging.
        .on_failure(());

    router.layer(tracing_layer)
}
