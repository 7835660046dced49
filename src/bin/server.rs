use std::{
    collections::HashMap,
    env,
    fs::OpenOptions,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;

use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use dompet::{
    AppState, LedgerService, build_router,
    auth::SessionVerifier,
    db::initialize,
    graceful_shutdown,
    models::UserId,
    stores::sqlite::{SqliteAccountStore, SqliteCategoryStore, SqliteTransactionStore},
};

/// The REST API server for dompet.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,
}

/// A session verifier over a fixed token table taken from the environment.
///
/// Stands in for the deployment's session service. The `SESSION_TOKENS`
/// variable holds comma-separated `token:user_id` pairs.
struct EnvTokenVerifier {
    tokens: HashMap<String, UserId>,
}

impl EnvTokenVerifier {
    fn from_env() -> Self {
        let raw = env::var("SESSION_TOKENS")
            .expect("The environment variable 'SESSION_TOKENS' must be set");

        let tokens = raw
            .split(',')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (token, user_id) = pair
                    .split_once(':')
                    .expect("SESSION_TOKENS entries must look like 'token:user_id'");
                let user_id = user_id
                    .parse()
                    .expect("SESSION_TOKENS user ids must be integers");

                (token.to_owned(), user_id)
            })
            .collect();

        Self { tokens }
    }
}

impl SessionVerifier for EnvTokenVerifier {
    fn verify(&self, token: &str) -> Option<UserId> {
        self.tokens.get(token).copied()
    }
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let connection = Connection::open(&args.db_path).expect("Could not open the database file.");
    initialize(&connection).expect("Could not initialize the database.");
    let connection = Arc::new(Mutex::new(connection));

    let ledger = LedgerService::new(
        SqliteAccountStore::new(connection.clone()),
        SqliteCategoryStore::new(connection.clone()),
        SqliteTransactionStore::new(connection),
    );
    let state = AppState::new(ledger, Arc::new(EnvTokenVerifier::from_env()));

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .unwrap();
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

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
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
        // Errors are logged where they occur, so skip the default 5xx log.
        .on_failure(());

    router.layer(tracing_layer)
}
