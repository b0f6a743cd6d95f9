use axum::Router;
use std::sync::Arc;
use tickerlens::services::{AnalysisService, SignalTables};
use tickerlens::sources::YahooFinanceClient;
use tickerlens::{api, AppState, Config};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tickerlens=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());
    info!(
        exchange = %config.exchange,
        benchmark = %config.benchmark_symbol,
        range = %config.history_range,
        "Starting tickerlens server on {}:{}",
        config.host,
        config.port
    );

    // An unreadable override file aborts startup
    let tables = match &config.signal_tables_path {
        Some(path) => {
            let tables = SignalTables::from_json_file(path)?;
            info!("Loaded signal tables from {}", path.display());
            tables
        }
        None => SignalTables::canonical(),
    };

    let yahoo = YahooFinanceClient::new(config.http_timeout())?;
    let analysis = Arc::new(AnalysisService::new(
        yahoo,
        config.clone(),
        Arc::new(tables),
    ));

    match config.report_cache_ttl() {
        Some(ttl) => {
            info!("Report cache enabled (ttl {}s)", ttl.as_secs());
            let analysis = analysis.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(ttl);
                loop {
                    interval.tick().await;
                    analysis.cleanup_cache();
                }
            });
        }
        None => info!("Report cache disabled"),
    }

    let state = AppState {
        config: config.clone(),
        analysis,
    };

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = Router::new()
        .merge(api::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state);

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("tickerlens listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
