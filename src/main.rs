use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use flightgate::router::init_router;
use flightgate::state::init_app_state;
use flightgate_config::{CacheConfig, ServerConfig};
use flightgate_observability::{init_metrics, init_tracing, metrics_app, shutdown_tracer};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "flightgate")]
#[command(about = "Flightgate - flight search gateway with response caching", long_about = None)]
struct Cli {
    /// Address to listen on (overrides BIND_ADDRESS)
    #[arg(short = 'b', long)]
    bind: Option<SocketAddr>,

    /// Seconds a flight search response stays cached (overrides SEARCH_CACHE_TTL_SECONDS)
    #[arg(long)]
    search_ttl: Option<f64>,

    /// Seconds a /hello response stays cached (overrides HELLO_CACHE_TTL_SECONDS)
    #[arg(long)]
    hello_ttl: Option<f64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    init_tracing()?;

    let mut server_config = ServerConfig::from_env()?;
    let mut cache_config = CacheConfig::from_env()?;
    if let Some(bind) = cli.bind {
        server_config.bind_address = bind;
    }
    if let Some(ttl) = cli.search_ttl {
        cache_config.search_ttl_seconds = ttl;
    }
    if let Some(ttl) = cli.hello_ttl {
        cache_config.hello_ttl_seconds = ttl;
    }

    let state = init_app_state(&cache_config).context("failed to initialise application state")?;
    state.spawn_cache_sweepers(Duration::from_secs(cache_config.sweep_interval_seconds));

    if let Some(handle) = init_metrics() {
        let metrics_listener = tokio::net::TcpListener::bind(server_config.metrics_bind_address)
            .await
            .with_context(|| {
                format!(
                    "failed to bind metrics listener on {}",
                    server_config.metrics_bind_address
                )
            })?;
        info!(
            "📊 Metrics available at http://{}/metrics",
            server_config.metrics_bind_address
        );
        tokio::spawn(async move {
            if let Err(e) = axum::serve(metrics_listener, metrics_app(handle)).await {
                error!(error = %e, "Metrics server stopped");
            }
        });
    }

    let app = init_router(state);
    let listener = tokio::net::TcpListener::bind(server_config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", server_config.bind_address))?;

    let addr = server_config.bind_address;
    info!("🚀 Server running on http://{addr}");
    info!("📚 Swagger UI available at http://{addr}/swagger-ui");
    info!("📖 Scalar UI available at http://{addr}/scalar");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    info!("Shutting down");
    shutdown_tracer().await;
    Ok(())
}
