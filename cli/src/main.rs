//! `osf-sim` binary: wires the core engine to a thin `axum` HTTP/SSE
//! surface (§6). The simulation runs identically with or without this
//! binary attached — it only exposes the core's public API over the wire.

mod error;
mod routes;
mod state;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use osf_sim_core::{
    HttpBridge, InMemoryStore, NetworkClock, NpcEngine, NullBridge, Settings, StateStore,
    SubscriptionBus, TickPipeline,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use state::AppState;

const MAILBOX_CAPACITY: usize = 256;

#[derive(Parser, Debug)]
#[command(name = "osf-sim", about = "Deterministic monthly-tick property-tokenization network simulator")]
struct Cli {
    /// Optional TOML config file layered over the built-in defaults (§2a).
    #[arg(long, env = "OSF_SIM_CONFIG")]
    config: Option<String>,

    /// Overrides `Settings::bind_addr` when set.
    #[arg(long, env = "OSF_SIM_BIND_ADDR")]
    bind_addr: Option<String>,

    /// Overrides `Settings::seed` when set; otherwise falls back to the
    /// configured seed, or a fixed default if neither is present.
    #[arg(long, env = "OSF_SIM_SEED")]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(bind_addr) = cli.bind_addr {
        settings.bind_addr = bind_addr;
    }
    if let Some(seed) = cli.seed {
        settings.seed = Some(seed);
    }
    let seed = settings.seed.unwrap_or(42);

    let store: Arc<dyn StateStore> = Arc::new(InMemoryStore::new());
    let bus = Arc::new(SubscriptionBus::new(MAILBOX_CAPACITY));

    NpcEngine::new().ensure_seeded(&*store);

    let pipeline = Arc::new(match (&settings.narrative.endpoint, &settings.narrative.api_key) {
        (Some(endpoint), Some(api_key)) => {
            info!(endpoint = %endpoint, "narrative bridge: http");
            let bridge = HttpBridge::new(endpoint.clone(), api_key.clone(), settings.narrative.timeout_ms);
            TickPipeline::with_bridge(store.clone(), bus.clone(), seed, Box::new(bridge))
        }
        _ => {
            info!("narrative bridge: null (no endpoint/api_key configured)");
            TickPipeline::with_bridge(store.clone(), bus.clone(), seed, Box::new(NullBridge))
        }
    });

    let clock = NetworkClock::new(store.clone(), pipeline.clone(), bus.clone(), settings.clock.default_preset);
    clock.start().await;

    let app_state = AppState {
        store: store.clone(),
        pipeline: pipeline.clone(),
        clock: clock.clone(),
    };

    let app = routes::build()
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    info!(addr = %settings.bind_addr, "osf-sim listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(clock.clone()))
        .await?;

    Ok(())
}

async fn shutdown_signal(clock: NetworkClock) {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received, stopping clock");
    clock.stop().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
}
