use std::sync::Arc;

use anyhow::Result;
use axum::http::HeaderValue;
use axum::Router;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use gambit_api::{misc_routes, setup_tracing, GlobalState, ServerEnv};
use gambit_chain::{SuiEnv, SuiGateway};
use gambit_clients::connect;
use gambit_common::EnvVars;
use gambit_queue::{
    ChannelEventBus, Dispatcher, Intake, IntentProcessor, PgStore, QueueEnv,
};
use gambit_service::spawn_transport_bridge;

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();

    let server_env = ServerEnv::load();
    let queue_env = QueueEnv::load();
    let sui_env = SuiEnv::load();

    let pool = Arc::new(connect().await.clone());
    let store = Arc::new(PgStore::new(pool));
    store.migrate().await?;

    let chain = Arc::new(SuiGateway::new(&sui_env)?);

    let (bus, outbound_rx) = ChannelEventBus::new();
    let bus = Arc::new(bus);

    let intake = Arc::new(Intake::new(store.clone(), bus.clone()));
    let _inbound_tx = spawn_transport_bridge(intake, outbound_rx);

    let processor = Arc::new(IntentProcessor::new(
        store.clone(),
        chain,
        bus.clone(),
        sui_env.package_id.clone(),
        sui_env.registry_id.clone(),
    ));
    let dispatcher = Dispatcher::new(store, processor, bus, queue_env.dispatcher_config());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let dispatcher_task = tokio::spawn(async move {
        dispatcher.run(shutdown_rx).await;
    });

    let cors = match &server_env.cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::very_permissive(),
    };
    let trace = TraceLayer::new_for_http();

    let global_state = GlobalState::new().await?;
    let app = Router::new()
        .merge(misc_routes())
        .layer(cors)
        .layer(trace)
        .with_state(global_state);

    let listener = tokio::net::TcpListener::bind(format!(":::{}", server_env.port)).await?;
    tracing::info!("LISTENING ON {}", server_env.port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("[main] shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    // The dispatcher finishes its in-flight intents before the pool goes.
    dispatcher_task.await?;
    Ok(())
}
