use bingewise_api::api::{create_router, AppState};
use bingewise_api::config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bingewise_api=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // Initialize application state
    let state = AppState::new(config.staleness_window_days);

    // Create the router with all routes
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(
        address = %config.bind_address(),
        staleness_window_days = config.staleness_window_days,
        "Server listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
