use clear_relay::clear_client::ClearClient;
use clear_relay::config::Config;
use clear_relay::handlers::{self, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading (fails fast on missing CLEAR credentials).
/// - The CLEAR client and its client certificate.
/// - HTTP routes and middleware (origin check, CORS, limits).
///
/// It then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clear_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize CLEAR client; the client certificate is loaded here
    let clear_client = ClearClient::new(&config)?;
    tracing::info!(
        "CLEAR client initialized with certificate {}",
        config.credentials.cert_path
    );

    let addr = format!("{}:{}", config.host, config.port);
    let app_state = Arc::new(AppState {
        config,
        clear_client,
    });
    let app = handlers::router(app_state)?;

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
