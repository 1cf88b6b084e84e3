use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::RestConfig;

/// Main entry point for the ResQ application
///
/// Starts the REST server, which also serves the notification WebSocket stream
/// (`/ws/notifications`) and the Swagger UI (`/swagger-ui`).
///
/// # Environment Variables
/// - `RESQ_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `RESQ_DATA_DIR`: Directory for persisted notifications and admission requests (default: "resq_data")
/// - `RESQ_DIRECTORY_FILE`: Hospital and ambulance directory YAML (optional)
/// - `RESQ_API_KEY`: API key required on every route except `/health` (optional)
/// - `RESQ_LLM_API_KEY`: Gemini API key; assessment endpoints are disabled without it
///
/// See [`RestConfig`] for the full list.
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("resq_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("resq_core=info".parse()?)
                .add_directive("resq_llm=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = RestConfig::from_env()?;
    tracing::info!(data_dir = %cfg.core.data_dir().display(), "configuration loaded");
    api_rest::serve(cfg).await
}
