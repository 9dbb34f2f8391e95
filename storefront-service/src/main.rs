use service_core::observability::logging::init_tracing;
use storefront_service::{
    config::StorefrontConfig, services::metrics::init_metrics, startup::Application,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Fail fast on invalid configuration
    let config = StorefrontConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );
    init_metrics();

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting storefront service"
    );

    let app = Application::build(config).await?;
    app.run_until_stopped().await
}
