use atelier_core::observability::init_tracing;
use atelier_service::{config::Config, Application};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let json_logs = std::env::var("ATELIER_LOG_JSON")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);
    init_tracing("info,atelier_service=debug", json_logs);

    atelier_service::services::init_metrics();

    let config = Config::from_env().expect("Failed to load configuration");
    let application = Application::build(config).await?;
    application.run_until_stopped().await?;

    Ok(())
}
