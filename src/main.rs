use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use villa_whatsapp::config::{AppConfig, DeliveryMode};
use villa_whatsapp::routes;
use villa_whatsapp::services::messaging::graph::GraphApiProvider;
use villa_whatsapp::services::messaging::MessagingProvider;
use villa_whatsapp::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let messaging: Option<Box<dyn MessagingProvider>> = match config.mode {
        DeliveryMode::Live => {
            anyhow::ensure!(
                !config.access_token.is_empty(),
                "WHATSAPP_ACCESS_TOKEN must be set when WHATSAPP_MODE=live"
            );
            anyhow::ensure!(
                !config.phone_number_id.is_empty(),
                "WHATSAPP_PHONE_NUMBER_ID must be set when WHATSAPP_MODE=live"
            );
            tracing::info!(
                url = %config.messages_url(),
                timeout_secs = config.provider_timeout.as_secs(),
                max_retries = config.max_retries,
                "using WhatsApp Cloud API provider"
            );
            Some(Box::new(GraphApiProvider::from_config(&config)?))
        }
        DeliveryMode::Simulate => {
            tracing::info!("simulation mode: template messages are not sent");
            None
        }
    };

    let state = Arc::new(AppState {
        config: config.clone(),
        messaging,
    });

    let app = routes::app(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
