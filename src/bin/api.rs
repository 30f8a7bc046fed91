use shopping_assistant::{api::start_server, assistant::ShoppingAssistant, config::BotConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = BotConfig::from_env()?;

    info!("🚀 Shopping Assistant - API Server");
    info!("📍 Port: {}", config.port);

    let assistant = Arc::new(ShoppingAssistant::from_config(&config).await?);

    info!("✅ Assistant initialized");
    info!("📡 Starting API server...");

    start_server(assistant, config.conversation_ttl, config.port).await?;

    Ok(())
}
