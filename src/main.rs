use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finance_assistant::config::Config;
use finance_assistant::db::Database;
use finance_assistant::news::NewsClient;
use finance_assistant::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finance_assistant=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path =
        std::env::var("FINANCE_CONFIG").unwrap_or_else(|_| "finance.toml".to_string());
    let config = Config::load(&config_path)?;
    info!("Loaded {} modules from {}", config.modules.len(), config_path);

    // Initialize database
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:finance_assistant.db?mode=rwc".to_string());
    let db = Database::new(&database_url).await?;
    db.initialize().await?;
    db.sync_catalog(&config.modules).await?;
    info!("Database initialized");

    // News client; the credential only ever comes from the environment
    let news = NewsClient::from_env(&config.news)?;
    if !news.has_credential() {
        warn!("NEWS_API_KEY is not set; news pages will report a missing credential");
    }

    let state = Arc::new(AppState {
        db: Arc::new(db),
        news: Arc::new(news),
    });

    let app = routes::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("Server starting on http://{}", config.server.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
