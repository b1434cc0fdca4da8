use bazaar::server::config::AppConfig;
use bazaar::server::init::{connect_pool, create_app};
use bazaar::server::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = AppConfig::from_env();
    tracing::info!("Starting bazaar server");

    let pool = connect_pool(&config.database_url).await?;
    let state = AppState::new(pool, config.clone());
    let app = create_app(state);

    let addr = std::net::SocketAddr::new(config.host.parse()?, config.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
