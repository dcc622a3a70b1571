use axum::{routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clientes_api::config::Config;
use clientes_api::db::Database;
use clientes_api::handlers::{self, AppState};
use clientes_api::viacep::ViaCepClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clientes_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Initialize database connection pool and run migrations
    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    // Initialize ViaCEP client
    let viacep = ViaCepClient::new(config.viacep_base_url.clone())
        .map_err(|e| anyhow::anyhow!("Failed to initialize ViaCEP client: {}", e))?;
    tracing::info!("ViaCEP client initialized: {}", config.viacep_base_url);

    // Build application state
    let app_state = Arc::new(AppState {
        db: db.pool.clone(),
        viacep,
    });

    // Cliente CRUD routes
    let cliente_routes = Router::new()
        .route(
            "/clientes",
            get(handlers::listar_clientes).post(handlers::inserir_cliente),
        )
        .route(
            "/clientes/:id",
            get(handlers::buscar_cliente)
                .put(handlers::atualizar_cliente)
                .delete(handlers::deletar_cliente),
        )
        // Request size limit: 1MB max payload
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(1024 * 1024)));

    // Build final app with health check outside the body limit
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(cliente_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
