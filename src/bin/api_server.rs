// src/bin/api_server.rs

use salary_management_api::infra::logging::init_tracing;
use salary_management_api::transport;
use salary_management_api::{AppConfig, DatabaseService};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received, draining requests");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        allowed_keywords = ?config.gateway.allowed_keywords,
        max_rows = config.gateway.max_rows,
        timeout_ms = config.gateway.timeout.as_millis() as u64,
        "query gateway configured"
    );

    // --- Pool Initialization (before the first request is served) ---
    let db_service = DatabaseService::connect(&config.database).await?;
    match db_service.missing_tables().await {
        Ok(missing) if !missing.is_empty() => tracing::warn!(
            ?missing,
            "managed tables are missing; run `preflight --apply-schema` or apply the schema manually"
        ),
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "could not inspect the schema at startup"),
    }

    let app_state = transport::http::AppState::new(db_service.clone(), &config.gateway);

    // --- API Server Initialization ---
    // The admin UI is served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("API server listening on http://{}", config.bind_addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db_service.close().await;
    tracing::info!("graceful shutdown complete");
    Ok(())
}
