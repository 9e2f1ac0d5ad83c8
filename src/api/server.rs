//! HTTP server implementation

use std::sync::Arc;

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::chat::ChatService;
use crate::config::AppConfig;
use crate::rag::RagService;
use crate::session;
use crate::Result;

/// Assemble the full application router with middleware
pub fn build_router(state: AppState, enable_cors: bool) -> Router {
    let mut app = Router::new()
        .nest("/api", routes::api_routes(state.clone()))
        .merge(routes::webhook_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if enable_cors {
        info!("✅ CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Start the API server
pub async fn serve_api(config: &AppConfig, host: String, port: u16) -> Result<()> {
    info!("🚀 Starting chatrag server...");

    let rag = Arc::new(RagService::new(config)?);
    let sessions = session::from_config(&config.session)?;
    let chat = Arc::new(ChatService::new(
        rag.clone(),
        sessions,
        config.bot.clone(),
        config.session.max_history,
    ));

    let app = build_router(AppState { rag, chat }, config.server.enable_cors);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 Server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET  /api/health     - Health check");
    info!("  POST /api/rag/query  - RAG query");
    info!("  POST /webhook        - Chat-platform webhook");

    axum::serve(listener, app).await?;

    Ok(())
}
