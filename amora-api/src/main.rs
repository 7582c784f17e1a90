use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

mod config;
mod models;
mod routes;
mod schema;

use amora_shared::clients::db::DbPool;
use config::AppConfig;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    amora_shared::middleware::init_tracing("amora-api");

    let config = AppConfig::load()?;
    let port = config.port;

    let db = amora_shared::clients::db::create_pool(&config.database_url)?;

    // Uploaded photos live on local disk and are served statically.
    let uploads_dir = std::path::PathBuf::from(&config.uploads_dir);
    if !uploads_dir.exists() {
        std::fs::create_dir_all(&uploads_dir)?;
        tracing::info!(dir = %uploads_dir.display(), "uploads directory created");
    }

    let state = Arc::new(AppState { db, config });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/auth/register",
            post(routes::register::register_user)
                .layer(DefaultBodyLimit::max(10 * 1024 * 1024)),
        )
        .route(
            "/profile/:id",
            get(routes::profile::get_profile).put(routes::profile::update_profile),
        )
        .route("/search/users", get(routes::search::list_candidates))
        .route("/like/swipe", post(routes::likes::record_swipe))
        .route("/likes/received/:id", get(routes::likes::received_likes))
        .route(
            "/chats",
            post(routes::chats::create_chat).get(routes::chats::list_chats),
        )
        .route(
            "/chats/:chat_id/messages",
            get(routes::messages::list_messages).post(routes::messages::send_message),
        )
        .route("/chats/:chat_id/read", patch(routes::messages::mark_chat_read))
        .nest_service("/uploads", ServeDir::new(&uploads_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "amora-api starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
