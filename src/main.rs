use anyhow::Context;
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod db;
mod dto;
mod error;
mod extract;
mod handlers;
mod models;
mod services;

use auth::rate_limit::RateLimitState;
use config::Config;
use error::AppError;
use services::chat::ChatProvider;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: RateLimitState,
    pub chat: Arc<ChatProvider>,
}

async fn not_found() -> AppError {
    AppError::NotFound("Endpoint not found".into())
}

pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_auth,
        ));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/api/resources", get(handlers::resources::list_resources))
        .route("/api/resources/:id", get(handlers::resources::get_resource))
        .route("/api/articles", get(handlers::articles::list_articles))
        .route("/api/articles/:id", get(handlers::articles::get_article))
        .route("/api/books", get(handlers::library::list_books))
        .route("/api/books/:id", get(handlers::library::get_book))
        .route("/api/videos", get(handlers::library::list_videos))
        .route("/api/videos/:id", get(handlers::library::get_video))
        .route(
            "/api/appointments/available-slots/:resource_id",
            get(handlers::appointments::available_slots),
        )
        .merge(auth_routes);

    let chat_routes = Router::new()
        .route("/api/ai/chat", post(handlers::chat::chat))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_chat,
        ));

    let admin_routes = Router::new()
        .route("/api/admin/users", get(handlers::admin::list_users))
        .route(
            "/api/admin/users/:id/role",
            patch(handlers::admin::update_user_role),
        )
        .route(
            "/api/admin/appointments",
            get(handlers::admin::list_all_appointments),
        )
        .route(
            "/api/admin/resources",
            post(handlers::resources::create_resource),
        )
        .route(
            "/api/admin/resources/:id",
            patch(handlers::resources::update_resource)
                .delete(handlers::resources::delete_resource),
        )
        .route(
            "/api/admin/articles",
            get(handlers::articles::list_articles).post(handlers::articles::create_article),
        )
        .route(
            "/api/admin/articles/:id",
            axum::routing::delete(handlers::articles::delete_article),
        )
        .route(
            "/api/admin/books",
            get(handlers::library::list_books).post(handlers::library::create_book),
        )
        .route(
            "/api/admin/books/:id",
            axum::routing::delete(handlers::library::delete_book),
        )
        .route(
            "/api/admin/videos",
            get(handlers::library::list_videos).post(handlers::library::create_video),
        )
        .route(
            "/api/admin/videos/:id",
            axum::routing::delete(handlers::library::delete_video),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_admin,
        ));

    let protected_routes = Router::new()
        .route("/api/me", get(handlers::auth::me))
        // Appointments
        .route(
            "/api/appointments",
            get(handlers::appointments::list_appointments)
                .post(handlers::appointments::create_appointment),
        )
        .route(
            "/api/appointments/:id",
            get(handlers::appointments::get_appointment)
                .patch(handlers::appointments::reschedule_appointment)
                .delete(handlers::appointments::cancel_appointment),
        )
        // Moods
        .route(
            "/api/moods",
            get(handlers::moods::list_moods).post(handlers::moods::create_mood),
        )
        .route("/api/moods/stats/summary", get(handlers::moods::mood_summary))
        .route(
            "/api/moods/:id",
            get(handlers::moods::get_mood).delete(handlers::moods::delete_mood),
        )
        .merge(chat_routes)
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .with_state(state)
}

fn cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = vec![config
        .frontend_url
        .parse::<axum::http::HeaderValue>()
        .context("FRONTEND_URL is not a valid origin")?];
    if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
        for o in extra.split(',') {
            if let Ok(hv) = o.trim().parse::<axum::http::HeaderValue>() {
                origins.push(hv);
            }
        }
    }

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ustawi_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    let db = db::create_pool(&config.database_url).await;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations applied");

    let chat = ChatProvider::from_config(&config).context("Failed to build chat HTTP client")?;
    tracing::info!(provider = chat.name(), "Chat assistant provider selected");

    let rate_limiter = RateLimitState::new();
    auth::rate_limit::spawn_cleanup_worker(rate_limiter.clone());

    let state = AppState {
        db,
        config: config.clone(),
        rate_limiter,
        chat: Arc::new(chat),
    };

    let app = build_router(state)
        .layer(cors_layer(&config)?)
        .layer(TraceLayer::new_for_http());

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    // Client IP is needed by the auth rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    Ok(())
}
