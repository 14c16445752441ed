pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    config::Config,
    handlers::chat,
    middleware::logging,
    routes::{health, messages, openapi, sheets, threads},
    state::AppState,
};

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Chat
        .route("/chat", post(chat::chat_stream))
        .route("/chat/complete", post(chat::chat_complete))
        // Threads
        .route("/threads", get(threads::list_threads).post(threads::create_thread))
        .route(
            "/threads/:thread_id",
            get(threads::get_thread)
                .put(threads::update_thread)
                .delete(threads::delete_thread),
        )
        .route("/threads/:thread_id/messages", get(messages::list_messages))
        // Messages
        .route("/messages", post(messages::create_message))
        .route("/messages/:message_id", delete(messages::delete_message))
        // Workbook
        .route("/sheets", get(sheets::list_sheets))
        // Docs
        .route("/api-docs/openapi.json", get(openapi::openapi_json));

    api_routes
        .layer(axum_middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(state.config.server.request_timeout()))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if !config.cors.enabled {
        return CorsLayer::permissive();
    }

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    if config.cors.origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors
            .origins
            .iter()
            .filter_map(|o| o.parse::<HeaderValue>().ok())
            .collect();

        cors.allow_origin(origins)
    }
}
