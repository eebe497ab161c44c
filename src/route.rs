use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{any, get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    handler::{
        apply_to_match_handler, create_match_handler, get_active_matches_handler,
        get_match_applications_handler, get_match_by_id_handler, get_matches_handler,
        get_neighborhoods_handler, get_organizer_matches_handler, get_player_applications_handler,
        handle_websocket, health_handler, update_application_status_handler,
        update_match_status_handler,
    },
    AppState,
};

pub fn cors_layer(allow_origin: &str) -> Result<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([CONTENT_TYPE]);

    if allow_origin == "*" {
        return Ok(cors.allow_origin(Any));
    }

    let origin = HeaderValue::from_str(allow_origin)
        .map_err(|e| anyhow!("Invalid CORS origin {}: {}", allow_origin, e))?;
    Ok(cors.allow_origin(origin))
}

pub fn create_router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/neighborhoods", get(get_neighborhoods_handler))
        .route(
            "/api/matches",
            get(get_matches_handler).post(create_match_handler),
        )
        .route("/api/matches/active", get(get_active_matches_handler))
        .route("/api/matches/:match_id", get(get_match_by_id_handler))
        .route(
            "/api/matches/:match_id/status",
            put(update_match_status_handler),
        )
        .route(
            "/api/matches/:match_id/applications",
            get(get_match_applications_handler).post(apply_to_match_handler),
        )
        .route("/api/matches/:match_id/ws", any(handle_websocket))
        .route(
            "/api/organizers/:organizer_id/matches",
            get(get_organizer_matches_handler),
        )
        .route(
            "/api/players/:player_id/applications",
            get(get_player_applications_handler),
        )
        .route(
            "/api/applications/:application_id/status",
            put(update_application_status_handler),
        )
        .layer(cors)
        .layer(trace_layer)
        .with_state(state)
}
