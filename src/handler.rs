use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::ws::Message;
use axum::extract::ws::WebSocket;
use axum::extract::Path;
use axum::extract::WebSocketUpgrade;
use axum::http::StatusCode;
use axum::Json;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use futures::SinkExt;
use futures::StreamExt;
use uuid::Uuid;

use crate::crud::crud_get_application;
use crate::crud::crud_get_match;
use crate::crud::crud_update_application_status;
use crate::crud::crud_update_match_status;
use crate::error::AppError;
use crate::feed::next_event;
use crate::filter::{MatchCriteria, MatchFilter, NEIGHBORHOODS};
use crate::model::MatchModel;
use crate::repository;
use crate::schema::{
    ApplicationEvent, ApplySchema, CreateMatchSchema, CreatedSchema, GetMatchSchema,
    MatchDetailQuery, MatchDetailSchema, Pagination, UpdateApplicationStatusSchema,
    UpdateMatchStatusSchema,
};
use crate::AppState;

pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn get_neighborhoods_handler() -> impl IntoResponse {
    Json(NEIGHBORHOODS)
}

pub async fn get_matches_handler(
    opts: Option<Query<Pagination>>,
    State(data): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let Query(opts) = opts.unwrap_or_default();
    let (limit, offset) = opts
        .bounds()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let matches = repository::get_all_matches(&data.db, limit, offset).await;
    Ok(matches_response(matches))
}

pub async fn get_active_matches_handler(
    Query(filter): Query<MatchFilter>,
    State(data): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let criteria =
        MatchCriteria::try_from(filter).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let matches = repository::get_active_matches(&data.db).await;
    Ok(matches_response(criteria.apply(matches)))
}

pub async fn get_organizer_matches_handler(
    Path(organizer_id): Path<String>,
    State(data): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let matches = repository::get_matches_by_organizer(&data.db, &organizer_id).await;
    Ok(matches_response(matches))
}

fn matches_response(matches: Vec<MatchModel>) -> Json<serde_json::Value> {
    let res: Vec<GetMatchSchema> = matches.into_iter().map(GetMatchSchema::from).collect();
    Json(serde_json::json!({
        "count": res.len(),
        "matches": res
    }))
}

pub async fn create_match_handler(
    State(data): State<Arc<AppState>>,
    Json(body): Json<CreateMatchSchema>,
) -> Result<impl IntoResponse, AppError> {
    let id = repository::create_match(&data.db, &body)
        .await
        .ok_or(AppError::Failed)?;

    Ok((StatusCode::CREATED, Json(CreatedSchema { id })))
}

pub async fn get_match_by_id_handler(
    Path(match_id): Path<Uuid>,
    query: Option<Query<MatchDetailQuery>>,
    State(data): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query.unwrap_or_default();

    let m = repository::get_match_by_id(&data.db, match_id)
        .await
        .ok_or(AppError::NotFound("Match"))?;
    let applications = repository::get_match_applications(&data.db, match_id).await;

    Ok(Json(MatchDetailSchema::new(
        m,
        applications,
        query.viewer_email.as_deref(),
    )))
}

/// Organizer lifecycle action. The read and the write are separate round
/// trips, so a concurrent change in between is not detected.
pub async fn update_match_status_handler(
    Path(match_id): Path<Uuid>,
    State(data): State<Arc<AppState>>,
    Json(body): Json<UpdateMatchStatusSchema>,
) -> Result<impl IntoResponse, AppError> {
    let current = crud_get_match(&data.db, match_id)
        .await?
        .ok_or(AppError::NotFound("Match"))?;

    if !current.status.can_transition_to(body.status) {
        return Err(AppError::Conflict(format!(
            "Match cannot move from {:?} to {:?}",
            current.status, body.status
        )));
    }

    let m = crud_update_match_status(&data.db, match_id, body.status).await?;
    tracing::info!("Match {} is now {:?}", m.id, m.status);

    Ok(Json(GetMatchSchema::from(m)))
}

pub async fn get_match_applications_handler(
    Path(match_id): Path<Uuid>,
    State(data): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(
        repository::get_match_applications(&data.db, match_id).await,
    ))
}

pub async fn apply_to_match_handler(
    Path(match_id): Path<Uuid>,
    State(data): State<Arc<AppState>>,
    Json(body): Json<ApplySchema>,
) -> Result<impl IntoResponse, AppError> {
    let application = repository::apply_to_match(&data.db, match_id, &body)
        .await
        .ok_or(AppError::Failed)?;

    let id = application.id;
    data.feed
        .publish(match_id, ApplicationEvent::Applied { application });

    Ok((StatusCode::CREATED, Json(CreatedSchema { id })))
}

pub async fn get_player_applications_handler(
    Path(player_id): Path<String>,
    State(data): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(
        repository::get_player_applications(&data.db, &player_id).await,
    ))
}

/// Organizer accepts or rejects an applicant. Slot counts on the match are
/// left alone.
pub async fn update_application_status_handler(
    Path(application_id): Path<Uuid>,
    State(data): State<Arc<AppState>>,
    Json(body): Json<UpdateApplicationStatusSchema>,
) -> Result<impl IntoResponse, AppError> {
    let current = crud_get_application(&data.db, application_id)
        .await?
        .ok_or(AppError::NotFound("Application"))?;

    if !current.status.can_transition_to(body.status) {
        return Err(AppError::Conflict(format!(
            "Application cannot move from {:?} to {:?}",
            current.status, body.status
        )));
    }

    let application =
        crud_update_application_status(&data.db, application_id, body.status).await?;
    tracing::info!(
        "Application {} is now {:?}",
        application.id,
        application.status
    );

    data.feed.publish(
        application.match_id,
        ApplicationEvent::StatusChanged {
            application: application.clone(),
        },
    );

    Ok(Json(application))
}

pub async fn handle_websocket(
    ws: WebSocketUpgrade,
    Path(match_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket_connection(socket, match_id, state))
}

async fn handle_socket_connection(mut socket: WebSocket, match_id: Uuid, state: Arc<AppState>) {
    // Subscribe before reading the snapshot so nothing published in between
    // is missed.
    let mut rx = state.feed.subscribe(match_id);

    let current_connections = state.connection_count.fetch_add(1, Ordering::SeqCst);
    tracing::info!(
        "New feed connection for match {}. Total connections: {}, open feeds: {}",
        match_id,
        current_connections + 1,
        state.feed.channel_count()
    );

    let initial = ApplicationEvent::Snapshot {
        applications: repository::get_match_applications(&state.db, match_id).await,
    };

    if let Ok(initial_message) = serde_json::to_string(&initial) {
        let _ = socket.send(Message::Text(initial_message)).await;
    }

    let (mut sender, mut receiver) = socket.split();

    // Server -> client: forward every event for this match.
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = next_event(&mut rx).await {
            if let Ok(msg) = serde_json::to_string(&event) {
                if sender.send(Message::Text(msg)).await.is_err() {
                    break;
                }
            }
        }
    });

    // Client -> server: nothing is accepted, just wait for the close.
    let mut receive_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if let Message::Close(_) = message {
                break;
            }
        }
    });

    // The aborted task is awaited so its receiver is dropped before release.
    tokio::select! {
        _ = &mut send_task => {
            receive_task.abort();
            let _ = receive_task.await;
        }
        _ = &mut receive_task => {
            send_task.abort();
            let _ = send_task.await;
        }
    };
    state.feed.release(match_id);

    let remaining = state.connection_count.fetch_sub(1, Ordering::SeqCst) - 1;
    tracing::info!("Connection closed. Remaining connections: {}", remaining);
}
