//! Match and application repositories.
//!
//! Every call here is a single round trip to the store with no locking, no
//! transaction and no retry. Failures are logged and collapsed into a sentinel
//! (`None` or an empty list), so callers only learn that something failed, not
//! why.
//!
//! Slot accounting is not enforced anywhere on this path. Two players applying
//! for the last slot at the same time both get stored, and the same player can
//! apply to the same match more than once.

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    crud::{
        crud_create_application, crud_create_match, crud_get_match, crud_get_match_applications,
        crud_get_matches, crud_get_matches_by_organizer, crud_get_player_applications,
        crud_get_upcoming_matches,
    },
    filter::only_active,
    model::{ApplicationModel, MatchModel},
    schema::{ApplySchema, CreateMatchSchema},
};

/// Stores a new `active` match and returns its id.
pub async fn create_match(db: &Pool<Postgres>, data: &CreateMatchSchema) -> Option<Uuid> {
    match crud_create_match(db, data).await {
        Ok(m) => {
            tracing::info!("Match created with ID: {}", m.id);
            Some(m.id)
        }
        Err(e) => {
            tracing::error!("Error creating match: {:#}", e);
            None
        }
    }
}

/// Upcoming matches that are still open, soonest first.
pub async fn get_active_matches(db: &Pool<Postgres>) -> Vec<MatchModel> {
    let now = Utc::now();
    match crud_get_upcoming_matches(db, now).await {
        Ok(matches) => only_active(matches, now),
        Err(e) => {
            tracing::error!("Error fetching active matches: {:#}", e);
            Vec::new()
        }
    }
}

pub async fn get_all_matches(db: &Pool<Postgres>, limit: Option<i64>, offset: i64) -> Vec<MatchModel> {
    crud_get_matches(db, limit, offset)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Error fetching all matches: {:#}", e);
            Vec::new()
        })
}

/// `None` covers both a missing match and a failed read.
pub async fn get_match_by_id(db: &Pool<Postgres>, id: Uuid) -> Option<MatchModel> {
    crud_get_match(db, id).await.unwrap_or_else(|e| {
        tracing::error!("Error fetching match {}: {:#}", id, e);
        None
    })
}

pub async fn get_matches_by_organizer(db: &Pool<Postgres>, organizer_id: &str) -> Vec<MatchModel> {
    crud_get_matches_by_organizer(db, organizer_id)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Error fetching organizer matches: {:#}", e);
            Vec::new()
        })
}

/// Stores a pending application and hands back the stored record, whose `id`
/// is the new identifier.
pub async fn apply_to_match(
    db: &Pool<Postgres>,
    match_id: Uuid,
    data: &ApplySchema,
) -> Option<ApplicationModel> {
    match crud_create_application(db, match_id, data).await {
        Ok(a) => {
            tracing::info!("Application created with ID: {}", a.id);
            Some(a)
        }
        Err(e) => {
            tracing::error!("Error applying to match: {:#}", e);
            None
        }
    }
}

/// Applications for a match, newest first.
pub async fn get_match_applications(db: &Pool<Postgres>, match_id: Uuid) -> Vec<ApplicationModel> {
    crud_get_match_applications(db, match_id)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Error fetching match applications: {:#}", e);
            Vec::new()
        })
}

pub async fn get_player_applications(
    db: &Pool<Postgres>,
    player_id: &str,
) -> Vec<ApplicationModel> {
    crud_get_player_applications(db, player_id)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Error fetching player applications: {:#}", e);
            Vec::new()
        })
}
