use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{ApplicationStatus, FieldType, Gender, MatchStatus};

// For sqlx, one row of `partidos`
#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct MatchModel {
    pub id: Uuid,
    pub organizer_id: String,
    pub organizer_name: String,
    pub organizer_email: String,
    pub place: String,
    pub address: Option<String>,
    pub neighborhood: String,
    pub scheduled_at: DateTime<Utc>,
    pub match_date: NaiveDate,
    pub match_time: NaiveTime,
    pub field_type: FieldType,
    pub total_slots: i32,
    pub occupied_slots: i32,
    pub min_age: i32,
    pub max_age: i32,
    pub gender: Gender,
    pub price: i32,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MatchModel {
    /// Free places as shown to players. `occupied_slots` is never reconciled
    /// with the application list, so this can disagree with it.
    pub fn available_slots(&self) -> i32 {
        (self.total_slots - self.occupied_slots).max(0)
    }
}

// For sqlx, one row of `applications`
#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct ApplicationModel {
    pub id: Uuid,
    pub match_id: Uuid,
    pub player_id: String,
    pub player_name: String,
    pub player_email: String,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
}
