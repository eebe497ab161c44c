use anyhow::{anyhow, Error, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

use crate::model::{ApplicationModel, MatchModel};

pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg?height=400&width=600";

#[derive(Deserialize, Debug, Default)]
pub struct Pagination {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl Pagination {
    /// `LIMIT`/`OFFSET` values for Postgres, which takes signed 64-bit ints.
    /// No limit means every row.
    pub fn bounds(&self) -> Result<(Option<i64>, i64)> {
        let limit = self
            .limit
            .map(|l| i64::try_from(l).map_err(|_| anyhow!("Invalid limit: {}", l)))
            .transpose()?;
        let offset = self.offset.unwrap_or(0);
        let offset = i64::try_from(offset).map_err(|_| anyhow!("Invalid offset: {}", offset))?;

        Ok((limit, offset))
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Type)]
#[sqlx(type_name = "field_type")]
pub enum FieldType {
    F5,
    F6,
    F7,
    F11,
}

impl TryFrom<&str> for FieldType {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        match s {
            "F5" => Ok(FieldType::F5),
            "F6" => Ok(FieldType::F6),
            "F7" => Ok(FieldType::F7),
            "F11" => Ok(FieldType::F11),
            _ => Err(anyhow!("Invalid field type: {}", s)),
        }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Type)]
#[sqlx(type_name = "gender")]
pub enum Gender {
    #[serde(rename = "Varones")]
    #[sqlx(rename = "Varones")]
    Male,
    #[serde(rename = "Mujeres")]
    #[sqlx(rename = "Mujeres")]
    Female,
    #[serde(rename = "Mixto")]
    #[sqlx(rename = "Mixto")]
    Mixed,
}

impl TryFrom<&str> for Gender {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        match s {
            "Varones" => Ok(Gender::Male),
            "Mujeres" => Ok(Gender::Female),
            "Mixto" => Ok(Gender::Mixed),
            _ => Err(anyhow!("Invalid gender: {}", s)),
        }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "match_status", rename_all = "lowercase")]
pub enum MatchStatus {
    Active,
    Confirmed,
    Completed,
    Cancelled,
}

impl MatchStatus {
    /// Organizer-driven lifecycle: active -> confirmed -> completed, and
    /// cancellation from either of the open states.
    pub fn can_transition_to(self, next: MatchStatus) -> bool {
        matches!(
            (self, next),
            (MatchStatus::Active, MatchStatus::Confirmed)
                | (MatchStatus::Confirmed, MatchStatus::Completed)
                | (MatchStatus::Active, MatchStatus::Cancelled)
                | (MatchStatus::Confirmed, MatchStatus::Cancelled)
        )
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    /// Only pending applications can be decided, and only once.
    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        self == ApplicationStatus::Pending && next != ApplicationStatus::Pending
    }
}

/// Payload an organizer submits to publish a match. Slot and age bounds are
/// stored as given. `match_date`/`match_time` are the organizer's local
/// wall-clock kick-off and are what the board filters on; `scheduled_at` is
/// the same instant in UTC and drives ordering and expiry.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct CreateMatchSchema {
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
    pub min_age: i32,
    pub max_age: i32,
    pub gender: Gender,
    pub price: i32,
    pub description: Option<String>,
    pub image: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct ApplySchema {
    pub player_id: String,
    pub player_name: String,
    pub player_email: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UpdateMatchStatusSchema {
    pub status: MatchStatus,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UpdateApplicationStatusSchema {
    pub status: ApplicationStatus,
}

#[derive(Deserialize, Debug, Default)]
pub struct MatchDetailQuery {
    pub viewer_email: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CreatedSchema {
    pub id: Uuid,
}

// For json response
#[derive(Debug, Serialize)]
pub struct GetMatchSchema {
    #[serde(flatten)]
    pub data: MatchModel,
    pub available_slots: i32,
}

impl From<MatchModel> for GetMatchSchema {
    fn from(m: MatchModel) -> Self {
        Self {
            available_slots: m.available_slots(),
            data: m,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MatchDetailSchema {
    #[serde(flatten)]
    pub data: GetMatchSchema,
    pub applications: Vec<ApplicationModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_applied: Option<bool>,
}

impl MatchDetailSchema {
    pub fn new(
        m: MatchModel,
        applications: Vec<ApplicationModel>,
        viewer_email: Option<&str>,
    ) -> Self {
        let has_applied = viewer_email.map(|email| has_applied(&applications, email));
        Self {
            data: m.into(),
            applications,
            has_applied,
        }
    }
}

/// Mirrors the browser heuristic: a viewer counts as applied when any
/// application carries their email. Nothing on the write path consults it.
pub fn has_applied(applications: &[ApplicationModel], email: &str) -> bool {
    applications.iter().any(|a| a.player_email == email)
}

/// Messages pushed over the per-match websocket.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApplicationEvent {
    Snapshot { applications: Vec<ApplicationModel> },
    Applied { application: ApplicationModel },
    StatusChanged { application: ApplicationModel },
}
