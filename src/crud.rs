use anyhow::{anyhow, Ok, Result};
use chrono::{DateTime, Utc};
use sqlx::{query_as, Pool, Postgres};
use uuid::Uuid;

use crate::{
    model::{ApplicationModel, MatchModel},
    schema::{ApplicationStatus, ApplySchema, CreateMatchSchema, MatchStatus, PLACEHOLDER_IMAGE},
};

pub async fn crud_create_match(
    db: &Pool<Postgres>,
    data: &CreateMatchSchema,
) -> Result<MatchModel> {
    let id = Uuid::new_v4();
    let image = data
        .image
        .clone()
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

    let m: MatchModel = query_as(
        r#"
        INSERT INTO partidos (
            id, organizer_id, organizer_name, organizer_email,
            place, address, neighborhood, scheduled_at, match_date, match_time,
            field_type, total_slots, occupied_slots, min_age, max_age, gender,
            price, description, image, status
        )
        VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
            $11, $12, 0, $13, $14, $15, $16, $17, $18, $19
        )
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&data.organizer_id)
    .bind(&data.organizer_name)
    .bind(&data.organizer_email)
    .bind(&data.place)
    .bind(&data.address)
    .bind(&data.neighborhood)
    .bind(data.scheduled_at)
    .bind(data.match_date)
    .bind(data.match_time)
    .bind(data.field_type)
    .bind(data.total_slots)
    .bind(data.min_age)
    .bind(data.max_age)
    .bind(data.gender)
    .bind(data.price)
    .bind(&data.description)
    .bind(image)
    .bind(MatchStatus::Active)
    .fetch_one(db)
    .await
    .map_err(|e| anyhow!("Unable to insert match into db: {}", e))?;

    Ok(m)
}

/// Matches scheduled strictly after `now`, soonest first. Status is not part of
/// the predicate.
pub async fn crud_get_upcoming_matches(
    db: &Pool<Postgres>,
    now: DateTime<Utc>,
) -> Result<Vec<MatchModel>> {
    let matches: Vec<MatchModel> = sqlx::query_as(
        r#"SELECT * FROM partidos WHERE scheduled_at > $1 ORDER BY scheduled_at ASC"#,
    )
    .bind(now)
    .fetch_all(db)
    .await
    .map_err(|e| anyhow!("Unable to query upcoming matches from db: {}", e))?;

    Ok(matches)
}

pub async fn crud_get_matches(
    db: &Pool<Postgres>,
    limit: Option<i64>,
    offset: i64,
) -> Result<Vec<MatchModel>> {
    // A NULL limit means no limit in Postgres.
    let matches: Vec<MatchModel> = sqlx::query_as(
        r#"SELECT * FROM partidos ORDER BY scheduled_at DESC LIMIT $1 OFFSET $2"#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .map_err(|e| anyhow!("Unable to query matches from db: {}", e))?;

    Ok(matches)
}

pub async fn crud_get_match(db: &Pool<Postgres>, id: Uuid) -> Result<Option<MatchModel>> {
    let m: Option<MatchModel> = sqlx::query_as(r#"SELECT * FROM partidos WHERE id = $1"#)
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(|e| anyhow!("Unable to query match from db: {}", e))?;

    Ok(m)
}

pub async fn crud_get_matches_by_organizer(
    db: &Pool<Postgres>,
    organizer_id: &str,
) -> Result<Vec<MatchModel>> {
    let matches: Vec<MatchModel> = sqlx::query_as(
        r#"
        SELECT * FROM partidos
        WHERE organizer_id = $1
        ORDER BY scheduled_at DESC
        "#,
    )
    .bind(organizer_id)
    .fetch_all(db)
    .await
    .map_err(|e| anyhow!("Unable to query organizer matches from db: {}", e))?;

    Ok(matches)
}

pub async fn crud_update_match_status(
    db: &Pool<Postgres>,
    id: Uuid,
    status: MatchStatus,
) -> Result<MatchModel> {
    let m: MatchModel = sqlx::query_as(
        r#"UPDATE partidos SET (status, updated_at) = ($2, NOW()) WHERE id = $1 RETURNING *"#,
    )
    .bind(id)
    .bind(status)
    .fetch_one(db)
    .await
    .map_err(|e| anyhow!("Unable to update match status in db: {}", e))?;

    Ok(m)
}

/// Appends a pending application. Neither duplicates nor free slots are
/// checked, and the match is not required to exist.
pub async fn crud_create_application(
    db: &Pool<Postgres>,
    match_id: Uuid,
    data: &ApplySchema,
) -> Result<ApplicationModel> {
    let id = Uuid::new_v4();

    let a: ApplicationModel = query_as(
        r#"
        INSERT INTO applications (id, match_id, player_id, player_name, player_email, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(match_id)
    .bind(&data.player_id)
    .bind(&data.player_name)
    .bind(&data.player_email)
    .bind(ApplicationStatus::Pending)
    .fetch_one(db)
    .await
    .map_err(|e| anyhow!("Unable to insert application into db: {}", e))?;

    Ok(a)
}

pub async fn crud_get_match_applications(
    db: &Pool<Postgres>,
    match_id: Uuid,
) -> Result<Vec<ApplicationModel>> {
    let applications: Vec<ApplicationModel> = sqlx::query_as(
        r#"SELECT * FROM applications WHERE match_id = $1 ORDER BY applied_at DESC"#,
    )
    .bind(match_id)
    .fetch_all(db)
    .await
    .map_err(|e| anyhow!("Unable to query match applications from db: {}", e))?;

    Ok(applications)
}

pub async fn crud_get_player_applications(
    db: &Pool<Postgres>,
    player_id: &str,
) -> Result<Vec<ApplicationModel>> {
    let applications: Vec<ApplicationModel> = sqlx::query_as(
        r#"SELECT * FROM applications WHERE player_id = $1 ORDER BY applied_at DESC"#,
    )
    .bind(player_id)
    .fetch_all(db)
    .await
    .map_err(|e| anyhow!("Unable to query player applications from db: {}", e))?;

    Ok(applications)
}

pub async fn crud_get_application(
    db: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<ApplicationModel>> {
    let a: Option<ApplicationModel> = sqlx::query_as(r#"SELECT * FROM applications WHERE id = $1"#)
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(|e| anyhow!("Unable to query application from db: {}", e))?;

    Ok(a)
}

pub async fn crud_update_application_status(
    db: &Pool<Postgres>,
    id: Uuid,
    status: ApplicationStatus,
) -> Result<ApplicationModel> {
    let a: ApplicationModel =
        sqlx::query_as(r#"UPDATE applications SET status = $2 WHERE id = $1 RETURNING *"#)
            .bind(id)
            .bind(status)
            .fetch_one(db)
            .await
            .map_err(|e| anyhow!("Unable to update application status in db: {}", e))?;

    Ok(a)
}
