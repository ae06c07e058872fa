use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::identity::{require_owner, AuthUser};
use crate::error::{AppError, AppResult};
use crate::handlers::{check, partner_of, AppJson};
use crate::models::event::{CreateEventRequest, Event, EventQuery, UpdateEventRequest};
use crate::AppState;

pub async fn list_events(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<EventQuery>,
) -> AppResult<Json<Vec<Event>>> {
    let partner_id = partner_of(&state.db, auth_user.id).await?;

    let events = sqlx::query_as::<_, Event>(
        r#"
        SELECT * FROM events
        WHERE (owner_id = $1 OR owner_id = $2)
          AND ($3::text IS NULL OR channel_id = $3)
        ORDER BY event_date ASC, event_time ASC NULLS LAST
        "#,
    )
    .bind(auth_user.id)
    .bind(partner_id)
    .bind(&query.channel_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(events))
}

pub async fn create_event(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<CreateEventRequest>,
) -> AppResult<(StatusCode, Json<Event>)> {
    check(&body)?;

    let event = sqlx::query_as::<_, Event>(
        r#"
        INSERT INTO events (id, owner_id, channel_id, title, description, event_date, event_time, location)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(&body.channel_id)
    .bind(&body.title)
    .bind(&body.description)
    .bind(body.event_date)
    .bind(body.event_time)
    .bind(&body.location)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn update_event(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(event_id): Path<Uuid>,
    AppJson(body): AppJson<UpdateEventRequest>,
) -> AppResult<Json<Event>> {
    let existing = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
        .bind(event_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Event not found".into()))?;

    require_owner(Some(existing.owner_id), auth_user.id)?;

    let title = body
        .title
        .apply_required(existing.title, "title")
        .map_err(AppError::Validation)?;
    let description = body.description.apply(existing.description);
    let event_date = body
        .event_date
        .apply_required(existing.event_date, "event_date")
        .map_err(AppError::Validation)?;
    let event_time = body.event_time.apply(existing.event_time);
    let location = body.location.apply(existing.location);

    let updated = sqlx::query_as::<_, Event>(
        r#"
        UPDATE events
        SET title = $2, description = $3, event_date = $4, event_time = $5, location = $6
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(event_id)
    .bind(&title)
    .bind(&description)
    .bind(event_date)
    .bind(event_time)
    .bind(&location)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(updated))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(event_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let existing = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
        .bind(event_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Event not found".into()))?;

    require_owner(Some(existing.owner_id), auth_user.id)?;

    sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(event_id)
        .execute(&state.db)
        .await?;

    Ok(Json(serde_json::json!({ "deleted": true })))
}
