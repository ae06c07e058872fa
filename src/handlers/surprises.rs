use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::identity::{require_owner, AuthUser};
use crate::error::{AppError, AppResult};
use crate::handlers::{check, partner_of, AppJson};
use crate::models::surprise::{CreateSurpriseRequest, Surprise, UpdateSurpriseRequest};
use crate::AppState;

pub async fn list_surprises(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<Surprise>>> {
    let partner_id = partner_of(&state.db, auth_user.id).await?;

    let surprises = sqlx::query_as::<_, Surprise>(
        r#"
        SELECT * FROM surprises
        WHERE owner_id = $1 OR owner_id = $2
        ORDER BY created_at DESC
        "#,
    )
    .bind(auth_user.id)
    .bind(partner_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(surprises))
}

pub async fn create_surprise(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<CreateSurpriseRequest>,
) -> AppResult<(StatusCode, Json<Surprise>)> {
    check(&body)?;
    let schedule = body.validate_schedule().map_err(AppError::Validation)?;

    let surprise = sqlx::query_as::<_, Surprise>(
        r#"
        INSERT INTO surprises (id, owner_id, message, kind, schedule, scheduled_for)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(&body.message)
    .bind(body.kind)
    .bind(schedule)
    .bind(body.scheduled_for)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(surprise)))
}

pub async fn update_surprise(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(surprise_id): Path<Uuid>,
    AppJson(body): AppJson<UpdateSurpriseRequest>,
) -> AppResult<Json<Surprise>> {
    let existing = sqlx::query_as::<_, Surprise>("SELECT * FROM surprises WHERE id = $1")
        .bind(surprise_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Surprise not found".into()))?;

    require_owner(Some(existing.owner_id), auth_user.id)?;

    let message = body
        .message
        .apply_required(existing.message, "message")
        .map_err(AppError::Validation)?;
    let kind = body
        .kind
        .apply_required(existing.kind, "kind")
        .map_err(AppError::Validation)?;
    let scheduled_for = body.scheduled_for.apply(existing.scheduled_for);
    let delivered = body
        .delivered
        .apply_required(existing.delivered, "delivered")
        .map_err(AppError::Validation)?;

    let updated = sqlx::query_as::<_, Surprise>(
        r#"
        UPDATE surprises
        SET message = $2, kind = $3, scheduled_for = $4, delivered = $5
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(surprise_id)
    .bind(&message)
    .bind(kind)
    .bind(scheduled_for)
    .bind(delivered)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(updated))
}

pub async fn delete_surprise(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(surprise_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let existing = sqlx::query_as::<_, Surprise>("SELECT * FROM surprises WHERE id = $1")
        .bind(surprise_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Surprise not found".into()))?;

    require_owner(Some(existing.owner_id), auth_user.id)?;

    sqlx::query("DELETE FROM surprises WHERE id = $1")
        .bind(surprise_id)
        .execute(&state.db)
        .await?;

    Ok(Json(serde_json::json!({ "deleted": true })))
}
