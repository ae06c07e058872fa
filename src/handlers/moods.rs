use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::identity::{require_owner, AuthUser};
use crate::error::{AppError, AppResult};
use crate::handlers::{check, partner_of, AppJson};
use crate::models::mood::{
    CreateMoodRequest, Mood, MoodOwnerRow, MoodWithOwner, UpdateMoodRequest,
};
use crate::AppState;

const MOOD_COLUMNS: &str =
    "m.id, m.owner_id, m.mood, m.message, m.gender, m.created_at, \
     u.name AS owner_name, u.gender AS owner_gender";

pub async fn list_moods(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<MoodWithOwner>>> {
    let partner_id = partner_of(&state.db, auth_user.id).await?;

    let rows = sqlx::query_as::<_, MoodOwnerRow>(&format!(
        r#"
        SELECT {MOOD_COLUMNS}
        FROM moods m
        LEFT JOIN users u ON u.id = m.owner_id
        WHERE m.owner_id = $1 OR m.owner_id = $2
        ORDER BY m.created_at DESC
        "#
    ))
    .bind(auth_user.id)
    .bind(partner_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows.into_iter().map(MoodWithOwner::from).collect()))
}

pub async fn create_mood(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<CreateMoodRequest>,
) -> AppResult<(StatusCode, Json<MoodWithOwner>)> {
    check(&body)?;

    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO moods (id, owner_id, mood, message, gender)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(auth_user.id)
    .bind(body.mood)
    .bind(&body.message)
    .bind(body.gender)
    .execute(&state.db)
    .await?;

    let row = sqlx::query_as::<_, MoodOwnerRow>(&format!(
        r#"
        SELECT {MOOD_COLUMNS}
        FROM moods m
        LEFT JOIN users u ON u.id = m.owner_id
        WHERE m.id = $1
        "#
    ))
    .bind(id)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(row.into())))
}

pub async fn update_mood(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(mood_id): Path<Uuid>,
    AppJson(body): AppJson<UpdateMoodRequest>,
) -> AppResult<Json<Mood>> {
    let existing = sqlx::query_as::<_, Mood>("SELECT * FROM moods WHERE id = $1")
        .bind(mood_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Mood not found".into()))?;

    require_owner(existing.owner_id, auth_user.id)?;

    let mood = body
        .mood
        .apply_required(existing.mood, "mood")
        .map_err(AppError::Validation)?;
    let message = body.message.apply(existing.message);

    if let Some(msg) = &message {
        if msg.chars().count() > 500 {
            return Err(AppError::Validation(
                "Message must be under 500 characters".into(),
            ));
        }
    }

    let updated = sqlx::query_as::<_, Mood>(
        r#"
        UPDATE moods SET mood = $2, message = $3
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(mood_id)
    .bind(mood)
    .bind(&message)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(updated))
}

pub async fn delete_mood(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(mood_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let existing = sqlx::query_as::<_, Mood>("SELECT * FROM moods WHERE id = $1")
        .bind(mood_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Mood not found".into()))?;

    require_owner(existing.owner_id, auth_user.id)?;

    sqlx::query("DELETE FROM moods WHERE id = $1")
        .bind(mood_id)
        .execute(&state.db)
        .await?;

    Ok(Json(serde_json::json!({ "deleted": true })))
}
