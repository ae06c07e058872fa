use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::identity::{require_owner, AuthUser};
use crate::error::{AppError, AppResult};
use crate::handlers::{check, partner_of, AppJson};
use crate::models::song::{CreateSongRequest, Song, UpdateSongRequest};
use crate::AppState;

pub async fn list_songs(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<Song>>> {
    let partner_id = partner_of(&state.db, auth_user.id).await?;

    let songs = sqlx::query_as::<_, Song>(
        r#"
        SELECT * FROM songs
        WHERE owner_id = $1 OR owner_id = $2
        ORDER BY created_at DESC
        "#,
    )
    .bind(auth_user.id)
    .bind(partner_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(songs))
}

pub async fn create_song(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<CreateSongRequest>,
) -> AppResult<(StatusCode, Json<Song>)> {
    check(&body)?;

    let song = sqlx::query_as::<_, Song>(
        r#"
        INSERT INTO songs (id, owner_id, title, artist, story, url)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(&body.title)
    .bind(&body.artist)
    .bind(&body.story)
    .bind(&body.url)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(song)))
}

pub async fn update_song(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(song_id): Path<Uuid>,
    AppJson(body): AppJson<UpdateSongRequest>,
) -> AppResult<Json<Song>> {
    let existing = sqlx::query_as::<_, Song>("SELECT * FROM songs WHERE id = $1")
        .bind(song_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Song not found".into()))?;

    require_owner(existing.owner_id, auth_user.id)?;

    let title = body
        .title
        .apply_required(existing.title, "title")
        .map_err(AppError::Validation)?;
    let artist = body
        .artist
        .apply_required(existing.artist, "artist")
        .map_err(AppError::Validation)?;
    let story = body.story.apply(existing.story);
    let url = body.url.apply(existing.url);

    let updated = sqlx::query_as::<_, Song>(
        r#"
        UPDATE songs SET title = $2, artist = $3, story = $4, url = $5
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(song_id)
    .bind(&title)
    .bind(&artist)
    .bind(&story)
    .bind(&url)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(updated))
}

pub async fn delete_song(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(song_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let existing = sqlx::query_as::<_, Song>("SELECT * FROM songs WHERE id = $1")
        .bind(song_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Song not found".into()))?;

    require_owner(existing.owner_id, auth_user.id)?;

    sqlx::query("DELETE FROM songs WHERE id = $1")
        .bind(song_id)
        .execute(&state.db)
        .await?;

    Ok(Json(serde_json::json!({ "deleted": true })))
}
