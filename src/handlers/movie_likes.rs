use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::error::{conflict_on_unique, AppError, AppResult};
use crate::handlers::{check, AppJson};
use crate::models::movie_like::{
    CreateMovieLikeRequest, MovieLike, MovieLikeQuery, UnlikeRequest, UpdateMovieLikeRequest,
};
use crate::models::stamp_once;
use crate::AppState;

pub async fn list_movie_likes(
    State(state): State<AppState>,
    Query(query): Query<MovieLikeQuery>,
) -> AppResult<Json<Vec<MovieLike>>> {
    let likes = sqlx::query_as::<_, MovieLike>(
        r#"
        SELECT * FROM movie_likes
        WHERE ($1::gender IS NULL OR gender = $1)
        ORDER BY created_at DESC
        "#,
    )
    .bind(query.gender)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(likes))
}

pub async fn create_movie_like(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateMovieLikeRequest>,
) -> AppResult<(StatusCode, Json<MovieLike>)> {
    check(&body)?;

    let like = sqlx::query_as::<_, MovieLike>(
        r#"
        INSERT INTO movie_likes (id, gender, movie_id, title, media, poster_path, overview, rating)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(body.gender)
    .bind(body.movie_id)
    .bind(&body.title)
    .bind(body.media)
    .bind(&body.poster_path)
    .bind(&body.overview)
    .bind(body.rating)
    .fetch_one(&state.db)
    .await
    .map_err(|e| conflict_on_unique(e, "Movie already liked"))?;

    Ok((StatusCode::CREATED, Json(like)))
}

pub async fn update_movie_like(
    State(state): State<AppState>,
    Path(like_id): Path<Uuid>,
    AppJson(body): AppJson<UpdateMovieLikeRequest>,
) -> AppResult<Json<MovieLike>> {
    let existing = sqlx::query_as::<_, MovieLike>("SELECT * FROM movie_likes WHERE id = $1")
        .bind(like_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Movie like not found".into()))?;

    let poster_path = body.poster_path.apply(existing.poster_path);
    let overview = body.overview.apply(existing.overview);
    let rating = body.rating.apply(existing.rating);
    let watched = body
        .watched
        .apply_required(existing.watched, "watched")
        .map_err(AppError::Validation)?;

    // watched_date is write-once, same rule as wishlist completion.
    let watched_date = stamp_once(watched, existing.watched_date, Utc::now());

    let updated = sqlx::query_as::<_, MovieLike>(
        r#"
        UPDATE movie_likes
        SET poster_path = $2, overview = $3, rating = $4, watched = $5, watched_date = $6
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(like_id)
    .bind(&poster_path)
    .bind(&overview)
    .bind(rating)
    .bind(watched)
    .bind(watched_date)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(updated))
}

/// POST /api/movie-likes/unlike — delete by the external (movie_id, media)
/// key rather than our row id, matching how the browser knows the movie.
pub async fn unlike_movie(
    State(state): State<AppState>,
    AppJson(body): AppJson<UnlikeRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM movie_likes WHERE movie_id = $1 AND media = $2")
        .bind(body.movie_id)
        .bind(body.media)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Movie like not found".into()));
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}
