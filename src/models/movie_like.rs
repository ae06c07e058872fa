use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::patch::Patch;
use crate::models::user::Gender;

/// A liked movie or TV show, keyed by its external (TMDB-style) id.
/// Unique per (movie_id, media).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MovieLike {
    pub id: Uuid,
    pub gender: Gender,
    pub movie_id: i64,
    pub title: String,
    pub media: MediaKind,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
    pub rating: Option<f64>,
    pub watched: bool,
    /// Stamped the first time `watched` flips true, then immutable.
    pub watched_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "media_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Tv,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMovieLikeRequest {
    #[validate(range(min = 1, message = "movie_id must be positive"))]
    pub movie_id: i64,
    #[validate(length(min = 1, max = 300, message = "Title must be 1-300 characters"))]
    pub title: String,
    pub media: MediaKind,
    pub gender: Gender,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
    #[validate(range(min = 0.0, max = 10.0, message = "Rating must be 0-10"))]
    pub rating: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMovieLikeRequest {
    #[serde(default)]
    pub poster_path: Patch<String>,
    #[serde(default)]
    pub overview: Patch<String>,
    #[serde(default)]
    pub rating: Patch<f64>,
    #[serde(default)]
    pub watched: Patch<bool>,
}

/// POST /api/movie-likes/unlike
#[derive(Debug, Deserialize)]
pub struct UnlikeRequest {
    pub movie_id: i64,
    pub media: MediaKind,
}

#[derive(Debug, Deserialize)]
pub struct MovieLikeQuery {
    pub gender: Option<Gender>,
}
