use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::patch::Patch;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Song {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub title: String,
    pub artist: String,
    /// Why this song matters to us.
    pub story: Option<String>,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSongRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 200, message = "Artist must be 1-200 characters"))]
    pub artist: String,
    #[validate(length(max = 2000, message = "Story must be under 2000 characters"))]
    pub story: Option<String>,
    #[validate(url(message = "url must be a valid URL"))]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSongRequest {
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub artist: Patch<String>,
    #[serde(default)]
    pub story: Patch<String>,
    #[serde(default)]
    pub url: Patch<String>,
}
