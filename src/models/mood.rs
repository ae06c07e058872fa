use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::patch::Patch;
use crate::models::user::{Gender, OwnerSummary};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Mood {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub mood: MoodKind,
    pub message: Option<String>,
    pub gender: Gender,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "mood_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MoodKind {
    Happy,
    Loved,
    Sad,
    Excited,
    Tired,
    Angry,
    Anxious,
    Grateful,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMoodRequest {
    pub mood: MoodKind,
    #[validate(length(max = 500, message = "Message must be under 500 characters"))]
    pub message: Option<String>,
    pub gender: Gender,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMoodRequest {
    #[serde(default)]
    pub mood: Patch<MoodKind>,
    #[serde(default)]
    pub message: Patch<String>,
}

/// List/create response: the mood plus its owner's public profile.
#[derive(Debug, Serialize)]
pub struct MoodWithOwner {
    #[serde(flatten)]
    pub mood: Mood,
    pub owner: Option<OwnerSummary>,
}

/// Row shape for the owner-join queries.
#[derive(Debug, FromRow)]
pub struct MoodOwnerRow {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub mood: MoodKind,
    pub message: Option<String>,
    pub gender: Gender,
    pub created_at: DateTime<Utc>,
    pub owner_name: Option<String>,
    pub owner_gender: Option<Gender>,
}

impl From<MoodOwnerRow> for MoodWithOwner {
    fn from(row: MoodOwnerRow) -> Self {
        let owner = match (row.owner_id, row.owner_name, row.owner_gender) {
            (Some(id), Some(name), Some(gender)) => Some(OwnerSummary { id, name, gender }),
            _ => None,
        };
        Self {
            mood: Mood {
                id: row.id,
                owner_id: row.owner_id,
                mood: row.mood,
                message: row.message,
                gender: row.gender,
                created_at: row.created_at,
            },
            owner,
        }
    }
}
