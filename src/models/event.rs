use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::patch::Patch;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub channel_id: String,
    pub title: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub event_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 100, message = "channel_id must be 1-100 characters"))]
    pub channel_id: String,
    #[validate(length(max = 2000, message = "Description must be under 2000 characters"))]
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub event_time: Option<NaiveTime>,
    #[validate(length(max = 300, message = "Location must be under 300 characters"))]
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub event_date: Patch<NaiveDate>,
    #[serde(default)]
    pub event_time: Patch<NaiveTime>,
    #[serde(default)]
    pub location: Patch<String>,
}

#[derive(Debug, Deserialize)]
pub struct EventQuery {
    pub channel_id: Option<String>,
}
