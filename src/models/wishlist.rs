use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::patch::Patch;
use crate::models::task::Priority;
use crate::models::user::Gender;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WishlistItem {
    pub id: Uuid,
    pub gender: Gender,
    pub title: String,
    pub category: WishCategory,
    pub description: Option<String>,
    pub priority: Priority,
    pub completed: bool,
    /// Stamped the first time `completed` flips true, then immutable.
    pub completed_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "wish_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WishCategory {
    Restaurants,
    Travel,
    Activities,
    Gifts,
    Other,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWishlistRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    pub category: WishCategory,
    pub gender: Gender,
    #[validate(length(max = 2000, message = "Description must be under 2000 characters"))]
    pub description: Option<String>,
    pub priority: Option<Priority>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWishlistRequest {
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub category: Patch<WishCategory>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub priority: Patch<Priority>,
    #[serde(default)]
    pub completed: Patch<bool>,
}

#[derive(Debug, Deserialize)]
pub struct WishlistQuery {
    pub gender: Option<Gender>,
}
