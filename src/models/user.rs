use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub name: String,
    pub gender: Gender,
    pub partner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "gender", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
}

/// Public fields safe to denormalize onto other resources.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OwnerSummary {
    pub id: Uuid,
    pub name: String,
    pub gender: Gender,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub gender: Gender,
    pub partner: Option<OwnerSummary>,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn from_user(user: User, partner: Option<OwnerSummary>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            gender: user.gender,
            partner,
            created_at: user.created_at,
        }
    }
}
