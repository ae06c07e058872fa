use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::patch::Patch;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Surprise {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub message: String,
    pub kind: SurpriseKind,
    pub schedule: ScheduleKind,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub delivered: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "surprise_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SurpriseKind {
    LoveNote,
    Gift,
    Activity,
    Memory,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "schedule_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ScheduleKind {
    Immediate,
    Scheduled,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSurpriseRequest {
    #[validate(length(min = 1, max = 2000, message = "Message must be 1-2000 characters"))]
    pub message: String,
    pub kind: SurpriseKind,
    pub schedule: Option<ScheduleKind>,
    pub scheduled_for: Option<DateTime<Utc>>,
}

impl CreateSurpriseRequest {
    /// Scheduled surprises need a time; immediate ones must not carry one.
    pub fn validate_schedule(&self) -> Result<ScheduleKind, String> {
        let schedule = self.schedule.unwrap_or(ScheduleKind::Immediate);
        match schedule {
            ScheduleKind::Scheduled if self.scheduled_for.is_none() => {
                Err("scheduled_for is required for scheduled surprises".into())
            }
            ScheduleKind::Immediate if self.scheduled_for.is_some() => {
                Err("scheduled_for is only valid for scheduled surprises".into())
            }
            s => Ok(s),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateSurpriseRequest {
    #[serde(default)]
    pub message: Patch<String>,
    #[serde(default)]
    pub kind: Patch<SurpriseKind>,
    #[serde(default)]
    pub scheduled_for: Patch<DateTime<Utc>>,
    #[serde(default)]
    pub delivered: Patch<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduled_requires_time() {
        let req = CreateSurpriseRequest {
            message: "hi".into(),
            kind: SurpriseKind::Gift,
            schedule: Some(ScheduleKind::Scheduled),
            scheduled_for: None,
        };
        assert!(req.validate_schedule().is_err());
    }

    #[test]
    fn immediate_rejects_time() {
        let req = CreateSurpriseRequest {
            message: "hi".into(),
            kind: SurpriseKind::LoveNote,
            schedule: None,
            scheduled_for: Some(Utc::now()),
        };
        assert!(req.validate_schedule().is_err());
    }

    #[test]
    fn defaults_to_immediate() {
        let req = CreateSurpriseRequest {
            message: "hi".into(),
            kind: SurpriseKind::Memory,
            schedule: None,
            scheduled_for: None,
        };
        assert_eq!(req.validate_schedule().unwrap(), ScheduleKind::Immediate);
    }
}
