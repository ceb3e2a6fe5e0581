/// Moderation audit trail
///
/// Every moderator or admin decision writes one row. `course_id` is NULL for
/// bans and for deletions (the course row no longer exists), in which case
/// `target_user_id` and `reason` carry the context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Kind of moderation decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "moderation_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    Approved,
    Rejected,
    EditApproved,
    EditRejected,
    CourseDeleted,
    UserBanned,
}

impl ModerationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationAction::Approved => "approved",
            ModerationAction::Rejected => "rejected",
            ModerationAction::EditApproved => "edit_approved",
            ModerationAction::EditRejected => "edit_rejected",
            ModerationAction::CourseDeleted => "course_deleted",
            ModerationAction::UserBanned => "user_banned",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ModerationLog {
    pub id: Uuid,
    pub course_id: Option<Uuid>,
    pub target_user_id: Option<Uuid>,
    pub moderator_id: Uuid,
    pub action: ModerationAction,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for a new log row
#[derive(Debug, Clone)]
pub struct CreateModerationLog {
    pub course_id: Option<Uuid>,
    pub target_user_id: Option<Uuid>,
    pub moderator_id: Uuid,
    pub action: ModerationAction,
    pub reason: Option<String>,
}

const LOG_COLUMNS: &str =
    "id, course_id, target_user_id, moderator_id, action, reason, created_at";

impl ModerationLog {
    pub async fn create(pool: &PgPool, data: CreateModerationLog) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO moderation_logs (course_id, target_user_id, moderator_id, action, reason)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            LOG_COLUMNS
        );

        sqlx::query_as::<_, ModerationLog>(&query)
            .bind(data.course_id)
            .bind(data.target_user_id)
            .bind(data.moderator_id)
            .bind(data.action)
            .bind(data.reason)
            .fetch_one(pool)
            .await
    }

    /// Most recent entries first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM moderation_logs ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            LOG_COLUMNS
        );

        sqlx::query_as::<_, ModerationLog>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn list_for_course(pool: &PgPool, course_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM moderation_logs WHERE course_id = $1 ORDER BY created_at ASC",
            LOG_COLUMNS
        );

        sqlx::query_as::<_, ModerationLog>(&query)
            .bind(course_id)
            .fetch_all(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_serializes_like_the_enum_type() {
        for action in [
            ModerationAction::Approved,
            ModerationAction::EditRejected,
            ModerationAction::UserBanned,
        ] {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action.as_str()));
        }
    }
}
