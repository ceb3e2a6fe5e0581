/// Forum topics, replies and their reports
///
/// Removing a topic or reply touches several tables and lives in
/// [`crate::cascade::forum`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ForumTopic {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Topic as listed on the forum index
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TopicListing {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_username: Option<String>,
    pub title: String,
    pub body: String,
    pub reply_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ForumReply {
    pub id: Uuid,
    pub topic_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReplyWithAuthor {
    pub id: Uuid,
    pub topic_id: Uuid,
    pub author_id: Uuid,
    pub author_username: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Which kind of forum post a report targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForumTarget {
    Topic,
    Reply,
}

impl ForumTarget {
    fn report_table(&self) -> &'static str {
        match self {
            ForumTarget::Topic => "forum_topic_reports",
            ForumTarget::Reply => "forum_reply_reports",
        }
    }

    fn target_column(&self) -> &'static str {
        match self {
            ForumTarget::Topic => "topic_id",
            ForumTarget::Reply => "reply_id",
        }
    }
}

/// A topic or reply report, flattened for the moderation queue
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ForumReport {
    pub id: Uuid,
    pub target_id: Uuid,
    pub reporter_id: Uuid,
    pub reason: String,
    pub excerpt: String,
    pub created_at: DateTime<Utc>,
}

/// Both report queues
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumReports {
    pub topics: Vec<ForumReport>,
    pub replies: Vec<ForumReport>,
}

impl ForumTopic {
    pub async fn create(
        pool: &PgPool,
        author_id: Uuid,
        title: &str,
        body: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ForumTopic>(
            r#"
            INSERT INTO forum_topics (author_id, title, body)
            VALUES ($1, $2, $3)
            RETURNING id, author_id, title, body, created_at, updated_at
            "#,
        )
        .bind(author_id)
        .bind(title.trim())
        .bind(body.trim())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ForumTopic>(
            "SELECT id, author_id, title, body, created_at, updated_at FROM forum_topics WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Topics with reply counts, newest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<TopicListing>, sqlx::Error> {
        sqlx::query_as::<_, TopicListing>(
            r#"
            SELECT t.id, t.author_id, p.username AS author_username, t.title, t.body,
                   (SELECT COUNT(*) FROM forum_replies r WHERE r.topic_id = t.id) AS reply_count,
                   t.created_at
            FROM forum_topics t
            LEFT JOIN profiles p ON p.user_id = t.author_id
            ORDER BY t.created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn replies(pool: &PgPool, topic_id: Uuid) -> Result<Vec<ReplyWithAuthor>, sqlx::Error> {
        sqlx::query_as::<_, ReplyWithAuthor>(
            r#"
            SELECT r.id, r.topic_id, r.author_id, p.username AS author_username, r.body, r.created_at
            FROM forum_replies r
            LEFT JOIN profiles p ON p.user_id = r.author_id
            WHERE r.topic_id = $1
            ORDER BY r.created_at ASC
            "#,
        )
        .bind(topic_id)
        .fetch_all(pool)
        .await
    }
}

impl ForumReply {
    pub async fn create(
        pool: &PgPool,
        topic_id: Uuid,
        author_id: Uuid,
        body: &str,
    ) -> Result<Self, sqlx::Error> {
        let reply = sqlx::query_as::<_, ForumReply>(
            r#"
            INSERT INTO forum_replies (topic_id, author_id, body)
            VALUES ($1, $2, $3)
            RETURNING id, topic_id, author_id, body, created_at
            "#,
        )
        .bind(topic_id)
        .bind(author_id)
        .bind(body.trim())
        .fetch_one(pool)
        .await?;

        // Bumps the topic on the index
        sqlx::query("UPDATE forum_topics SET updated_at = NOW() WHERE id = $1")
            .bind(topic_id)
            .execute(pool)
            .await?;

        Ok(reply)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ForumReply>(
            "SELECT id, topic_id, author_id, body, created_at FROM forum_replies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

/// Files a report against a topic or reply
pub async fn report(
    pool: &PgPool,
    target: ForumTarget,
    target_id: Uuid,
    reporter_id: Uuid,
    reason: &str,
) -> Result<Uuid, sqlx::Error> {
    let query = format!(
        "INSERT INTO {} ({}, reporter_id, reason) VALUES ($1, $2, $3) RETURNING id",
        target.report_table(),
        target.target_column()
    );

    sqlx::query_scalar(&query)
        .bind(target_id)
        .bind(reporter_id)
        .bind(reason.trim())
        .fetch_one(pool)
        .await
}

/// Open reports of both kinds, oldest first
pub async fn list_reports(pool: &PgPool) -> Result<ForumReports, sqlx::Error> {
    let topics = sqlx::query_as::<_, ForumReport>(
        r#"
        SELECT r.id, r.topic_id AS target_id, r.reporter_id, r.reason,
               LEFT(t.title, 140) AS excerpt, r.created_at
        FROM forum_topic_reports r
        JOIN forum_topics t ON t.id = r.topic_id
        ORDER BY r.created_at ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let replies = sqlx::query_as::<_, ForumReport>(
        r#"
        SELECT r.id, r.reply_id AS target_id, r.reporter_id, r.reason,
               LEFT(p.body, 140) AS excerpt, r.created_at
        FROM forum_reply_reports r
        JOIN forum_replies p ON p.id = r.reply_id
        ORDER BY r.created_at ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(ForumReports { topics, replies })
}

/// Dismisses one report without touching the reported post
pub async fn dismiss_report(pool: &PgPool, target: ForumTarget, report_id: Uuid) -> Result<bool, sqlx::Error> {
    let query = format!("DELETE FROM {} WHERE id = $1", target.report_table());

    let result = sqlx::query(&query).bind(report_id).execute(pool).await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_tables_match_targets() {
        assert_eq!(ForumTarget::Topic.report_table(), "forum_topic_reports");
        assert_eq!(ForumTarget::Topic.target_column(), "topic_id");
        assert_eq!(ForumTarget::Reply.report_table(), "forum_reply_reports");
        assert_eq!(ForumTarget::Reply.target_column(), "reply_id");
    }
}
