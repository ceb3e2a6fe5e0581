/// Forum endpoints
///
/// Topics and replies are removed through the forum cascade so their
/// reports go first. Authors remove their own posts; staff remove anyone's.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{non_blank, Pagination},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use coursehub_shared::{
    auth::{authorization::require_owner_or_staff, middleware::AuthContext},
    cascade::{remove_reply, remove_topic, CascadeReport},
    models::forum::{self, ForumReply, ForumTarget, ForumTopic, ReplyWithAuthor, TopicListing},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTopicRequest {
    #[validate(length(min = 3, max = 200, message = "Title must be 3-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 10000, message = "Body must be 1-10000 characters"))]
    pub body: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReplyRequest {
    #[validate(length(min = 1, max = 10000, message = "Body must be 1-10000 characters"))]
    pub body: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForumReportRequest {
    #[validate(
        length(min = 1, max = 1000, message = "Reason must be 1-1000 characters"),
        custom(function = "non_blank")
    )]
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct TopicThread {
    pub topic: ForumTopic,
    pub replies: Vec<ReplyWithAuthor>,
}

#[derive(Debug, Serialize)]
pub struct ReportCreated {
    pub id: Uuid,
}

async fn find_topic(state: &AppState, topic_id: Uuid) -> ApiResult<ForumTopic> {
    ForumTopic::find_by_id(&state.db, topic_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Topic not found".to_string()))
}

async fn find_reply(state: &AppState, reply_id: Uuid) -> ApiResult<ForumReply> {
    ForumReply::find_by_id(&state.db, reply_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Reply not found".to_string()))
}

pub async fn list_topics(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<TopicListing>>> {
    let (limit, offset) = page.bounds();
    Ok(Json(ForumTopic::list(&state.db, limit, offset).await?))
}

pub async fn create_topic(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateTopicRequest>,
) -> ApiResult<(StatusCode, Json<ForumTopic>)> {
    req.validate()?;
    let topic = ForumTopic::create(&state.db, auth.user_id, &req.title, &req.body).await?;
    Ok((StatusCode::CREATED, Json(topic)))
}

pub async fn get_topic(State(state): State<AppState>, Path(topic_id): Path<Uuid>) -> ApiResult<Json<TopicThread>> {
    let topic = find_topic(&state, topic_id).await?;
    let replies = ForumTopic::replies(&state.db, topic.id).await?;
    Ok(Json(TopicThread { topic, replies }))
}

pub async fn delete_topic(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(topic_id): Path<Uuid>,
) -> ApiResult<Json<CascadeReport>> {
    let topic = find_topic(&state, topic_id).await?;
    if require_owner_or_staff(&state.db, auth.user_id, topic.author_id).await? {
        info!(%topic_id, moderator_id = %auth.user_id, "Topic removed by staff");
    }
    Ok(Json(remove_topic(&state.db, topic.id).await?))
}

pub async fn create_reply(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(topic_id): Path<Uuid>,
    Json(req): Json<CreateReplyRequest>,
) -> ApiResult<(StatusCode, Json<ForumReply>)> {
    req.validate()?;
    let topic = find_topic(&state, topic_id).await?;
    let reply = ForumReply::create(&state.db, topic.id, auth.user_id, &req.body).await?;
    Ok((StatusCode::CREATED, Json(reply)))
}

pub async fn delete_reply(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(reply_id): Path<Uuid>,
) -> ApiResult<Json<CascadeReport>> {
    let reply = find_reply(&state, reply_id).await?;
    if require_owner_or_staff(&state.db, auth.user_id, reply.author_id).await? {
        info!(%reply_id, moderator_id = %auth.user_id, "Reply removed by staff");
    }
    Ok(Json(remove_reply(&state.db, reply.id).await?))
}

async fn file_report(
    state: &AppState,
    auth: AuthContext,
    target: ForumTarget,
    target_id: Uuid,
    req: ForumReportRequest,
) -> ApiResult<(StatusCode, Json<ReportCreated>)> {
    req.validate()?;
    let id = forum::report(&state.db, target, target_id, auth.user_id, &req.reason).await?;
    Ok((StatusCode::CREATED, Json(ReportCreated { id })))
}

pub async fn report_topic(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(topic_id): Path<Uuid>,
    Json(req): Json<ForumReportRequest>,
) -> ApiResult<(StatusCode, Json<ReportCreated>)> {
    let topic = find_topic(&state, topic_id).await?;
    file_report(&state, auth, ForumTarget::Topic, topic.id, req).await
}

pub async fn report_reply(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(reply_id): Path<Uuid>,
    Json(req): Json<ForumReportRequest>,
) -> ApiResult<(StatusCode, Json<ReportCreated>)> {
    let reply = find_reply(&state, reply_id).await?;
    file_report(&state, auth, ForumTarget::Reply, reply.id, req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forum_report_reason_rules() {
        let report = |reason: &str| ForumReportRequest {
            reason: reason.to_string(),
        };
        assert!(report("Off-topic advertising").validate().is_ok());
        assert!(report("").validate().is_err());
        assert!(report("   ").validate().is_err());
        assert!(report(&"x".repeat(1001)).validate().is_err());
    }
}
