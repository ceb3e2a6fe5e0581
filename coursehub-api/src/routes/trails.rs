/// Learning trail endpoints
///
/// A trail is an ordered list of courses. Public trails are readable by
/// anyone; private trails and every change are limited to the owner.
/// Positions stay dense (`0..n`) after adds, removals and reorders.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{courses::visible_course, Pagination},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use coursehub_shared::{
    auth::middleware::AuthContext,
    models::{
        course::CourseStatus,
        trail::{CreateTrail, LearningTrail, TrailEntry, TrailListing, UpdateTrail},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTrailRequest {
    #[validate(length(min = 3, max = 200, message = "Title must be 3-200 characters"))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

/// `description: ""` clears the description
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTrailRequest {
    #[validate(length(min = 3, max = 200, message = "Title must be 3-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub is_public: Option<bool>,
}

impl From<UpdateTrailRequest> for UpdateTrail {
    fn from(req: UpdateTrailRequest) -> Self {
        UpdateTrail {
            title: req.title.map(|t| t.trim().to_string()),
            description: req.description.map(|d| {
                let d = d.trim().to_string();
                (!d.is_empty()).then_some(d)
            }),
            is_public: req.is_public,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddCourseRequest {
    pub course_id: Uuid,

    /// Zero-based slot; appended when absent or past the end
    pub position: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub course_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct TrailDetail {
    #[serde(flatten)]
    pub trail: LearningTrail,
    pub courses: Vec<TrailEntry>,
}

#[derive(Debug, Serialize)]
pub struct TrailOrder {
    pub course_ids: Vec<Uuid>,
}

/// Loads a trail the caller may read
async fn readable_trail(state: &AppState, trail_id: Uuid, caller: Option<AuthContext>) -> ApiResult<LearningTrail> {
    let trail = LearningTrail::find_by_id(&state.db, trail_id)
        .await?
        .filter(|t| t.is_public || caller.is_some_and(|auth| auth.is(t.user_id)))
        .ok_or_else(|| ApiError::NotFound("Trail not found".to_string()))?;
    Ok(trail)
}

/// Loads a trail the caller owns
async fn owned_trail(state: &AppState, trail_id: Uuid, auth: AuthContext) -> ApiResult<LearningTrail> {
    let trail = readable_trail(state, trail_id, Some(auth)).await?;
    if !auth.is(trail.user_id) {
        return Err(ApiError::Forbidden("Only the owner can change this trail".to_string()));
    }
    Ok(trail)
}

pub async fn list_public_trails(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<TrailListing>>> {
    let (limit, offset) = page.bounds();
    Ok(Json(LearningTrail::list_public(&state.db, limit, offset).await?))
}

pub async fn list_own_trails(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Json<Vec<TrailListing>>> {
    Ok(Json(LearningTrail::list_by_user(&state.db, auth.user_id).await?))
}

pub async fn create_trail(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateTrailRequest>,
) -> ApiResult<(StatusCode, Json<LearningTrail>)> {
    req.validate()?;

    let trail = LearningTrail::create(
        &state.db,
        auth.user_id,
        &CreateTrail {
            title: req.title.trim().to_string(),
            description: req.description.filter(|d| !d.trim().is_empty()),
            is_public: req.is_public,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(trail)))
}

/// Trail with its courses; other users only see approved courses in it
pub async fn get_trail(
    State(state): State<AppState>,
    caller: Option<AuthContext>,
    Path(trail_id): Path<Uuid>,
) -> ApiResult<Json<TrailDetail>> {
    let trail = readable_trail(&state, trail_id, caller).await?;
    let is_owner = caller.is_some_and(|auth| auth.is(trail.user_id));

    let courses = LearningTrail::entries(&state.db, trail.id)
        .await?
        .into_iter()
        .filter(|entry| is_owner || entry.status == CourseStatus::Approved)
        .collect();

    Ok(Json(TrailDetail { trail, courses }))
}

pub async fn update_trail(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(trail_id): Path<Uuid>,
    Json(req): Json<UpdateTrailRequest>,
) -> ApiResult<Json<LearningTrail>> {
    req.validate()?;
    let trail = owned_trail(&state, trail_id, auth).await?;

    let updated = LearningTrail::update(&state.db, trail.id, &UpdateTrail::from(req))
        .await?
        .ok_or_else(|| ApiError::NotFound("Trail not found".to_string()))?;

    Ok(Json(updated))
}

pub async fn delete_trail(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(trail_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let trail = owned_trail(&state, trail_id, auth).await?;
    LearningTrail::delete(&state.db, trail.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_course(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(trail_id): Path<Uuid>,
    Json(req): Json<AddCourseRequest>,
) -> ApiResult<Json<TrailOrder>> {
    let trail = owned_trail(&state, trail_id, auth).await?;
    let course = visible_course(&state, req.course_id, Some(auth)).await?;

    let course_ids = LearningTrail::add_course(&state.db, trail.id, course.id, req.position).await?;
    Ok(Json(TrailOrder { course_ids }))
}

pub async fn remove_course(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((trail_id, course_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let trail = owned_trail(&state, trail_id, auth).await?;

    if !LearningTrail::remove_course(&state.db, trail.id, course_id).await? {
        return Err(ApiError::NotFound("Course is not in this trail".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Replaces the order; the body must list exactly the trail's courses
pub async fn reorder_trail(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(trail_id): Path<Uuid>,
    Json(req): Json<ReorderRequest>,
) -> ApiResult<Json<TrailOrder>> {
    let trail = owned_trail(&state, trail_id, auth).await?;

    LearningTrail::reorder(&state.db, trail.id, &req.course_ids).await?;

    Ok(Json(TrailOrder {
        course_ids: req.course_ids,
    }))
}
