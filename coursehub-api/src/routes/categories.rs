/// `GET /v1/categories`
///
/// Category creation and deletion live under `/v1/admin`.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use coursehub_shared::models::category::Category;

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(Category::list(&state.db).await?))
}
