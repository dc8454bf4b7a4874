//! `/categories` handlers
//!
//! Writes only run after the route's pipeline has resolved the caller, so
//! the [`RequestContext`] extension is always present here.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};

use super::routes::{ApiJson, ApiResponse};
use super::server::SharedState;
use crate::auth::RequestContext;
use crate::category::{
    normalize_name, Category, CreateCategoryRequest, DeleteCategoryRequest, UpdateCategoryRequest,
};
use crate::error::{Error, Result};

pub async fn list_categories(State(state): State<SharedState>) -> Result<impl IntoResponse> {
    let categories = state.categories.list_categories().await?;
    Ok(Json(ApiResponse::ok(categories)))
}

pub async fn add_category(
    State(state): State<SharedState>,
    Extension(ctx): Extension<RequestContext>,
    ApiJson(req): ApiJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse> {
    let category = Category::new(normalize_name(&req.name)?, req.description.trim());
    state.categories.insert_category(&category).await?;

    tracing::info!(user = %ctx.username(), category = %category.name, "Category created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(category))))
}

pub async fn update_category(
    State(state): State<SharedState>,
    Extension(ctx): Extension<RequestContext>,
    ApiJson(req): ApiJson<UpdateCategoryRequest>,
) -> Result<impl IntoResponse> {
    let name = normalize_name(&req.name)?;
    let category = state
        .categories
        .update_category(&req.id, &name, req.description.trim())
        .await?
        .ok_or_else(|| Error::CategoryNotFound(req.id.clone()))?;

    tracing::info!(user = %ctx.username(), category = %category.name, "Category updated");
    Ok(Json(ApiResponse::ok(category)))
}

pub async fn delete_category(
    State(state): State<SharedState>,
    Extension(ctx): Extension<RequestContext>,
    ApiJson(req): ApiJson<DeleteCategoryRequest>,
) -> Result<impl IntoResponse> {
    if !state.categories.delete_category(&req.id).await? {
        return Err(Error::CategoryNotFound(req.id));
    }

    tracing::info!(user = %ctx.username(), id = %req.id, "Category deleted");
    Ok(Json(ApiResponse::ok("deleted")))
}
