//! Axum route handlers for job applications.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::applications::filters::{ListQuery, Page};
use crate::applications::service;
use crate::applications::validation::{CreateApplicationRequest, UpdateApplicationRequest};
use crate::auth::extractor::CurrentUser;
use crate::errors::AppError;
use crate::models::JobApplication;
use crate::routes::envelope::ApiResponse;
use crate::routes::{json_body, parse_id, query_params};
use crate::state::AppState;

const WHAT: &str = "Job application";

async fn with_summaries(
    state: &AppState,
    owner: Uuid,
    application: &mut JobApplication,
) -> Result<(), AppError> {
    state
        .documents
        .attach_summaries(owner, std::slice::from_mut(application))
        .await
}

/// GET /api/v1/applications
///
/// `status` may be repeated (`?status=APPLIED&status=INTERVIEW`) or
/// comma-separated.
pub async fn handle_list_applications(
    State(state): State<AppState>,
    user: CurrentUser,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<ApiResponse<Page<JobApplication>>>, AppError> {
    let (filters, pagination) = ListQuery::from_pairs(query_params(query)?)?.parse()?;
    let mut page =
        service::list_applications(state.applications.as_ref(), user.user_id, &filters, pagination)
            .await?;
    state
        .documents
        .attach_summaries(user.user_id, &mut page.items)
        .await?;
    Ok(ApiResponse::ok(page))
}

/// POST /api/v1/applications
pub async fn handle_create_application(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<CreateApplicationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<JobApplication>>), AppError> {
    let request = json_body(payload)?;
    let mut created = service::create_application(
        state.applications.as_ref(),
        &state.documents,
        user.user_id,
        request,
    )
    .await?;
    with_summaries(&state, user.user_id, &mut created).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(created, "Job application created successfully"),
    ))
}

/// GET /api/v1/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<JobApplication>>, AppError> {
    let id = parse_id(&id, WHAT)?;
    let mut application =
        service::get_application(state.applications.as_ref(), user.user_id, id).await?;
    with_summaries(&state, user.user_id, &mut application).await?;
    Ok(ApiResponse::ok(application))
}

/// PUT /api/v1/applications/:id
///
/// Partial update: omitted fields keep their value, `null` clears.
pub async fn handle_update_application(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateApplicationRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<JobApplication>>, AppError> {
    let id = parse_id(&id, WHAT)?;
    let patch = json_body(payload)?;
    let mut updated = service::update_application(
        state.applications.as_ref(),
        &state.documents,
        user.user_id,
        id,
        patch,
    )
    .await?;
    with_summaries(&state, user.user_id, &mut updated).await?;
    Ok(ApiResponse::with_message(
        updated,
        "Job application updated successfully",
    ))
}

/// DELETE /api/v1/applications/:id
pub async fn handle_delete_application(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = parse_id(&id, WHAT)?;
    service::delete_application(state.applications.as_ref(), user.user_id, id).await?;
    Ok(ApiResponse::message("Job application deleted successfully"))
}
