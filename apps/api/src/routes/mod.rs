pub mod envelope;
pub mod health;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, Query,
    },
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::analytics::handlers as analytics;
use crate::applications::handlers as applications;
use crate::auth::handlers as auth;
use crate::documents::handlers as documents;
use crate::documents::upload::UPLOAD_BODY_LIMIT;
use crate::errors::AppError;
use crate::share::handlers as share;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Accounts
        .route("/api/v1/auth/signup", post(auth::handle_signup))
        .route("/api/v1/auth/signin", post(auth::handle_signin))
        .route("/api/v1/auth/signout", post(auth::handle_signout))
        // Applications
        .route(
            "/api/v1/applications",
            get(applications::handle_list_applications)
                .post(applications::handle_create_application),
        )
        .route(
            "/api/v1/applications/:id",
            get(applications::handle_get_application)
                .put(applications::handle_update_application)
                .delete(applications::handle_delete_application),
        )
        // Documents
        .route(
            "/api/v1/documents",
            get(documents::handle_list_documents)
                .post(documents::handle_upload_document)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/v1/documents/download",
            get(documents::handle_download_document),
        )
        .route(
            "/api/v1/documents/:id",
            get(documents::handle_get_document).delete(documents::handle_delete_document),
        )
        // Sharing
        .route(
            "/api/v1/share",
            get(share::handle_get_share)
                .post(share::handle_configure_share)
                .delete(share::handle_disable_share),
        )
        .route("/api/v1/share/regenerate", post(share::handle_regenerate_share))
        .route("/api/v1/shared/:share_id", get(share::handle_shared_view))
        // Analytics
        .route("/api/v1/analytics", get(analytics::handle_analytics))
        .with_state(state)
}

/// Unwraps a JSON body, turning malformed payloads into a 400 with field detail.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::invalid("body", rejection.body_text()))
}

/// Unwraps a query string, turning undecodable ones into a 400 with field detail.
pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| AppError::invalid("query", rejection.body_text()))
}

/// Path ids that do not parse are reported exactly like ids that do not exist.
pub fn parse_id(raw: &str, what: &'static str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(what))
}
