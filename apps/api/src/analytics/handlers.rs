use axum::{extract::State, Json};
use chrono::Utc;

use crate::analytics::aggregator::{compute_analytics, ApplicationAnalytics};
use crate::auth::extractor::CurrentUser;
use crate::errors::AppError;
use crate::routes::envelope::ApiResponse;
use crate::state::AppState;

/// Most rows the dashboard aggregates over.
const ANALYTICS_FETCH_CAP: i64 = 1000;

/// GET /api/v1/analytics
///
/// Recomputed from scratch on every call.
pub async fn handle_analytics(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<ApplicationAnalytics>>, AppError> {
    let applications = state
        .applications
        .all_for_owner(user.user_id, ANALYTICS_FETCH_CAP)
        .await?;
    Ok(ApiResponse::ok(compute_analytics(&applications, Utc::now())))
}
