//! Axum route handlers for share settings and the public shared view.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::auth::extractor::CurrentUser;
use crate::errors::{AppError, FieldErrors};
use crate::models::ShareSettings;
use crate::routes::envelope::ApiResponse;
use crate::routes::json_body;
use crate::share::gateway::{ShareVisibility, SharedView};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureShareRequest {
    pub is_active: Option<bool>,
    pub show_notes: Option<bool>,
    pub show_documents: Option<bool>,
    /// RFC 3339 timestamp; must lie in the future.
    pub expires_at: Option<String>,
}

impl ConfigureShareRequest {
    fn validate(self, now: DateTime<Utc>) -> Result<(bool, ShareVisibility), AppError> {
        let mut errors = FieldErrors::new();

        let expires_at = match self.expires_at.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match DateTime::parse_from_rfc3339(raw) {
                Ok(at) if at.with_timezone(&Utc) > now => Some(at.with_timezone(&Utc)),
                Ok(_) => {
                    errors.add("expiresAt", "must be in the future");
                    None
                }
                Err(_) => {
                    errors.add("expiresAt", "must be an RFC 3339 timestamp");
                    None
                }
            },
        };

        errors.into_result()?;
        Ok((
            self.is_active.unwrap_or(true),
            ShareVisibility {
                show_notes: self.show_notes.unwrap_or(false),
                show_documents: self.show_documents.unwrap_or(false),
                expires_at,
            },
        ))
    }
}

/// GET /api/v1/share
///
/// `data` is null until sharing has been enabled once.
pub async fn handle_get_share(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<Option<ShareSettings>>>, AppError> {
    let settings = state.share.settings(user.user_id).await?;
    Ok(ApiResponse::ok(settings))
}

/// POST /api/v1/share
pub async fn handle_configure_share(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<ConfigureShareRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ShareSettings>>, AppError> {
    let now = Utc::now();
    let (active, visibility) = json_body(payload)?.validate(now)?;
    let settings = state
        .share
        .configure(user.user_id, active, visibility, now)
        .await?;
    Ok(ApiResponse::with_message(
        settings,
        "Share settings updated successfully",
    ))
}

/// DELETE /api/v1/share
pub async fn handle_disable_share(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.share.disable(user.user_id, Utc::now()).await?;
    Ok(ApiResponse::message("Sharing disabled successfully"))
}

/// POST /api/v1/share/regenerate
pub async fn handle_regenerate_share(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<ShareSettings>>, AppError> {
    let settings = state.share.regenerate(user.user_id, Utc::now()).await?;
    Ok(ApiResponse::with_message(
        settings,
        "Share link regenerated successfully",
    ))
}

/// GET /api/v1/shared/:share_id
///
/// Public. Never says why a token failed to resolve.
pub async fn handle_shared_view(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
) -> Result<Json<ApiResponse<SharedView>>, AppError> {
    let view = state.share.shared_view(&share_id, Utc::now()).await?;
    Ok(ApiResponse::ok(view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_defaults_enable_with_everything_hidden() {
        let (active, visibility) = ConfigureShareRequest::default().validate(Utc::now()).unwrap();
        assert!(active);
        assert_eq!(visibility, ShareVisibility::default());
    }

    #[test]
    fn test_expiry_must_be_future_rfc3339() {
        let now = Utc::now();
        let past = ConfigureShareRequest {
            expires_at: Some((now - Duration::days(1)).to_rfc3339()),
            ..Default::default()
        };
        assert!(matches!(past.validate(now), Err(AppError::Validation(_))));

        let garbage = ConfigureShareRequest {
            expires_at: Some("next tuesday".into()),
            ..Default::default()
        };
        assert!(matches!(garbage.validate(now), Err(AppError::Validation(_))));

        let future = ConfigureShareRequest {
            expires_at: Some((now + Duration::days(1)).to_rfc3339()),
            ..Default::default()
        };
        let (_, visibility) = future.validate(now).unwrap();
        assert!(visibility.expires_at.is_some());
    }
}
