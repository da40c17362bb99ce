//! Axum route handlers for signup, signin and signout.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::extractor::{CurrentUser, SESSION_COOKIE};
use crate::auth::password::{hash_password, verify_password};
use crate::errors::{AppError, FieldErrors};
use crate::models::{Session, User};
use crate::routes::envelope::ApiResponse;
use crate::routes::json_body;
use crate::state::AppState;
use crate::token::random_token;

const SESSION_TOKEN_LEN: usize = 48;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SigninRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninResponse {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl SignupRequest {
    /// Returns `(name, lower-cased email, password)`.
    fn validate(self) -> Result<(String, String, String), AppError> {
        let mut errors = FieldErrors::new();

        let name = self.name.unwrap_or_default().trim().to_string();
        let name_len = name.chars().count();
        if !(2..=100).contains(&name_len) {
            errors.add("name", "must be between 2 and 100 characters");
        }

        let email = self.email.unwrap_or_default().trim().to_lowercase();
        if !is_plausible_email(&email) {
            errors.add("email", "must be a valid email address");
        }

        let password = self.password.unwrap_or_default();
        if password.chars().count() < 8 {
            errors.add("password", "must be at least 8 characters");
        }

        errors.into_result()?;
        Ok((name, email, password))
    }
}

/// `local@domain.tld` with no whitespace; deliverability is not our problem.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> Result<HeaderValue, AppError> {
    let mut cookie =
        format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid cookie header: {e}")))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/auth/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), AppError> {
    let (name, email, password) = json_body(payload)?.validate()?;

    if state.accounts.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("User already exists"));
    }

    let user = User {
        id: Uuid::new_v4(),
        email,
        name,
        password_hash: hash_password(&password).await?,
        created_at: Utc::now(),
    };
    let user = state.accounts.insert_user(&user).await?;
    info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(user, "User created successfully"),
    ))
}

/// POST /api/v1/auth/signin
///
/// Unknown email and wrong password are the same 401.
pub async fn handle_signin(
    State(state): State<AppState>,
    payload: Result<Json<SigninRequest>, JsonRejection>,
) -> Result<(HeaderMap, Json<ApiResponse<SigninResponse>>), AppError> {
    let request = json_body(payload)?;
    let email = request.email.unwrap_or_default().trim().to_lowercase();
    let password = request.password.unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::Unauthorized);
    }

    let user = state
        .accounts
        .find_user_by_email(&email)
        .await?
        .ok_or(AppError::Unauthorized)?;
    if !verify_password(&password, &user.password_hash).await? {
        return Err(AppError::Unauthorized);
    }

    let now = Utc::now();
    let purged = state.accounts.delete_expired_sessions(user.id, now).await?;
    if purged > 0 {
        debug!("Purged {purged} expired sessions for user {}", user.id);
    }
    let ttl = Duration::hours(state.config.session_ttl_hours);
    let session = Session {
        token: random_token(SESSION_TOKEN_LEN),
        user_id: user.id,
        expires_at: now + ttl,
        created_at: now,
    };
    state.accounts.insert_session(&session).await?;
    info!("User {} signed in", user.id);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        session_cookie(&session.token, ttl.num_seconds(), state.config.cookie_secure)?,
    );

    Ok((
        headers,
        ApiResponse::ok(SigninResponse {
            user,
            token: session.token,
            expires_at: session.expires_at,
        }),
    ))
}

/// POST /api/v1/auth/signout
pub async fn handle_signout(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<(HeaderMap, Json<ApiResponse<()>>), AppError> {
    state.accounts.delete_session(&user.session_token).await?;
    info!("User {} signed out", user.user_id);

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, session_cookie("", 0, state.config.cookie_secure)?);
    Ok((headers, ApiResponse::message("Signed out successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(name: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            name: Some(name.into()),
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    #[test]
    fn test_signup_lowercases_email() {
        let (name, email, _) = signup(" Ada ", "Ada@Example.COM", "longenough")
            .validate()
            .unwrap();
        assert_eq!(name, "Ada");
        assert_eq!(email, "ada@example.com");
    }

    #[test]
    fn test_signup_reports_every_bad_field() {
        match signup("A", "not-an-email", "short").validate() {
            Err(AppError::Validation(fields)) => {
                assert!(fields.get("name").is_some());
                assert!(fields.get("email").is_some());
                assert!(fields.get("password").is_some());
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_plausible_email("a@b.co"));
        assert!(!is_plausible_email("a@b"));
        assert!(!is_plausible_email("@b.co"));
        assert!(!is_plausible_email("a@@b.co"));
        assert!(!is_plausible_email("a b@c.co"));
    }

    #[test]
    fn test_cookie_flags() {
        let cookie = session_cookie("tok", 3600, true).unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("session_id=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.ends_with("; Secure"));

        let cleared = session_cookie("", 0, false).unwrap();
        assert!(cleared.to_str().unwrap().contains("Max-Age=0"));
        assert!(!cleared.to_str().unwrap().contains("Secure"));
    }
}
