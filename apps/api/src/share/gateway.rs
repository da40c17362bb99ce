//! Share link lifecycle and the public, redacted view behind it.
//!
//! Per user there is at most one `ShareSettings` row:
//!
//! ```text
//! absent --enable--> active --disable--> inactive --enable--> active
//! active --regenerate--> active (new token, old one dead)
//! ```
//!
//! Disabling keeps the row so visibility settings survive a toggle.
//! A token resolves only while the row is active and unexpired; every
//! other outcome is the same `NotFound`.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::applications::store::ApplicationStore;
use crate::documents::DocumentRegistry;
use crate::errors::AppError;
use crate::models::{ApplicationStatus, DocumentSummary, JobApplication, ShareSettings};
use crate::share::store::ShareStore;
use crate::token::random_token;

pub const SHARE_TOKEN_LEN: usize = 32;

/// Upper bound on rows rendered in a shared view.
pub const SHARED_VIEW_CAP: i64 = 1000;

const SETTINGS_NOT_FOUND: &str = "Share settings";
const SHARED_NOT_FOUND: &str = "Shared tracker";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShareVisibility {
    pub show_notes: bool,
    pub show_documents: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// An application as a share-link visitor sees it. The owner id is never
/// exposed; notes and document links only when the owner allows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedApplication {
    pub id: Uuid,
    pub company_name: String,
    pub position: String,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub location: Option<String>,
    pub salary: Option<f64>,
    pub application_date: NaiveDate,
    pub status: ApplicationStatus,
    pub job_url: Option<String>,
    pub notes: Option<String>,
    pub follow_up_date: Option<NaiveDate>,
    pub resume_id: Option<Uuid>,
    pub cover_letter_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resume: Option<DocumentSummary>,
    pub cover_letter: Option<DocumentSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SharedStats {
    pub total: usize,
    pub applied: usize,
    pub interview: usize,
    pub offered: usize,
    pub rejected: usize,
}

impl SharedStats {
    fn from_applications(applications: &[SharedApplication]) -> Self {
        let count = |status: ApplicationStatus| {
            applications.iter().filter(|a| a.status == status).count()
        };
        Self {
            total: applications.len(),
            applied: count(ApplicationStatus::Applied),
            interview: count(ApplicationStatus::Interview),
            offered: count(ApplicationStatus::Offered),
            rejected: count(ApplicationStatus::Rejected),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedView {
    pub applications: Vec<SharedApplication>,
    pub stats: SharedStats,
    pub expires_at: Option<DateTime<Utc>>,
    pub show_notes: bool,
    pub show_documents: bool,
}

/// Strips fields the owner has not opted to show.
pub fn redact(application: JobApplication, settings: &ShareSettings) -> SharedApplication {
    let JobApplication {
        id,
        user_id: _,
        company_name,
        position,
        description,
        requirements,
        location,
        salary,
        application_date,
        status,
        job_url,
        notes,
        follow_up_date,
        resume_id,
        cover_letter_id,
        created_at,
        updated_at,
        resume,
        cover_letter,
    } = application;

    SharedApplication {
        id,
        company_name,
        position,
        description,
        requirements,
        location,
        salary,
        application_date,
        status,
        job_url,
        notes: notes.filter(|_| settings.show_notes),
        follow_up_date,
        resume_id: resume_id.filter(|_| settings.show_documents),
        cover_letter_id: cover_letter_id.filter(|_| settings.show_documents),
        created_at,
        updated_at,
        resume: resume.filter(|_| settings.show_documents),
        cover_letter: cover_letter.filter(|_| settings.show_documents),
    }
}

#[derive(Clone)]
pub struct ShareGateway {
    store: Arc<dyn ShareStore>,
    applications: Arc<dyn ApplicationStore>,
    documents: DocumentRegistry,
}

impl ShareGateway {
    pub fn new(
        store: Arc<dyn ShareStore>,
        applications: Arc<dyn ApplicationStore>,
        documents: DocumentRegistry,
    ) -> Self {
        Self {
            store,
            applications,
            documents,
        }
    }

    pub async fn settings(&self, owner: Uuid) -> Result<Option<ShareSettings>, AppError> {
        self.store.find_for_owner(owner).await
    }

    /// Activates sharing with the given visibility, creating the row and
    /// token on first use. Reactivation keeps the existing token.
    pub async fn enable(
        &self,
        owner: Uuid,
        visibility: ShareVisibility,
        now: DateTime<Utc>,
    ) -> Result<ShareSettings, AppError> {
        let mut settings = self.load_or_create(owner, now).await?;
        settings.is_active = true;
        apply_visibility(&mut settings, visibility, now);
        let saved = self.store.save(&settings).await?;
        info!(
            "Sharing enabled for user {owner} (notes: {}, documents: {})",
            saved.show_notes, saved.show_documents
        );
        Ok(saved)
    }

    /// `enable` when `active`, otherwise just the visibility update.
    pub async fn configure(
        &self,
        owner: Uuid,
        active: bool,
        visibility: ShareVisibility,
        now: DateTime<Utc>,
    ) -> Result<ShareSettings, AppError> {
        if active {
            self.enable(owner, visibility, now).await
        } else {
            self.update_visibility(owner, visibility, now).await
        }
    }

    /// Deactivates the link. Disabling an absent or already inactive link
    /// is a no-op.
    pub async fn disable(&self, owner: Uuid, now: DateTime<Utc>) -> Result<Option<ShareSettings>, AppError> {
        let Some(mut settings) = self.store.find_for_owner(owner).await? else {
            return Ok(None);
        };
        if !settings.is_active {
            return Ok(Some(settings));
        }
        settings.is_active = false;
        settings.updated_at = now;
        let saved = self.store.save(&settings).await?;
        info!("Sharing disabled for user {owner}");
        Ok(Some(saved))
    }

    /// Issues a fresh token; the previous one stops resolving immediately.
    /// The active flag is left as it was.
    pub async fn regenerate(&self, owner: Uuid, now: DateTime<Utc>) -> Result<ShareSettings, AppError> {
        let mut settings = self
            .store
            .find_for_owner(owner)
            .await?
            .ok_or(AppError::NotFound(SETTINGS_NOT_FOUND))?;
        settings.share_id = random_token(SHARE_TOKEN_LEN);
        settings.updated_at = now;
        let saved = self.store.save(&settings).await?;
        info!("Share link regenerated for user {owner}");
        Ok(saved)
    }

    pub async fn update_visibility(
        &self,
        owner: Uuid,
        visibility: ShareVisibility,
        now: DateTime<Utc>,
    ) -> Result<ShareSettings, AppError> {
        let mut settings = self
            .store
            .find_for_owner(owner)
            .await?
            .ok_or(AppError::NotFound(SETTINGS_NOT_FOUND))?;
        apply_visibility(&mut settings, visibility, now);
        let saved = self.store.save(&settings).await?;
        info!("Share visibility updated for user {owner}");
        Ok(saved)
    }

    /// Unknown, inactive and expired tokens all yield the same `NotFound`.
    pub async fn resolve(&self, share_id: &str, now: DateTime<Utc>) -> Result<ShareSettings, AppError> {
        self.store
            .find_by_share_id(share_id)
            .await?
            .filter(|settings| settings.is_resolvable(now))
            .ok_or(AppError::NotFound(SHARED_NOT_FOUND))
    }

    /// Resolves the token and returns the owner's applications with
    /// redaction already applied.
    pub async fn shared_view(&self, share_id: &str, now: DateTime<Utc>) -> Result<SharedView, AppError> {
        let settings = self.resolve(share_id, now).await?;
        let mut applications = self
            .applications
            .all_for_owner(settings.user_id, SHARED_VIEW_CAP)
            .await?;
        if settings.show_documents {
            self.documents
                .attach_summaries(settings.user_id, &mut applications)
                .await?;
        }
        let applications: Vec<SharedApplication> = applications
            .into_iter()
            .map(|application| redact(application, &settings))
            .collect();

        Ok(SharedView {
            stats: SharedStats::from_applications(&applications),
            applications,
            expires_at: settings.expires_at,
            show_notes: settings.show_notes,
            show_documents: settings.show_documents,
        })
    }

    async fn load_or_create(&self, owner: Uuid, now: DateTime<Utc>) -> Result<ShareSettings, AppError> {
        Ok(self
            .store
            .find_for_owner(owner)
            .await?
            .unwrap_or_else(|| ShareSettings {
                id: Uuid::new_v4(),
                user_id: owner,
                share_id: random_token(SHARE_TOKEN_LEN),
                is_active: true,
                show_notes: false,
                show_documents: false,
                expires_at: None,
                created_at: now,
                updated_at: now,
            }))
    }
}

fn apply_visibility(settings: &mut ShareSettings, visibility: ShareVisibility, now: DateTime<Utc>) {
    settings.show_notes = visibility.show_notes;
    settings.show_documents = visibility.show_documents;
    settings.expires_at = visibility.expires_at;
    settings.updated_at = now;
}
