//! In-memory stores and fixtures for unit and router tests.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::applications::filters::{ApplicationFilters, Pagination, SortBy, SortOrder};
use crate::applications::ApplicationStore;
use crate::auth::AccountStore;
use crate::config::{Config, StorageConfig};
use crate::documents::storage::{BlobAccess, BlobStore, StorageError};
use crate::documents::upload::UploadedFile;
use crate::documents::DocumentStore;
use crate::errors::AppError;
use crate::models::{ApplicationStatus, Document, DocumentType, JobApplication, Session, ShareSettings, User};
use crate::share::ShareStore;
use crate::state::AppState;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    sessions: HashMap<String, Session>,
    applications: Vec<JobApplication>,
    documents: Vec<Document>,
    shares: Vec<ShareSettings>,
}

/// Implements every store trait over plain vectors, mirroring the
/// Postgres predicates closely enough for behavioural tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn put_application(&self, application: JobApplication) {
        self.tables().applications.push(application);
    }

    pub fn put_session(&self, session: Session) {
        self.tables().sessions.insert(session.token.clone(), session);
    }

    pub fn has_session(&self, token: &str) -> bool {
        self.tables().sessions.contains_key(token)
    }

    pub fn application(&self, id: Uuid) -> Option<JobApplication> {
        self.tables().applications.iter().find(|a| a.id == id).cloned()
    }
}

fn matches_filters(application: &JobApplication, owner: Uuid, filters: &ApplicationFilters) -> bool {
    if application.user_id != owner {
        return false;
    }
    if !filters.status.is_empty() && !filters.status.contains(&application.status) {
        return false;
    }
    if let Some(search) = &filters.search {
        let needle = search.to_lowercase();
        if !application.company_name.to_lowercase().contains(&needle)
            && !application.position.to_lowercase().contains(&needle)
        {
            return false;
        }
    }
    if filters.date_range.start.is_some_and(|start| application.application_date < start) {
        return false;
    }
    if filters.date_range.end.is_some_and(|end| application.application_date > end) {
        return false;
    }
    true
}

fn compare(a: &JobApplication, b: &JobApplication, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::ApplicationDate => a.application_date.cmp(&b.application_date),
        SortBy::CompanyName => a.company_name.to_lowercase().cmp(&b.company_name.to_lowercase()),
        SortBy::Position => a.position.to_lowercase().cmp(&b.position.to_lowercase()),
        SortBy::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn insert(&self, application: &JobApplication) -> Result<JobApplication, AppError> {
        self.tables().applications.push(application.clone());
        Ok(application.clone())
    }

    async fn find(&self, owner: Uuid, id: Uuid) -> Result<Option<JobApplication>, AppError> {
        Ok(self
            .tables()
            .applications
            .iter()
            .find(|a| a.id == id && a.user_id == owner)
            .cloned())
    }

    async fn update(&self, application: &JobApplication) -> Result<Option<JobApplication>, AppError> {
        let mut tables = self.tables();
        let Some(row) = tables
            .applications
            .iter_mut()
            .find(|a| a.id == application.id && a.user_id == application.user_id)
        else {
            return Ok(None);
        };
        *row = application.clone();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables();
        let before = tables.applications.len();
        tables.applications.retain(|a| !(a.id == id && a.user_id == owner));
        Ok(tables.applications.len() < before)
    }

    async fn query(
        &self,
        owner: Uuid,
        filters: &ApplicationFilters,
        pagination: Pagination,
    ) -> Result<(Vec<JobApplication>, i64), AppError> {
        let mut matching: Vec<JobApplication> = self
            .tables()
            .applications
            .iter()
            .filter(|a| matches_filters(a, owner, filters))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let primary = compare(a, b, filters.sort_by);
            let primary = match filters.sort_order {
                SortOrder::Asc => primary,
                SortOrder::Desc => primary.reverse(),
            };
            primary.then_with(|| a.id.cmp(&b.id))
        });

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .collect();
        Ok((items, total))
    }

    async fn all_for_owner(&self, owner: Uuid, cap: i64) -> Result<Vec<JobApplication>, AppError> {
        let mut rows: Vec<JobApplication> = self
            .tables()
            .applications
            .iter()
            .filter(|a| a.user_id == owner)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.application_date
                .cmp(&a.application_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        rows.truncate(cap as usize);
        Ok(rows)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, document: &Document) -> Result<Document, AppError> {
        self.tables().documents.push(document.clone());
        Ok(document.clone())
    }

    async fn find(&self, owner: Uuid, id: Uuid) -> Result<Option<Document>, AppError> {
        Ok(self
            .tables()
            .documents
            .iter()
            .find(|d| d.id == id && d.user_id == owner)
            .cloned())
    }

    async fn list(&self, owner: Uuid, doc_type: Option<DocumentType>) -> Result<Vec<Document>, AppError> {
        let mut rows: Vec<Document> = self
            .tables()
            .documents
            .iter()
            .filter(|d| d.user_id == owner && doc_type.map_or(true, |t| d.doc_type == t))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<Option<Document>, AppError> {
        let mut tables = self.tables();
        let Some(index) = tables
            .documents
            .iter()
            .position(|d| d.id == id && d.user_id == owner)
        else {
            return Ok(None);
        };
        let removed = tables.documents.remove(index);
        for application in tables.applications.iter_mut() {
            if application.resume_id == Some(id) {
                application.resume_id = None;
            }
            if application.cover_letter_id == Some(id) {
                application.cover_letter_id = None;
            }
        }
        Ok(Some(removed))
    }
}

#[async_trait]
impl ShareStore for MemoryStore {
    async fn find_for_owner(&self, owner: Uuid) -> Result<Option<ShareSettings>, AppError> {
        Ok(self.tables().shares.iter().find(|s| s.user_id == owner).cloned())
    }

    async fn find_by_share_id(&self, share_id: &str) -> Result<Option<ShareSettings>, AppError> {
        Ok(self
            .tables()
            .shares
            .iter()
            .find(|s| s.share_id == share_id)
            .cloned())
    }

    async fn save(&self, settings: &ShareSettings) -> Result<ShareSettings, AppError> {
        let mut tables = self.tables();
        match tables.shares.iter_mut().find(|s| s.user_id == settings.user_id) {
            Some(row) => {
                let (id, created_at) = (row.id, row.created_at);
                *row = ShareSettings {
                    id,
                    created_at,
                    ..settings.clone()
                };
                Ok(row.clone())
            }
            None => {
                tables.shares.push(settings.clone());
                Ok(settings.clone())
            }
        }
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<User, AppError> {
        let mut tables = self.tables();
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("User already exists"));
        }
        tables.users.push(user.clone());
        Ok(user.clone())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.tables().users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_session(&self, session: &Session) -> Result<(), AppError> {
        self.put_session(session.clone());
        Ok(())
    }

    async fn find_session(&self, token: &str) -> Result<Option<Session>, AppError> {
        Ok(self.tables().sessions.get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<(), AppError> {
        self.tables().sessions.remove(token);
        Ok(())
    }

    async fn delete_expired_sessions(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tables = self.tables();
        let sessions = &mut tables.sessions;
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id || s.is_live(now));
        Ok((before - sessions.len()) as u64)
    }
}

/// Blob backend held in a map. Deletes can be made to fail on demand.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Bytes>>,
    fail_deletes: AtomicBool,
}

impl MemoryBlobStore {
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, AtomicOrdering::SeqCst);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Bytes, _content_type: &str) -> Result<(), StorageError> {
        self.blobs.lock().unwrap().insert(key.to_string(), bytes);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_deletes.load(AtomicOrdering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, "simulated failure")));
        }
        self.blobs.lock().unwrap().remove(key);
        Ok(())
    }

    async fn open(&self, key: &str) -> Result<BlobAccess, StorageError> {
        self.blobs
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .map(BlobAccess::Inline)
            .ok_or_else(|| StorageError::InvalidKey(key.to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fixtures
// ────────────────────────────────────────────────────────────────────────────

/// A minimal valid application dated `date` (`YYYY-MM-DD`).
pub fn application(owner: Uuid, company: &str, status: ApplicationStatus, date: &str) -> JobApplication {
    let now = Utc::now();
    JobApplication {
        id: Uuid::new_v4(),
        user_id: owner,
        company_name: company.to_string(),
        position: "Software Engineer".to_string(),
        description: None,
        requirements: None,
        location: None,
        salary: None,
        application_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        status,
        job_url: None,
        notes: None,
        follow_up_date: None,
        resume_id: None,
        cover_letter_id: None,
        created_at: now,
        updated_at: now,
        resume: None,
        cover_letter: None,
    }
}

pub fn pdf_upload(len: usize) -> UploadedFile {
    UploadedFile {
        original_name: "resume.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        bytes: Bytes::from(vec![b'%'; len]),
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        storage: StorageConfig::Filesystem {
            root: "unused".into(),
        },
        port: 0,
        rust_log: "debug".to_string(),
        session_ttl_hours: 1,
        cookie_secure: false,
    }
}

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let blobs = Arc::new(MemoryBlobStore::default());
        let state = AppState::new(store.clone(), blobs.clone(), test_config());
        Self { store, blobs, state }
    }

    /// Creates a user with a live session and returns `(user_id, token)`.
    pub fn signed_in_user(&self) -> (Uuid, String) {
        let user_id = Uuid::new_v4();
        let token = crate::token::random_token(48);
        let now = Utc::now();
        self.store.tables().users.push(User {
            id: user_id,
            email: format!("{user_id}@example.com"),
            name: "Test User".to_string(),
            password_hash: "unused".to_string(),
            created_at: now,
        });
        self.store.put_session(Session {
            token: token.clone(),
            user_id,
            expires_at: now + Duration::hours(1),
            created_at: now,
        });
        (user_id, token)
    }
}
