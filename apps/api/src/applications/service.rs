use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::applications::filters::{ApplicationFilters, Page, Pagination};
use crate::applications::store::ApplicationStore;
use crate::applications::validation::{CreateApplicationRequest, UpdateApplicationRequest};
use crate::documents::registry::DocumentRegistry;
use crate::errors::{AppError, FieldErrors};
use crate::models::{DocumentType, JobApplication};

const NOT_FOUND: &str = "Job application";

/// Filtered, sorted page of the owner's applications.
pub async fn list_applications(
    store: &dyn ApplicationStore,
    owner: Uuid,
    filters: &ApplicationFilters,
    pagination: Pagination,
) -> Result<Page<JobApplication>, AppError> {
    let (items, total) = store.query(owner, filters, pagination).await?;
    Ok(Page::new(items, pagination, total))
}

pub async fn get_application(
    store: &dyn ApplicationStore,
    owner: Uuid,
    id: Uuid,
) -> Result<JobApplication, AppError> {
    store.find(owner, id).await?.ok_or(AppError::NotFound(NOT_FOUND))
}

pub async fn create_application(
    store: &dyn ApplicationStore,
    documents: &DocumentRegistry,
    owner: Uuid,
    request: CreateApplicationRequest,
) -> Result<JobApplication, AppError> {
    let application = request.into_application(owner, Utc::now())?;
    check_document_refs(documents, &application).await?;

    let saved = store.insert(&application).await?;
    info!("Created application {} for user {owner}", saved.id);
    Ok(saved)
}

/// Partial update; last write wins.
pub async fn update_application(
    store: &dyn ApplicationStore,
    documents: &DocumentRegistry,
    owner: Uuid,
    id: Uuid,
    patch: UpdateApplicationRequest,
) -> Result<JobApplication, AppError> {
    let existing = get_application(store, owner, id).await?;
    let updated = patch.apply_to(&existing, Utc::now())?;
    check_document_refs(documents, &updated).await?;

    let saved = store
        .update(&updated)
        .await?
        .ok_or(AppError::NotFound(NOT_FOUND))?;
    info!("Updated application {id} for user {owner} (status {})", saved.status);
    Ok(saved)
}

pub async fn delete_application(
    store: &dyn ApplicationStore,
    owner: Uuid,
    id: Uuid,
) -> Result<(), AppError> {
    if !store.delete(owner, id).await? {
        return Err(AppError::NotFound(NOT_FOUND));
    }
    info!("Deleted application {id} for user {owner}");
    Ok(())
}

/// Linked documents must belong to the same owner and be of the matching type.
async fn check_document_refs(
    documents: &DocumentRegistry,
    application: &JobApplication,
) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    let refs = [
        ("resumeId", application.resume_id, DocumentType::Resume),
        ("coverLetterId", application.cover_letter_id, DocumentType::CoverLetter),
    ];
    for (field, id, expected) in refs {
        let Some(id) = id else { continue };
        match documents.find(application.user_id, id).await? {
            Some(doc) if doc.doc_type == expected => {}
            Some(_) => errors.add(field, "refers to a document of the wrong type"),
            None => errors.add(field, "Document not found"),
        }
    }
    errors.into_result()
}
