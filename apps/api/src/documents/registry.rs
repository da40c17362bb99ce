use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::documents::storage::{BlobAccess, BlobStore};
use crate::documents::store::DocumentStore;
use crate::documents::upload::{blob_key, validate_upload, UploadedFile};
use crate::errors::AppError;
use crate::models::{Document, DocumentSummary, DocumentType, JobApplication};

const NOT_FOUND: &str = "Document";

/// Document metadata plus the blob backend it points into.
///
/// Writes go blob first, then row, so a row never references a missing
/// blob. Deletes go row first; blob removal is best-effort and only logged.
#[derive(Clone)]
pub struct DocumentRegistry {
    store: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
}

impl DocumentRegistry {
    pub fn new(store: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    pub async fn store(
        &self,
        owner: Uuid,
        file: UploadedFile,
        doc_type: DocumentType,
        name: Option<String>,
    ) -> Result<Document, AppError> {
        let upload = validate_upload(file)?;
        let key = blob_key(owner, doc_type, upload.extension);
        let size_bytes = upload.bytes.len() as i64;

        self.blobs
            .put(&key, upload.bytes, upload.content_type)
            .await?;

        let document = Document {
            id: Uuid::new_v4(),
            user_id: owner,
            name: name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| upload.original_name.clone()),
            doc_type,
            file_path: key,
            original_name: upload.original_name,
            content_type: upload.content_type.to_string(),
            size_bytes,
            created_at: Utc::now(),
        };

        match self.store.insert(&document).await {
            Ok(saved) => {
                info!("Stored document {} ({} bytes) for user {owner}", saved.id, saved.size_bytes);
                Ok(saved)
            }
            Err(e) => {
                if let Err(cleanup) = self.blobs.delete(&document.file_path).await {
                    warn!("Orphaned blob {} after failed insert: {cleanup}", document.file_path);
                }
                Err(e)
            }
        }
    }

    pub async fn find(&self, owner: Uuid, id: Uuid) -> Result<Option<Document>, AppError> {
        self.store.find(owner, id).await
    }

    pub async fn retrieve(&self, owner: Uuid, id: Uuid) -> Result<Document, AppError> {
        self.find(owner, id).await?.ok_or(AppError::NotFound(NOT_FOUND))
    }

    pub async fn list(
        &self,
        owner: Uuid,
        doc_type: Option<DocumentType>,
    ) -> Result<Vec<Document>, AppError> {
        self.store.list(owner, doc_type).await
    }

    /// Fills `resume` and `cover_letter` from the owner's documents. Links
    /// to documents the owner no longer has come back empty.
    pub async fn attach_summaries(
        &self,
        owner: Uuid,
        applications: &mut [JobApplication],
    ) -> Result<(), AppError> {
        let linked = applications
            .iter()
            .any(|a| a.resume_id.is_some() || a.cover_letter_id.is_some());
        let documents: HashMap<Uuid, DocumentSummary> = if linked {
            self.store
                .list(owner, None)
                .await?
                .iter()
                .map(|d| (d.id, DocumentSummary::from(d)))
                .collect()
        } else {
            HashMap::new()
        };

        for application in applications.iter_mut() {
            application.resume = application.resume_id.and_then(|id| documents.get(&id).cloned());
            application.cover_letter = application
                .cover_letter_id
                .and_then(|id| documents.get(&id).cloned());
        }
        Ok(())
    }

    pub async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), AppError> {
        let removed = self
            .store
            .delete(owner, id)
            .await?
            .ok_or(AppError::NotFound(NOT_FOUND))?;

        if let Err(e) = self.blobs.delete(&removed.file_path).await {
            warn!("Deleted document {id} but could not remove blob {}: {e}", removed.file_path);
        }
        info!("Deleted document {id} for user {owner}");
        Ok(())
    }

    pub async fn download(&self, owner: Uuid, id: Uuid) -> Result<(Document, BlobAccess), AppError> {
        let document = self.retrieve(owner, id).await?;
        let access = self.blobs.open(&document.file_path).await?;
        Ok((document, access))
    }
}
