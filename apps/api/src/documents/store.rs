use async_trait::async_trait;
use uuid::Uuid;

use crate::db::PgStore;
use crate::errors::AppError;
use crate::models::{Document, DocumentType};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, document: &Document) -> Result<Document, AppError>;

    async fn find(&self, owner: Uuid, id: Uuid) -> Result<Option<Document>, AppError>;

    /// Newest first, optionally narrowed to one type.
    async fn list(&self, owner: Uuid, doc_type: Option<DocumentType>) -> Result<Vec<Document>, AppError>;

    /// Removes the row and returns it, or `None` when the owner has no such document.
    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<Option<Document>, AppError>;
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn insert(&self, document: &Document) -> Result<Document, AppError> {
        Ok(sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents
                (id, user_id, name, doc_type, file_path, original_name, content_type, size_bytes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(document.id)
        .bind(document.user_id)
        .bind(&document.name)
        .bind(document.doc_type)
        .bind(&document.file_path)
        .bind(&document.original_name)
        .bind(&document.content_type)
        .bind(document.size_bytes)
        .bind(document.created_at)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find(&self, owner: Uuid, id: Uuid) -> Result<Option<Document>, AppError> {
        Ok(
            sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(owner)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list(&self, owner: Uuid, doc_type: Option<DocumentType>) -> Result<Vec<Document>, AppError> {
        Ok(sqlx::query_as::<_, Document>(
            r#"
            SELECT * FROM documents
            WHERE user_id = $1 AND ($2::document_type IS NULL OR doc_type = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner)
        .bind(doc_type)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<Option<Document>, AppError> {
        // Application references are cleared by ON DELETE SET NULL.
        Ok(sqlx::query_as::<_, Document>(
            "DELETE FROM documents WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?)
    }
}
