use async_trait::async_trait;
use uuid::Uuid;

use crate::db::PgStore;
use crate::errors::AppError;
use crate::models::ShareSettings;

#[async_trait]
pub trait ShareStore: Send + Sync {
    async fn find_for_owner(&self, owner: Uuid) -> Result<Option<ShareSettings>, AppError>;

    /// Looks the token up regardless of state; callers decide resolvability.
    async fn find_by_share_id(&self, share_id: &str) -> Result<Option<ShareSettings>, AppError>;

    /// Inserts or replaces the owner's single row.
    async fn save(&self, settings: &ShareSettings) -> Result<ShareSettings, AppError>;
}

#[async_trait]
impl ShareStore for PgStore {
    async fn find_for_owner(&self, owner: Uuid) -> Result<Option<ShareSettings>, AppError> {
        Ok(
            sqlx::query_as::<_, ShareSettings>("SELECT * FROM share_settings WHERE user_id = $1")
                .bind(owner)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_by_share_id(&self, share_id: &str) -> Result<Option<ShareSettings>, AppError> {
        Ok(
            sqlx::query_as::<_, ShareSettings>("SELECT * FROM share_settings WHERE share_id = $1")
                .bind(share_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn save(&self, settings: &ShareSettings) -> Result<ShareSettings, AppError> {
        Ok(sqlx::query_as::<_, ShareSettings>(
            r#"
            INSERT INTO share_settings
                (id, user_id, share_id, is_active, show_notes, show_documents, expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id) DO UPDATE SET
                share_id = EXCLUDED.share_id,
                is_active = EXCLUDED.is_active,
                show_notes = EXCLUDED.show_notes,
                show_documents = EXCLUDED.show_documents,
                expires_at = EXCLUDED.expires_at,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(settings.id)
        .bind(settings.user_id)
        .bind(&settings.share_id)
        .bind(settings.is_active)
        .bind(settings.show_notes)
        .bind(settings.show_documents)
        .bind(settings.expires_at)
        .bind(settings.created_at)
        .bind(settings.updated_at)
        .fetch_one(&self.pool)
        .await?)
    }
}
