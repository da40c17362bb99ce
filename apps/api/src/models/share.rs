use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShareSettings {
    pub id: Uuid,
    pub user_id: Uuid,
    pub share_id: String,
    pub is_active: bool,
    pub show_notes: bool,
    pub show_documents: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShareSettings {
    /// A link resolves only while active and unexpired.
    pub fn is_resolvable(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.map_or(true, |expires| expires > now)
    }
}
