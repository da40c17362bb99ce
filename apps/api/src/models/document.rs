use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "document_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Resume,
    CoverLetter,
}

impl DocumentType {
    /// Path segment used in blob keys.
    pub fn key_segment(&self) -> &'static str {
        match self {
            DocumentType::Resume => "resume",
            DocumentType::CoverLetter => "cover-letter",
        }
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RESUME" => Ok(DocumentType::Resume),
            "COVER_LETTER" => Ok(DocumentType::CoverLetter),
            other => Err(format!("unknown document type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    /// Opaque blob key, meaningful only to the configured blob store.
    pub file_path: String,
    pub original_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}

/// The parts of a document shown next to an application that links it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: Uuid,
    pub name: String,
    pub original_name: String,
    pub size_bytes: i64,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
}

impl From<&Document> for DocumentSummary {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id,
            name: document.name.clone(),
            original_name: document.original_name.clone(),
            size_bytes: document.size_bytes,
            doc_type: document.doc_type,
        }
    }
}
