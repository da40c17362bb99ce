//! Axum route handlers for document upload, listing, download and deletion.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::QueryRejection,
        Multipart, Path, Query, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;

use crate::auth::extractor::CurrentUser;
use crate::documents::storage::BlobAccess;
use crate::documents::upload::{UploadedFile, TOO_LARGE_MESSAGE};
use crate::errors::AppError;
use crate::models::{Document, DocumentType};
use crate::routes::envelope::ApiResponse;
use crate::routes::{parse_id, query_params};
use crate::state::AppState;

const WHAT: &str = "Document";

#[derive(Debug, Default, Deserialize)]
pub struct ListDocumentsQuery {
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    pub id: Option<String>,
}

fn parse_doc_type(raw: &str) -> Result<DocumentType, AppError> {
    raw.trim()
        .parse()
        .map_err(|_: String| AppError::invalid("type", "must be RESUME or COVER_LETTER"))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::FileUpload(TOO_LARGE_MESSAGE.to_string())
    } else {
        AppError::FileUpload(e.body_text())
    }
}

/// GET /api/v1/documents?type=
pub async fn handle_list_documents(
    State(state): State<AppState>,
    user: CurrentUser,
    query: Result<Query<ListDocumentsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Document>>>, AppError> {
    let query = query_params(query)?;
    let doc_type = match query.doc_type.as_deref().filter(|t| !t.trim().is_empty()) {
        Some(raw) => Some(parse_doc_type(raw)?),
        None => None,
    };
    let documents = state.documents.list(user.user_id, doc_type).await?;
    Ok(ApiResponse::ok(documents))
}

/// POST /api/v1/documents
///
/// Multipart fields: `file` (required), `type` (required), `name` (optional).
pub async fn handle_upload_document(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Document>>), AppError> {
    let mut multipart = multipart
        .map_err(|_| AppError::FileUpload("Expected a multipart/form-data body.".to_string()))?;

    let mut file = None;
    let mut doc_type = None;
    let mut name = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                let original_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some(UploadedFile {
                    original_name,
                    content_type,
                    bytes,
                });
            }
            "type" => doc_type = Some(field.text().await.map_err(multipart_error)?),
            "name" => name = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::FileUpload("No file provided.".to_string()))?;
    let doc_type = parse_doc_type(doc_type.as_deref().unwrap_or_default())?;

    let document = state
        .documents
        .store(user.user_id, file, doc_type, name)
        .await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(document, "Document uploaded successfully"),
    ))
}

/// GET /api/v1/documents/:id
pub async fn handle_get_document(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Document>>, AppError> {
    let id = parse_id(&id, WHAT)?;
    let document = state.documents.retrieve(user.user_id, id).await?;
    Ok(ApiResponse::ok(document))
}

/// DELETE /api/v1/documents/:id
pub async fn handle_delete_document(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = parse_id(&id, WHAT)?;
    state.documents.delete(user.user_id, id).await?;
    Ok(ApiResponse::message("Document deleted successfully"))
}

/// GET /api/v1/documents/download?id=
///
/// S3 answers with a redirect to a presigned URL; the filesystem backend
/// sends the bytes as an attachment.
pub async fn handle_download_document(
    State(state): State<AppState>,
    user: CurrentUser,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let query = query_params(query)?;
    let raw = query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::invalid("id", "is required"))?;
    let id = parse_id(raw.trim(), WHAT)?;

    let (document, access) = state.documents.download(user.user_id, id).await?;
    let response = match access {
        BlobAccess::Redirect(url) => Redirect::temporary(&url).into_response(),
        BlobAccess::Inline(bytes) => {
            let content_type = HeaderValue::from_str(&document.content_type)
                .unwrap_or(HeaderValue::from_static("application/octet-stream"));
            let disposition = HeaderValue::from_str(&format!(
                "attachment; filename=\"{}\"",
                attachment_name(&document.original_name)
            ))
            .unwrap_or(HeaderValue::from_static("attachment"));
            (
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
    };
    Ok(response)
}

/// Printable ASCII only, with quotes and backslashes swapped out.
fn attachment_name(original: &str) -> String {
    let cleaned: String = original
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    if cleaned.trim().is_empty() {
        "document".to_string()
    } else {
        cleaned
    }
}
