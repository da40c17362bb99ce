use bytes::Bytes;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::DocumentType;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Request body cap for the upload route. Sits above `MAX_UPLOAD_BYTES`
/// so a slightly oversize file reaches validation and gets a readable 400.
pub const UPLOAD_BODY_LIMIT: usize = 8 * 1024 * 1024;

/// Accepted MIME types and the extension used for the stored blob.
pub const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("application/pdf", "pdf"),
    ("application/msword", "doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "docx",
    ),
    ("text/plain", "txt"),
];

pub const INVALID_TYPE_MESSAGE: &str =
    "Invalid file type. Only PDF, DOC, DOCX, and TXT files are allowed.";
pub const TOO_LARGE_MESSAGE: &str = "File size exceeds the maximum limit of 5MB.";
pub const EMPTY_MESSAGE: &str = "File is empty.";

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// A file that passed validation, with its normalised MIME type.
#[derive(Debug, Clone)]
pub struct ValidUpload {
    pub original_name: String,
    pub content_type: &'static str,
    pub extension: &'static str,
    pub bytes: Bytes,
}

/// Checks type, then size, then emptiness.
pub fn validate_upload(file: UploadedFile) -> Result<ValidUpload, AppError> {
    let mime = file
        .content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let &(content_type, extension) = ALLOWED_TYPES
        .iter()
        .find(|(allowed, _)| *allowed == mime)
        .ok_or_else(|| AppError::FileUpload(INVALID_TYPE_MESSAGE.to_string()))?;

    if file.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::FileUpload(TOO_LARGE_MESSAGE.to_string()));
    }
    if file.bytes.is_empty() {
        return Err(AppError::FileUpload(EMPTY_MESSAGE.to_string()));
    }

    Ok(ValidUpload {
        original_name: file.original_name,
        content_type,
        extension,
        bytes: file.bytes,
    })
}

/// `{owner}/{resume|cover-letter}/{uuid}.{ext}`; never derived from the
/// uploaded file name.
pub fn blob_key(owner: Uuid, doc_type: DocumentType, extension: &str) -> String {
    format!(
        "{owner}/{}/{}.{extension}",
        doc_type.key_segment(),
        Uuid::new_v4()
    )
}
