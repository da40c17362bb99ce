use axum::Json;
use serde::Serialize;

/// Success envelope shared by every JSON endpoint: `{ success, data?, message? }`.
/// Failures are rendered by `AppError` with the same outer shape.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: None,
        })
    }

    pub fn with_message(data: T, message: &'static str) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: Some(message),
        })
    }
}

impl ApiResponse<()> {
    pub fn message(message: &'static str) -> Json<Self> {
        Json(Self {
            success: true,
            data: None,
            message: Some(message),
        })
    }
}
