use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::ActionKind;
use crate::services::messaging::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Missing required field: action")]
    MissingAction,

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Missing required fields for {}", .0.label())]
    MissingFields(ActionKind),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Not found")]
    NotFound,

    /// The body could not be read, e.g. it exceeded the size limit.
    #[error("{message}")]
    BodyRejected { status: StatusCode, message: String },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::MissingAction => StatusCode::BAD_REQUEST,
            AppError::UnknownAction(_) => StatusCode::BAD_REQUEST,
            AppError::MissingFields(_) => StatusCode::BAD_REQUEST,
            AppError::Provider(ProviderError::Rejected { status, .. }) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::Provider(ProviderError::Unreachable(_)) => StatusCode::BAD_GATEWAY,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BodyRejected { status, .. } => *status,
        };

        // Provider rejections pass the provider's own body through.
        let body = match self {
            AppError::Provider(ProviderError::Rejected { body, .. }) => {
                serde_json::json!({ "error": "API request failed", "response": body })
            }
            other => serde_json::json!({ "error": other.to_string() }),
        };
        (status, axum::Json(body)).into_response()
    }
}
