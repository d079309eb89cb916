//! API error handling: maps service errors to HTTP status codes and a JSON body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::lesson::LessonError;
use crate::logic::ServiceError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "type": match self.status {
                    StatusCode::BAD_REQUEST => "invalid_request_error",
                    StatusCode::NOT_FOUND => "not_found_error",
                    StatusCode::CONFLICT => "conflict_error",
                    StatusCode::UNPROCESSABLE_ENTITY => "validation_error",
                    _ => "server_error",
                },
                "details": self.details,
                "code": self.status.as_str()
            }
        }));
        (self.status, body).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::LessonNotFound(_) => ApiError::new(StatusCode::NOT_FOUND, message),
            ServiceError::LessonExists(_) => ApiError::new(StatusCode::CONFLICT, message),
            ServiceError::InvalidBlockId(_) | ServiceError::UnknownVariant(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, message)
            }
            ServiceError::Rejected(rejection) => ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, message)
                .with_details(json!({
                    "violations": rejection.content,
                    "configErrors": rejection.config,
                })),
            ServiceError::Lesson(e) => {
                let status = match e {
                    LessonError::RevisionConflict { .. } | LessonError::DuplicateBlock { .. } => StatusCode::CONFLICT,
                    LessonError::BlockNotFound { .. } => StatusCode::NOT_FOUND,
                    LessonError::VariantChanged { .. } | LessonError::TooManyBlocks { .. } => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    LessonError::Encode { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                ApiError::new(status, message).with_details(json!(e))
            }
        }
    }
}
