use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use serde_json::{Value, json};
use thiserror::Error;

use crate::entities::DrawStatus;
use crate::services::lifecycle::DrawAction;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Cannot {action} draw with status '{from}'")]
    InvalidTransition { from: DrawStatus, action: DrawAction },

    #[error("Cannot {action} draw with {participants} participant(s)")]
    DrawLocked {
        action: DrawAction,
        participants: u64,
    },

    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        participated_at: Option<DateTime<Utc>>,
    },

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AppError {
    /// 错误码与附加信息，供响应体使用
    fn code_and_details(&self) -> (&'static str, Option<Value>) {
        match self {
            AppError::ValidationError(_) => ("VALIDATION_ERROR", None),
            AppError::AuthError(_) | AppError::JwtError(_) => ("AUTH_ERROR", None),
            AppError::NotFound(_) => ("NOT_FOUND", None),
            AppError::InvalidTransition { from, action } => (
                "INVALID_TRANSITION",
                Some(json!({ "current_status": from, "action": action })),
            ),
            AppError::DrawLocked {
                action,
                participants,
            } => (
                "DRAW_LOCKED",
                Some(json!({ "action": action, "participant_count": participants })),
            ),
            AppError::Conflict {
                participated_at, ..
            } => (
                "CONFLICT",
                participated_at.map(|at| json!({ "participated_at": at })),
            ),
            AppError::ExternalApiError(_) => ("EXTERNAL_API_ERROR", None),
            AppError::DatabaseError(_) => ("DATABASE_ERROR", None),
            _ => ("INTERNAL_ERROR", None),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidTransition { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::AuthError(_) | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::DrawLocked { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::ExternalApiError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let (error_code, details) = self.code_and_details();

        // 5xx 不向客户端暴露内部细节
        let message = if status_code.is_server_error() {
            log::error!("{error_code}: {self}");
            match self {
                AppError::DatabaseError(_) => "Database error".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            if status_code != StatusCode::NOT_FOUND {
                log::warn!("{error_code}: {self}");
            }
            match self {
                AppError::ValidationError(msg)
                | AppError::AuthError(msg)
                | AppError::NotFound(msg)
                | AppError::ExternalApiError(msg) => msg.clone(),
                AppError::Conflict { message, .. } => message.clone(),
                AppError::JwtError(_) => "Token is invalid or expired".to_string(),
                other => other.to_string(),
            }
        };

        let mut error = json!({
            "code": error_code,
            "message": message,
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": error
        }))
    }
}
