use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Body could not be read into the expected shape.
    #[error("Invalid request body")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// No `authorization` header on a protected route.
    #[error("Access denied")]
    AccessDenied,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{context}")]
    Internal {
        context: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

pub type AppResult<T = ()> = Result<T, AppError>;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AccessDenied | AppError::InvalidToken | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            // Malformed bodies surface the same way a failed insert would.
            AppError::Validation(_) | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Builds a mapper for `map_err` that wraps a failure with the route's message.
pub fn internal<E>(context: &'static str) -> impl FnOnce(E) -> AppError
where
    E: Into<anyhow::Error>,
{
    move |e| AppError::Internal {
        context,
        source: e.into(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match &self {
            AppError::Validation(detail) => Some(detail.clone()),
            // NOTE: the underlying message is returned to the client as-is.
            AppError::Internal { source, .. } => {
                tracing::error!(error = %source, context = %self, "request failed");
                Some(source.to_string())
            }
            _ => None,
        };
        let body = ErrorBody {
            message: self.to_string(),
            error,
        };
        (status, Json(body)).into_response()
    }
}
