use axum::http::StatusCode;
use db::models::usage_session::SessionError;

/// Failure taxonomy for the presence/session operations.
///
/// Everything except `Db` is a caller-input fault; `Db` is a server-side
/// fault the caller may retry. Broadcast delivery failures never appear here:
/// they are absorbed and logged inside the WebSocket layer.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Session already closed")]
    AlreadyClosed,
    #[error("Storage failure: {0}")]
    Db(#[from] sea_orm::DbErr),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::AlreadyClosed => StatusCode::CONFLICT,
            ServiceError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SessionError> for ServiceError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::AlreadyClosed => ServiceError::AlreadyClosed,
            SessionError::NotFound => ServiceError::NotFound("Session not found".into()),
            SessionError::Db(e) => ServiceError::Db(e),
        }
    }
}
