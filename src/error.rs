use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder};
use rocket::serde::json::{json, Json};

/// Rejected analytics inputs, raised at the request boundary only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalyticsError {
    #[error("period must be between 1 and 6 months, got {0}")]
    InvalidPeriod(u8),

    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),
}

/// Errors surfaced by the JSON API
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::BadRequest(_) | ApiError::Analytics(_) => Status::BadRequest,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::Database(_) | ApiError::Internal(_) => Status::InternalServerError,
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status == Status::InternalServerError {
            log::error!("{} {} failed: {}", req.method(), req.uri(), self);
        } else {
            log::warn!("{} {} rejected: {}", req.method(), req.uri(), self);
        }

        let body = json!({
            "success": false,
            "error": self.to_string(),
        });
        (status, Json(body)).respond_to(req)
    }
}
