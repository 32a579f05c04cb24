use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::lifecycle::{RejectionKind, TransitionError};

/// Error returned by services and handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Rejected(#[from] TransitionError),

    #[error("{0}")]
    InvalidInput(String),

    /// The record exists but no longer matches the precondition of the write.
    #[error("{0}")]
    Conflict(String),

    #[error("upstream failure")]
    Upstream(#[from] anyhow::Error),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("forbidden access")]
    Forbidden,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(..) => StatusCode::NOT_FOUND,
            Self::Rejected(reason) => match reason.kind() {
                RejectionKind::InvalidInput => StatusCode::BAD_REQUEST,
                RejectionKind::InvalidState => StatusCode::UNPROCESSABLE_ENTITY,
            },
            Self::InvalidInput(..) => StatusCode::BAD_REQUEST,
            Self::Conflict(..) => StatusCode::CONFLICT,
            Self::Upstream(..) => StatusCode::BAD_GATEWAY,
            Self::Unauthorized(..) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(..) => "NotFound",
            Self::Rejected(reason) => match reason.kind() {
                RejectionKind::InvalidInput => "InvalidInput",
                RejectionKind::InvalidState => "InvalidState",
            },
            Self::InvalidInput(..) => "InvalidInput",
            Self::Conflict(..) => "Conflict",
            Self::Upstream(..) => "UpstreamFailure",
            Self::Unauthorized(..) => "Unauthorized",
            Self::Forbidden => "Forbidden",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub message: String,
}

impl From<&AppError> for ErrorBody {
    fn from(err: &AppError) -> Self {
        let reason = match err {
            AppError::Rejected(reason) => Some(reason.code().to_string()),
            _ => None,
        };
        Self {
            r#type: err.kind().to_string(),
            reason,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = ?self, "request failed");
        } else {
            warn!(error = %self, kind = self.kind(), "request rejected");
        }
        (status, Json(ErrorBody::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_split_into_input_and_state() {
        let missing = AppError::from(TransitionError::MissingRiderData);
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(missing.kind(), "InvalidInput");

        let cashed = AppError::from(TransitionError::AlreadyCashedOut);
        assert_eq!(cashed.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(cashed.kind(), "InvalidState");
    }

    #[test]
    fn conflict_is_distinct_from_not_found() {
        let conflict = AppError::Conflict("parcel changed".into());
        let missing = AppError::NotFound("parcel");
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.to_string(), "parcel not found");
    }

    #[test]
    fn upstream_hides_details_from_body() {
        let err = AppError::from(anyhow::anyhow!("connection refused on 10.0.0.3"));
        let body = ErrorBody::from(&err);
        assert_eq!(body.r#type, "UpstreamFailure");
        assert_eq!(body.message, "upstream failure");
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn body_carries_rejection_reason() {
        let body = ErrorBody::from(&AppError::from(TransitionError::NotDelivered));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["type"], "InvalidState");
        assert_eq!(json["reason"], "NotDelivered");
        assert_eq!(json["message"], "parcel not delivered yet");
    }
}
