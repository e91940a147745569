//! Portal error taxonomy and its HTTP mapping.
//!
//! Every boundary function returns a typed [`PortalError`] rather than
//! raising; the axum layer translates each kind into a status code and a
//! JSON `{"error": ...}` envelope. Page-level callers redirect instead
//! (see `access::verify_access_or_redirect`).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// All failures the portal core can report.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// No identity present on the request.
    #[error("Not authenticated")]
    Unauthenticated,

    /// Identity present but no membership row for the workspace.
    #[error("Not a member of this workspace")]
    NotAMember,

    /// Membership present but the role is below the required floor.
    #[error("Insufficient permissions")]
    InsufficientPermissions,

    /// A referenced org, deliverable, or report does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Malformed input, missing required field, illegal status transition,
    /// or an unmet transition precondition.
    #[error("{0}")]
    Validation(String),

    /// The datastore or identity provider call failed.
    #[error("Upstream failure: {0}")]
    Upstream(String),
}

impl PortalError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::NotAMember | Self::InsufficientPermissions => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(e: reqwest::Error) -> Self {
        Self::Upstream(e.to_string())
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            PortalError::Unauthenticated.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(PortalError::NotAMember.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            PortalError::InsufficientPermissions.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            PortalError::NotFound("org".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            PortalError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PortalError::Upstream("db".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message() {
        let e = PortalError::NotFound("Deliverable".into());
        assert_eq!(e.to_string(), "Deliverable not found");
    }
}
