//! Bearer-token middleware.
//!
//! Extracts the identity-provider session token from `Authorization`,
//! verifies it, and inserts the resulting [`Identity`] as a request
//! extension so handlers receive an explicit caller value. Requests
//! without a valid token are rejected at this layer with 401; workspace
//! membership is checked later by the access verifier per route.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::routes::AppState;
use crate::error::PortalError;
use crate::identity::{identity_from_token, Identity};

pub async fn require_identity(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // Dev mode attaches a synthetic identity; membership checks still run.
    if state.config.dev_mode {
        req.extensions_mut().insert(Identity {
            user_id: "dev".to_string(),
            email: None,
            name: None,
        });
        return next.run(req).await;
    }

    let secret = match state.config.jwt_secret.as_deref() {
        Some(s) => s,
        None => {
            return PortalError::Upstream("JWT_SECRET not configured".to_string()).into_response();
        }
    };

    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    let token = auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .unwrap_or("");

    if token.is_empty() {
        return PortalError::Unauthenticated.into_response();
    }

    match identity_from_token(token, secret) {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}
