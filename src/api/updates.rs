//! Weekly update endpoints.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use std::sync::Arc;

use super::routes::AppState;
use super::types::{data, CreateUpdateRequest, Data};
use crate::access::{verify_access, WorkspaceRef};
use crate::error::PortalError;
use crate::identity::Identity;
use crate::store::types::{Role, WeeklyUpdate};

/// GET /api/orgs/:org/updates - newest first.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(org): Path<String>,
) -> Result<Json<Data<Vec<WeeklyUpdate>>>, PortalError> {
    let workspace = WorkspaceRef::parse(&org);
    let access = verify_access(&state.store, Some(&identity), &workspace, None).await?;

    let updates = state.store.list_updates(access.org.id).await?;
    Ok(data(updates))
}

/// POST /api/orgs/:org/updates - post an update (admin).
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(org): Path<String>,
    Json(req): Json<CreateUpdateRequest>,
) -> Result<Json<Data<WeeklyUpdate>>, PortalError> {
    if req.title.trim().is_empty() {
        return Err(PortalError::Validation("title is required".to_string()));
    }
    if req.body.trim().is_empty() {
        return Err(PortalError::Validation("body is required".to_string()));
    }

    let workspace = WorkspaceRef::parse(&org);
    let access =
        verify_access(&state.store, Some(&identity), &workspace, Some(Role::Admin)).await?;

    let update = state
        .store
        .insert_update(
            access.org.id,
            &identity.user_id,
            req.title.trim(),
            req.body.trim(),
        )
        .await?;
    Ok(data(update))
}
