//! Roadmap endpoints.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use std::sync::Arc;

use super::routes::AppState;
use super::types::{data, CreateRoadmapItemRequest, Data};
use crate::access::{verify_access, WorkspaceRef};
use crate::error::PortalError;
use crate::identity::Identity;
use crate::store::types::{RoadmapItem, Role};

/// GET /api/orgs/:org/roadmap - items in sort order.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(org): Path<String>,
) -> Result<Json<Data<Vec<RoadmapItem>>>, PortalError> {
    let workspace = WorkspaceRef::parse(&org);
    let access = verify_access(&state.store, Some(&identity), &workspace, None).await?;

    let items = state.store.list_roadmap(access.org.id).await?;
    Ok(data(items))
}

/// POST /api/orgs/:org/roadmap - add an item (admin).
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(org): Path<String>,
    Json(req): Json<CreateRoadmapItemRequest>,
) -> Result<Json<Data<RoadmapItem>>, PortalError> {
    if req.title.trim().is_empty() {
        return Err(PortalError::Validation("title is required".to_string()));
    }

    let workspace = WorkspaceRef::parse(&org);
    let access =
        verify_access(&state.store, Some(&identity), &workspace, Some(Role::Admin)).await?;

    let item = state
        .store
        .insert_roadmap_item(access.org.id, req.title.trim(), &req.status, req.sort_order)
        .await?;
    Ok(data(item))
}
