//! Deliverable endpoints: listing, creation, status transitions, and
//! asset upload.
//!
//! Status mutations go through the transition table and its precondition
//! validators; nothing writes a status directly.

use axum::{
    extract::{Extension, Multipart, Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::routes::AppState;
use super::types::{data, CreateDeliverableRequest, Data, TransitionRequest};
use crate::access::{verify_access, WorkspaceRef};
use crate::deliverable::{
    can_transition, validate_complete, validate_send_to_review, DeliverableStatus,
};
use crate::error::PortalError;
use crate::identity::Identity;
use crate::store::types::{Deliverable, DeliverableAsset, Role};
use crate::store::object_key;

/// GET /api/orgs/:org/deliverables - list deliverables. Plain members see
/// only client-visible work; admins and owners see everything.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(org): Path<String>,
) -> Result<Json<Data<Vec<Deliverable>>>, PortalError> {
    let workspace = WorkspaceRef::parse(&org);
    let access = verify_access(&state.store, Some(&identity), &workspace, None).await?;

    let mut deliverables = state.store.list_deliverables(access.org.id).await?;
    if access.role < Role::Admin {
        deliverables.retain(|d| d.client_visible);
    }
    Ok(data(deliverables))
}

/// POST /api/orgs/:org/deliverables - create a deliverable (admin).
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(org): Path<String>,
    Json(req): Json<CreateDeliverableRequest>,
) -> Result<Json<Data<Deliverable>>, PortalError> {
    if req.title.trim().is_empty() {
        return Err(PortalError::Validation("title is required".to_string()));
    }

    let workspace = WorkspaceRef::parse(&org);
    let access =
        verify_access(&state.store, Some(&identity), &workspace, Some(Role::Admin)).await?;

    let deliverable = state
        .store
        .create_deliverable(access.org.id, req.title.trim(), req.client_visible)
        .await?;
    tracing::info!(
        "deliverable {} created in org {}",
        deliverable.id,
        access.org.id
    );
    Ok(data(deliverable))
}

/// POST /api/orgs/:org/deliverables/:id/status - apply a status
/// transition (admin).
pub async fn transition(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path((org, id)): Path<(String, Uuid)>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<Data<Deliverable>>, PortalError> {
    let workspace = WorkspaceRef::parse(&org);
    let access =
        verify_access(&state.store, Some(&identity), &workspace, Some(Role::Admin)).await?;

    let mut deliverable = state
        .store
        .get_deliverable(access.org.id, id)
        .await?
        .ok_or_else(|| PortalError::NotFound("Deliverable".to_string()))?;

    let check = can_transition(req.status, &deliverable);
    if !check.allowed {
        return Err(PortalError::Validation(
            check.reason.unwrap_or_else(|| "Illegal transition".to_string()),
        ));
    }

    // Entry preconditions on top of table legality.
    match req.status {
        DeliverableStatus::InReview => {
            let assets = state.store.list_assets(deliverable.id).await?;
            let check = validate_send_to_review(&deliverable, &assets);
            if !check.allowed {
                return Err(PortalError::Validation(
                    check.reason.unwrap_or_else(|| "Not ready for review".to_string()),
                ));
            }
        }
        DeliverableStatus::Complete => {
            let assets = state.store.list_assets(deliverable.id).await?;
            let check = validate_complete(&deliverable, &assets);
            if !check.allowed {
                return Err(PortalError::Validation(
                    check.reason.unwrap_or_else(|| "Not ready to complete".to_string()),
                ));
            }
        }
        _ => {}
    }

    state
        .store
        .update_deliverable_status(access.org.id, deliverable.id, req.status)
        .await?;
    tracing::info!(
        "deliverable {} moved {} -> {} by {}",
        deliverable.id,
        deliverable.status,
        req.status,
        identity.user_id
    );

    deliverable.status = req.status;
    Ok(data(deliverable))
}

/// POST /api/orgs/:org/deliverables/:id/upload - attach a file (admin).
///
/// Multipart fields: `file` (the upload), optional `kind`,
/// `is_required_proof`, and `proof_type`.
pub async fn upload_asset(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path((org, id)): Path<(String, Uuid)>,
    mut multipart: Multipart,
) -> Result<Json<Data<DeliverableAsset>>, PortalError> {
    let workspace = WorkspaceRef::parse(&org);
    let access =
        verify_access(&state.store, Some(&identity), &workspace, Some(Role::Admin)).await?;

    let deliverable = state
        .store
        .get_deliverable(access.org.id, id)
        .await?
        .ok_or_else(|| PortalError::NotFound("Deliverable".to_string()))?;

    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut kind = "file".to_string();
    let mut is_required_proof = false;
    let mut proof_type: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PortalError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .unwrap_or("upload.bin")
                    .to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| PortalError::Validation(format!("Failed to read file: {}", e)))?;
                file = Some((filename, content_type, bytes.to_vec()));
            }
            "kind" => {
                kind = field.text().await.unwrap_or_default();
            }
            "is_required_proof" => {
                let text = field.text().await.unwrap_or_default();
                is_required_proof = text == "true" || text == "1";
            }
            "proof_type" => {
                proof_type = Some(field.text().await.unwrap_or_default());
            }
            _ => {}
        }
    }

    let (filename, content_type, bytes) =
        file.ok_or_else(|| PortalError::Validation("file field is required".to_string()))?;

    let key = object_key(access.org.id, deliverable.id, &filename);
    let url = state
        .store
        .upload_object(&state.config.storage_bucket, &key, bytes, &content_type)
        .await?;

    let asset = state
        .store
        .insert_asset(
            deliverable.id,
            &kind,
            &url,
            is_required_proof,
            proof_type.as_deref(),
        )
        .await?;
    tracing::info!(
        "asset {} uploaded for deliverable {} in org {}",
        asset.id,
        deliverable.id,
        access.org.id
    );
    Ok(data(asset))
}
