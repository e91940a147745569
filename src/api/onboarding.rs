//! Onboarding progress and contract signature endpoints.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use std::sync::Arc;

use super::routes::AppState;
use super::types::{data, CompleteNodeRequest, Data, SignContractRequest};
use crate::access::{verify_access, WorkspaceRef};
use crate::error::PortalError;
use crate::identity::Identity;
use crate::store::types::{ContractSignature, OnboardingProgress, OnboardingStatus};

/// GET /api/orgs/:org/onboarding/progress - the caller's node completion
/// state within the workspace.
pub async fn list_progress(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(org): Path<String>,
) -> Result<Json<Data<Vec<OnboardingProgress>>>, PortalError> {
    let workspace = WorkspaceRef::parse(&org);
    let access = verify_access(&state.store, Some(&identity), &workspace, None).await?;

    let rows = state
        .store
        .list_onboarding_progress(access.org.id, &identity.user_id)
        .await?;
    Ok(data(rows))
}

/// POST /api/orgs/:org/onboarding/progress - record a node completion
/// event. One row per (org, user, node); repeats upsert.
pub async fn complete_node(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(org): Path<String>,
    Json(req): Json<CompleteNodeRequest>,
) -> Result<Json<Data<OnboardingProgress>>, PortalError> {
    if req.node_id.trim().is_empty() {
        return Err(PortalError::Validation("node_id is required".to_string()));
    }

    let workspace = WorkspaceRef::parse(&org);
    let access = verify_access(&state.store, Some(&identity), &workspace, None).await?;

    let completed_at = match req.status {
        OnboardingStatus::Completed => Some(chrono::Utc::now().to_rfc3339()),
        OnboardingStatus::Pending => None,
    };

    let row = OnboardingProgress {
        org_id: access.org.id,
        user_id: identity.user_id.clone(),
        node_id: req.node_id.trim().to_string(),
        status: req.status,
        completed_at,
        metadata: req.metadata,
    };

    let stored = state.store.upsert_onboarding_progress(&row).await?;
    tracing::info!(
        "onboarding node {} marked {:?} for user {} in org {}",
        stored.node_id,
        stored.status,
        identity.user_id,
        access.org.id
    );
    Ok(data(stored))
}

/// POST /api/orgs/:org/onboarding/contract - record a contract signature.
pub async fn sign_contract(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(org): Path<String>,
    Json(req): Json<SignContractRequest>,
) -> Result<Json<Data<ContractSignature>>, PortalError> {
    if req.signer_name.trim().is_empty() {
        return Err(PortalError::Validation("signer_name is required".to_string()));
    }

    let workspace = WorkspaceRef::parse(&org);
    let access = verify_access(&state.store, Some(&identity), &workspace, None).await?;

    let signature = state
        .store
        .insert_contract_signature(access.org.id, &identity.user_id, req.signer_name.trim())
        .await?;
    Ok(data(signature))
}
