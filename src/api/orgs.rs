//! Workspace bootstrap and membership roster.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use std::collections::HashMap;
use std::sync::Arc;

use super::routes::AppState;
use super::types::{data, BootstrapRequest, Data, MemberInfo};
use crate::access::{verify_access, WorkspaceRef};
use crate::error::PortalError;
use crate::identity::Identity;
use crate::provision::resolve_or_provision;
use crate::store::types::Org;

/// POST /api/orgs/bootstrap - resolve the caller's workspace, provisioning
/// the org mapping if the identity provider's sync has not landed yet.
///
/// This is the only entry point that materializes an org; everything else
/// fails closed on a missing mapping.
pub async fn bootstrap(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<BootstrapRequest>,
) -> Result<Json<Data<Org>>, PortalError> {
    if req.external_ref.trim().is_empty() {
        return Err(PortalError::Validation("external_ref is required".to_string()));
    }
    if req.org_name.trim().is_empty() {
        return Err(PortalError::Validation("org_name is required".to_string()));
    }

    let org = resolve_or_provision(
        &state.store,
        &identity,
        req.external_ref.trim(),
        req.org_name.trim(),
        req.kind,
        state.provision_policy,
    )
    .await?;

    Ok(data(org))
}

/// GET /api/orgs/:org/members - membership roster, enriched with provider
/// metadata when the management API is configured.
pub async fn list_members(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(org): Path<String>,
) -> Result<Json<Data<Vec<MemberInfo>>>, PortalError> {
    let workspace = WorkspaceRef::parse(&org);
    let access = verify_access(&state.store, Some(&identity), &workspace, None).await?;

    let memberships = state.store.list_memberships(access.org.id).await?;

    let mut metadata = HashMap::new();
    if let (Some(provider), Some(external_ref)) =
        (&state.identity_provider, access.org.external_ref.as_deref())
    {
        for member in provider.org_members(external_ref).await? {
            metadata.insert(member.user_id.clone(), member);
        }
    }

    let roster = memberships
        .into_iter()
        .map(|m| {
            let meta = metadata.get(&m.user_id);
            MemberInfo {
                role: m.role,
                name: meta.and_then(|p| p.name.clone()),
                email: meta.and_then(|p| p.email.clone()),
                avatar_url: meta.and_then(|p| p.avatar_url.clone()),
                user_id: m.user_id,
            }
        })
        .collect();

    Ok(data(roster))
}
