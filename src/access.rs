//! Workspace access verification.
//!
//! [`verify_access`] is the single point of enforcement: every
//! workspace-scoped page load and mutation calls it before touching
//! workspace data, and no handler trusts a role passed in by the caller.
//! It is a pure read; resolution of an external org reference never
//! materializes a missing org (that is `provision`'s job, invoked
//! explicitly by the bootstrap flow).

use async_trait::async_trait;
use axum::response::Redirect;
use uuid::Uuid;

use crate::error::PortalError;
use crate::identity::Identity;
use crate::store::types::{Membership, Org, Role};
use crate::store::PortalStore;

/// A workspace identifier as supplied by a request: either the internal org
/// id or the identity provider's org reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceRef {
    Internal(Uuid),
    External(String),
}

impl WorkspaceRef {
    /// Classify a path segment. Anything that parses as a UUID is an
    /// internal id; everything else is treated as a provider reference.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<Uuid>() {
            Ok(id) => Self::Internal(id),
            Err(_) => Self::External(raw.to_string()),
        }
    }
}

/// What the org and membership lookups need from the store.
#[async_trait]
pub trait WorkspaceDirectory: Send + Sync {
    async fn org_by_id(&self, id: Uuid) -> Result<Option<Org>, PortalError>;
    async fn org_by_external_ref(&self, external_ref: &str) -> Result<Option<Org>, PortalError>;
    async fn membership(
        &self,
        org_id: Uuid,
        user_id: &str,
    ) -> Result<Option<Membership>, PortalError>;
}

#[async_trait]
impl WorkspaceDirectory for PortalStore {
    async fn org_by_id(&self, id: Uuid) -> Result<Option<Org>, PortalError> {
        self.get_org(id).await
    }

    async fn org_by_external_ref(&self, external_ref: &str) -> Result<Option<Org>, PortalError> {
        self.find_org_by_external_ref(external_ref).await
    }

    async fn membership(
        &self,
        org_id: Uuid,
        user_id: &str,
    ) -> Result<Option<Membership>, PortalError> {
        self.find_membership(org_id, user_id).await
    }
}

/// A verified caller within a workspace.
#[derive(Debug, Clone)]
pub struct VerifiedAccess {
    pub org: Org,
    /// The caller's actual role, for downstream display logic.
    pub role: Role,
}

/// Resolve a workspace reference to its org, failing closed.
///
/// An external reference with no mapping is `NotFound` — it is never
/// materialized here.
pub async fn resolve_workspace(
    directory: &dyn WorkspaceDirectory,
    workspace: &WorkspaceRef,
) -> Result<Org, PortalError> {
    let org = match workspace {
        WorkspaceRef::Internal(id) => directory.org_by_id(*id).await?,
        WorkspaceRef::External(external_ref) => {
            directory.org_by_external_ref(external_ref).await?
        }
    };
    org.ok_or_else(|| PortalError::NotFound("Workspace".to_string()))
}

/// Confirm the caller is a member of the workspace and, if `required` is
/// given, holds at least that role.
///
/// `Member` is a floor every role satisfies; `Admin` and `Owner`
/// requirements both admit admins and owners.
pub async fn verify_access(
    directory: &dyn WorkspaceDirectory,
    identity: Option<&Identity>,
    workspace: &WorkspaceRef,
    required: Option<Role>,
) -> Result<VerifiedAccess, PortalError> {
    let identity = identity.ok_or(PortalError::Unauthenticated)?;

    let org = resolve_workspace(directory, workspace).await?;

    let membership = directory
        .membership(org.id, &identity.user_id)
        .await?
        .ok_or(PortalError::NotAMember)?;

    match required {
        None | Some(Role::Member) => {}
        Some(Role::Admin) | Some(Role::Owner) => {
            if membership.role < Role::Admin {
                return Err(PortalError::InsufficientPermissions);
            }
        }
    }

    Ok(VerifiedAccess {
        org,
        role: membership.role,
    })
}

/// Page-level variant: on any failure, redirect to the fallback location
/// instead of surfacing the error.
pub async fn verify_access_or_redirect(
    directory: &dyn WorkspaceDirectory,
    identity: Option<&Identity>,
    workspace: &WorkspaceRef,
    required: Option<Role>,
    fallback: &str,
) -> Result<VerifiedAccess, Redirect> {
    match verify_access(directory, identity, workspace, required).await {
        Ok(access) => Ok(access),
        Err(e) => {
            tracing::debug!("access denied, redirecting to {}: {}", fallback, e);
            Err(Redirect::to(fallback))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::types::OrgKind;
    use std::collections::HashMap;

    struct FakeDirectory {
        orgs: Vec<Org>,
        members: HashMap<(Uuid, String), Role>,
    }

    impl FakeDirectory {
        fn new() -> Self {
            Self {
                orgs: Vec::new(),
                members: HashMap::new(),
            }
        }

        fn with_org(mut self, id: Uuid, external_ref: Option<&str>) -> Self {
            self.orgs.push(Org {
                id,
                external_ref: external_ref.map(|s| s.to_string()),
                name: "Acme".to_string(),
                kind: OrgKind::Client,
                created_at: "2026-01-01T00:00:00Z".to_string(),
            });
            self
        }

        fn with_member(mut self, org_id: Uuid, user_id: &str, role: Role) -> Self {
            self.members.insert((org_id, user_id.to_string()), role);
            self
        }
    }

    #[async_trait]
    impl WorkspaceDirectory for FakeDirectory {
        async fn org_by_id(&self, id: Uuid) -> Result<Option<Org>, PortalError> {
            Ok(self.orgs.iter().find(|o| o.id == id).cloned())
        }

        async fn org_by_external_ref(
            &self,
            external_ref: &str,
        ) -> Result<Option<Org>, PortalError> {
            Ok(self
                .orgs
                .iter()
                .find(|o| o.external_ref.as_deref() == Some(external_ref))
                .cloned())
        }

        async fn membership(
            &self,
            org_id: Uuid,
            user_id: &str,
        ) -> Result<Option<Membership>, PortalError> {
            Ok(self
                .members
                .get(&(org_id, user_id.to_string()))
                .map(|role| Membership {
                    org_id,
                    user_id: user_id.to_string(),
                    role: *role,
                    created_at: "2026-01-01T00:00:00Z".to_string(),
                }))
        }
    }

    fn identity(user_id: &str) -> Identity {
        Identity {
            user_id: user_id.to_string(),
            email: None,
            name: None,
        }
    }

    #[tokio::test]
    async fn test_no_identity_is_unauthenticated() {
        let org_id = Uuid::new_v4();
        let dir = FakeDirectory::new()
            .with_org(org_id, None)
            .with_member(org_id, "u1", Role::Owner);

        let err = verify_access(&dir, None, &WorkspaceRef::Internal(org_id), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_missing_membership_is_not_a_member() {
        let org_id = Uuid::new_v4();
        let dir = FakeDirectory::new().with_org(org_id, None);

        for required in [None, Some(Role::Member), Some(Role::Admin), Some(Role::Owner)] {
            let err = verify_access(
                &dir,
                Some(&identity("stranger")),
                &WorkspaceRef::Internal(org_id),
                required,
            )
            .await
            .unwrap_err();
            assert!(matches!(err, PortalError::NotAMember));
        }
    }

    #[tokio::test]
    async fn test_member_floor_admits_every_role() {
        let org_id = Uuid::new_v4();
        for role in [Role::Member, Role::Admin, Role::Owner] {
            let dir = FakeDirectory::new()
                .with_org(org_id, None)
                .with_member(org_id, "u1", role);

            let access = verify_access(
                &dir,
                Some(&identity("u1")),
                &WorkspaceRef::Internal(org_id),
                Some(Role::Member),
            )
            .await
            .unwrap();
            assert_eq!(access.role, role);
        }
    }

    #[tokio::test]
    async fn test_no_requirement_returns_actual_role() {
        let org_id = Uuid::new_v4();
        let dir = FakeDirectory::new()
            .with_org(org_id, None)
            .with_member(org_id, "u1", Role::Member);

        let access = verify_access(
            &dir,
            Some(&identity("u1")),
            &WorkspaceRef::Internal(org_id),
            None,
        )
        .await
        .unwrap();
        assert_eq!(access.role, Role::Member);
    }

    #[tokio::test]
    async fn test_admin_requirement_rejects_plain_member() {
        let org_id = Uuid::new_v4();
        let dir = FakeDirectory::new()
            .with_org(org_id, None)
            .with_member(org_id, "u1", Role::Member);

        let err = verify_access(
            &dir,
            Some(&identity("u1")),
            &WorkspaceRef::Internal(org_id),
            Some(Role::Admin),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PortalError::InsufficientPermissions));
    }

    #[tokio::test]
    async fn test_admin_requirement_admits_admin_and_owner() {
        let org_id = Uuid::new_v4();
        for role in [Role::Admin, Role::Owner] {
            let dir = FakeDirectory::new()
                .with_org(org_id, None)
                .with_member(org_id, "u1", role);

            for required in [Some(Role::Admin), Some(Role::Owner)] {
                let access = verify_access(
                    &dir,
                    Some(&identity("u1")),
                    &WorkspaceRef::Internal(org_id),
                    required,
                )
                .await
                .unwrap();
                assert_eq!(access.role, role);
            }
        }
    }

    #[tokio::test]
    async fn test_external_ref_resolves_without_materializing() {
        let org_id = Uuid::new_v4();
        let dir = FakeDirectory::new()
            .with_org(org_id, Some("org_ext_1"))
            .with_member(org_id, "u1", Role::Admin);

        let access = verify_access(
            &dir,
            Some(&identity("u1")),
            &WorkspaceRef::External("org_ext_1".to_string()),
            None,
        )
        .await
        .unwrap();
        assert_eq!(access.org.id, org_id);

        // Unknown external ref fails closed.
        let err = verify_access(
            &dir,
            Some(&identity("u1")),
            &WorkspaceRef::External("org_unknown".to_string()),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PortalError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_redirect_wrapper_on_failure() {
        let org_id = Uuid::new_v4();
        let dir = FakeDirectory::new().with_org(org_id, None);

        let result = verify_access_or_redirect(
            &dir,
            Some(&identity("stranger")),
            &WorkspaceRef::Internal(org_id),
            None,
            "/sign-in",
        )
        .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_workspace_ref_parse() {
        let id = Uuid::new_v4();
        assert_eq!(
            WorkspaceRef::parse(&id.to_string()),
            WorkspaceRef::Internal(id)
        );
        assert_eq!(
            WorkspaceRef::parse("org_2abc"),
            WorkspaceRef::External("org_2abc".to_string())
        );
    }
}
