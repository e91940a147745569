//! Resolve-or-provision for workspace bootstrap.
//!
//! The identity provider creates its org record before our store hears
//! about it, so a fresh tenant's first page load can race the sync. This
//! module is the single place that waits for the mapping and, failing
//! that, materializes the org — the access verifier itself always fails
//! closed on a missing mapping.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::PortalError;
use crate::identity::Identity;
use crate::store::types::{Membership, Org, OrgKind, Role};
use crate::store::PortalStore;

/// Retry policy for the mapping lookup. One policy for the whole portal.
#[derive(Debug, Clone, Copy)]
pub struct ProvisionPolicy {
    /// Lookup attempts before materializing the org.
    pub attempts: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
}

impl Default for ProvisionPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(250),
        }
    }
}

/// Store operations provisioning needs.
#[async_trait]
pub trait ProvisioningStore: Send + Sync {
    async fn org_by_external_ref(&self, external_ref: &str) -> Result<Option<Org>, PortalError>;
    async fn create_org(
        &self,
        name: &str,
        kind: OrgKind,
        external_ref: &str,
    ) -> Result<Org, PortalError>;
    async fn create_membership(
        &self,
        org: &Org,
        user_id: &str,
        role: Role,
    ) -> Result<Membership, PortalError>;
}

#[async_trait]
impl ProvisioningStore for PortalStore {
    async fn org_by_external_ref(&self, external_ref: &str) -> Result<Option<Org>, PortalError> {
        self.find_org_by_external_ref(external_ref).await
    }

    async fn create_org(
        &self,
        name: &str,
        kind: OrgKind,
        external_ref: &str,
    ) -> Result<Org, PortalError> {
        PortalStore::create_org(self, name, kind, Some(external_ref)).await
    }

    async fn create_membership(
        &self,
        org: &Org,
        user_id: &str,
        role: Role,
    ) -> Result<Membership, PortalError> {
        PortalStore::create_membership(self, org.id, user_id, role).await
    }
}

/// Resolve an external org reference, retrying per the policy, and
/// provision the org if it still does not exist.
///
/// Idempotent: a concurrent request that wins the insert race is handled
/// by one final lookup before the failure surfaces. The provisioning
/// caller becomes the org's first owner.
pub async fn resolve_or_provision(
    store: &dyn ProvisioningStore,
    identity: &Identity,
    external_ref: &str,
    org_name: &str,
    kind: OrgKind,
    policy: ProvisionPolicy,
) -> Result<Org, PortalError> {
    let attempts = policy.attempts.max(1);
    for attempt in 0..attempts {
        if let Some(org) = store.org_by_external_ref(external_ref).await? {
            return Ok(org);
        }
        if attempt + 1 < attempts {
            tracing::debug!(
                "org mapping for {} not found (attempt {}/{}), retrying",
                external_ref,
                attempt + 1,
                attempts
            );
            tokio::time::sleep(policy.backoff).await;
        }
    }

    tracing::info!("provisioning org for external ref {}", external_ref);
    match store.create_org(org_name, kind, external_ref).await {
        Ok(org) => {
            store
                .create_membership(&org, &identity.user_id, Role::Owner)
                .await?;
            Ok(org)
        }
        Err(create_err) => {
            // A concurrent bootstrap may have inserted the org first.
            match store.org_by_external_ref(external_ref).await? {
                Some(org) => Ok(org),
                None => Err(create_err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct FakeStore {
        /// Lookup results consumed in order; repeats the last entry after.
        lookups: Mutex<Vec<Option<Org>>>,
        lookup_calls: Mutex<u32>,
        created_memberships: Mutex<Vec<(Uuid, String, Role)>>,
        fail_create: bool,
    }

    fn org(external_ref: &str) -> Org {
        Org {
            id: Uuid::new_v4(),
            external_ref: Some(external_ref.to_string()),
            name: "Acme".to_string(),
            kind: OrgKind::Client,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    impl FakeStore {
        fn new(lookups: Vec<Option<Org>>) -> Self {
            Self {
                lookups: Mutex::new(lookups),
                lookup_calls: Mutex::new(0),
                created_memberships: Mutex::new(Vec::new()),
                fail_create: false,
            }
        }
    }

    #[async_trait]
    impl ProvisioningStore for FakeStore {
        async fn org_by_external_ref(
            &self,
            _external_ref: &str,
        ) -> Result<Option<Org>, PortalError> {
            *self.lookup_calls.lock().unwrap() += 1;
            let mut lookups = self.lookups.lock().unwrap();
            if lookups.len() > 1 {
                Ok(lookups.remove(0))
            } else {
                Ok(lookups.first().cloned().flatten())
            }
        }

        async fn create_org(
            &self,
            name: &str,
            kind: OrgKind,
            external_ref: &str,
        ) -> Result<Org, PortalError> {
            if self.fail_create {
                return Err(PortalError::Upstream("duplicate key".to_string()));
            }
            Ok(Org {
                id: Uuid::new_v4(),
                external_ref: Some(external_ref.to_string()),
                name: name.to_string(),
                kind,
                created_at: "2026-01-01T00:00:00Z".to_string(),
            })
        }

        async fn create_membership(
            &self,
            org: &Org,
            user_id: &str,
            role: Role,
        ) -> Result<Membership, PortalError> {
            self.created_memberships
                .lock()
                .unwrap()
                .push((org.id, user_id.to_string(), role));
            Ok(Membership {
                org_id: org.id,
                user_id: user_id.to_string(),
                role,
                created_at: "2026-01-01T00:00:00Z".to_string(),
            })
        }
    }

    fn identity() -> Identity {
        Identity {
            user_id: "u1".to_string(),
            email: None,
            name: None,
        }
    }

    fn fast_policy() -> ProvisionPolicy {
        ProvisionPolicy {
            attempts: 3,
            backoff: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_resolves_on_late_sync() {
        let synced = org("org_ext");
        let store = FakeStore::new(vec![None, Some(synced.clone())]);

        let resolved = resolve_or_provision(
            &store,
            &identity(),
            "org_ext",
            "Acme",
            OrgKind::Client,
            fast_policy(),
        )
        .await
        .unwrap();

        assert_eq!(resolved.id, synced.id);
        assert_eq!(*store.lookup_calls.lock().unwrap(), 2);
        assert!(store.created_memberships.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provisions_after_exhausted_lookups() {
        let store = FakeStore::new(vec![None]);

        let resolved = resolve_or_provision(
            &store,
            &identity(),
            "org_ext",
            "Acme",
            OrgKind::Client,
            fast_policy(),
        )
        .await
        .unwrap();

        assert_eq!(resolved.external_ref.as_deref(), Some("org_ext"));
        assert_eq!(*store.lookup_calls.lock().unwrap(), 3);

        // Provisioning caller becomes the first owner.
        let memberships = store.created_memberships.lock().unwrap();
        assert_eq!(memberships.len(), 1);
        assert_eq!(memberships[0].1, "u1");
        assert_eq!(memberships[0].2, Role::Owner);
    }

    #[tokio::test]
    async fn test_lost_insert_race_falls_back_to_lookup() {
        let winner = org("org_ext");
        let mut store = FakeStore::new(vec![None, None, None, Some(winner.clone())]);
        store.fail_create = true;

        let resolved = resolve_or_provision(
            &store,
            &identity(),
            "org_ext",
            "Acme",
            OrgKind::Client,
            fast_policy(),
        )
        .await
        .unwrap();

        assert_eq!(resolved.id, winner.id);
        assert!(store.created_memberships.lock().unwrap().is_empty());
    }
}
