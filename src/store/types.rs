//! Typed rows for the hosted relational store.
//!
//! Every table carries an `org_id` column and every query is filtered by it;
//! a row is never reachable through more than one org. Timestamps are kept
//! as the store's ISO-8601 strings.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::deliverable::DeliverableStatus;

/// Tenant kind. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgKind {
    Agency,
    Client,
}

/// Membership role. Ordered: `Member < Admin < Owner`, so a required role
/// acts as a floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tenant org.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Org {
    pub id: Uuid,
    /// Identity-provider org reference; null until synced.
    pub external_ref: Option<String>,
    pub name: String,
    pub kind: OrgKind,
    pub created_at: String,
}

/// An (org, user) membership row. Unique per pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub org_id: Uuid,
    pub user_id: String,
    pub role: Role,
    pub created_at: String,
}

/// A trackable unit of client-facing work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deliverable {
    pub id: Uuid,
    pub org_id: Uuid,
    pub title: String,
    pub status: DeliverableStatus,
    /// 0-100, derived from the checklist; not settable directly.
    pub progress: i32,
    pub client_visible: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// A file attached to a deliverable. Never auto-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliverableAsset {
    pub id: Uuid,
    pub deliverable_id: Uuid,
    pub kind: String,
    pub url: String,
    pub is_required_proof: bool,
    pub proof_type: Option<String>,
    pub created_at: String,
}

/// Completion state of one onboarding node for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnboardingStatus {
    Pending,
    Completed,
}

/// One (org, user, node) onboarding row. Upserted on completion events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingProgress {
    pub org_id: Uuid,
    pub user_id: String,
    pub node_id: String,
    pub status: OnboardingStatus,
    pub completed_at: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// A recorded contract signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractSignature {
    pub id: Uuid,
    pub org_id: Uuid,
    pub user_id: String,
    pub signer_name: String,
    pub signed_at: String,
}

/// A weekly status update posted by the agency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyUpdate {
    pub id: Uuid,
    pub org_id: Uuid,
    pub author_id: String,
    pub title: String,
    pub body: String,
    pub created_at: String,
}

/// One roadmap entry for an org.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapItem {
    pub id: Uuid,
    pub org_id: Uuid,
    pub title: String,
    pub status: String,
    pub sort_order: i32,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering_is_a_floor() {
        assert!(Role::Member < Role::Admin);
        assert!(Role::Admin < Role::Owner);
        assert!(Role::Owner >= Role::Admin);
        assert!(Role::Member >= Role::Member);
    }

    #[test]
    fn test_role_serde_names() {
        assert_eq!(serde_json::to_string(&Role::Owner).unwrap(), "\"owner\"");
        let r: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(r, Role::Admin);
    }
}
