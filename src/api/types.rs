//! Request/response types for the HTTP surface.
//!
//! Successful responses are wrapped in a `{"data": ...}` envelope;
//! failures are produced by `PortalError`'s `IntoResponse` as
//! `{"error": ...}`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::deliverable::DeliverableStatus;
use crate::store::types::{OnboardingStatus, OrgKind, Role};

/// The success envelope.
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

/// Wrap a payload in the success envelope.
pub fn data<T: Serialize>(value: T) -> axum::Json<Data<T>> {
    axum::Json(Data { data: value })
}

#[derive(Debug, Deserialize)]
pub struct BootstrapRequest {
    /// Identity-provider org reference for the caller's workspace.
    pub external_ref: String,
    /// Display name used if the org has to be provisioned.
    pub org_name: String,
    #[serde(default = "default_org_kind")]
    pub kind: OrgKind,
}

fn default_org_kind() -> OrgKind {
    OrgKind::Client
}

#[derive(Debug, Deserialize)]
pub struct CompleteNodeRequest {
    pub node_id: String,
    #[serde(default = "default_node_status")]
    pub status: OnboardingStatus,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

fn default_node_status() -> OnboardingStatus {
    OnboardingStatus::Completed
}

#[derive(Debug, Deserialize)]
pub struct SignContractRequest {
    pub signer_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateDeliverableRequest {
    pub title: String,
    #[serde(default)]
    pub client_visible: bool,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: DeliverableStatus,
}

#[derive(Debug, Deserialize)]
pub struct CreateUpdateRequest {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoadmapItemRequest {
    pub title: String,
    #[serde(default = "default_roadmap_status")]
    pub status: String,
    #[serde(default)]
    pub sort_order: i32,
}

fn default_roadmap_status() -> String {
    "planned".to_string()
}

/// One roster entry, optionally enriched with provider metadata.
#[derive(Debug, Serialize)]
pub struct MemberInfo {
    pub user_id: String,
    pub role: Role,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// Aggregated report over an org's deliverables and activity.
#[derive(Debug, Serialize)]
pub struct Report {
    pub org_id: Uuid,
    pub org_name: String,
    pub generated_at: String,
    pub deliverable_count: usize,
    pub completed_count: usize,
    pub average_progress: i32,
    pub status_counts: Vec<StatusCount>,
    pub update_count: usize,
    pub roadmap_item_count: usize,
}

#[derive(Debug, Serialize)]
pub struct StatusCount {
    pub status: DeliverableStatus,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub dev_mode: bool,
}
