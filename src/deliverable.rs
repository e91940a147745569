//! Deliverable status machine and progress bookkeeping.
//!
//! All status legality comes from one transition table ([`allowed_from`]);
//! the precondition validators consult the same table rather than keeping a
//! separate copy of which statuses may reach `complete`. Progress is derived
//! from the checklist and is an input here, never mutated.

use serde::{Deserialize, Serialize};

use crate::store::types::{Deliverable, DeliverableAsset};

/// Lifecycle status of a deliverable. `Complete` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliverableStatus {
    Planned,
    InProgress,
    InReview,
    Approved,
    Complete,
    Blocked,
    RevisionsRequested,
}

impl DeliverableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::InProgress => "in_progress",
            Self::InReview => "in_review",
            Self::Approved => "approved",
            Self::Complete => "complete",
            Self::Blocked => "blocked",
            Self::RevisionsRequested => "revisions_requested",
        }
    }
}

impl std::fmt::Display for DeliverableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Legal transitions out of each status.
pub fn allowed_from(current: DeliverableStatus) -> &'static [DeliverableStatus] {
    use DeliverableStatus::*;
    match current {
        Planned => &[InProgress, Blocked],
        InProgress => &[InReview, Blocked, Planned],
        InReview => &[Approved, RevisionsRequested, Blocked],
        Approved => &[Complete, InReview],
        // Terminal: no outgoing transitions.
        Complete => &[],
        Blocked => &[Planned, InProgress],
        RevisionsRequested => &[InProgress, Blocked],
    }
}

/// Outcome of a transition check.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionCheck {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TransitionCheck {
    fn ok() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn denied(reason: String) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}

/// Check whether `deliverable` may move to `new` per the transition table.
pub fn can_transition(new: DeliverableStatus, deliverable: &Deliverable) -> TransitionCheck {
    if allowed_from(deliverable.status).contains(&new) {
        TransitionCheck::ok()
    } else {
        TransitionCheck::denied(format!(
            "Cannot transition from {} to {}",
            deliverable.status, new
        ))
    }
}

fn has_required_proof(assets: &[DeliverableAsset]) -> bool {
    assets.iter().any(|a| a.is_required_proof)
}

/// Preconditions for sending a deliverable into review: progress must be at
/// least 80 and a required-proof asset must be attached.
pub fn validate_send_to_review(
    deliverable: &Deliverable,
    assets: &[DeliverableAsset],
) -> TransitionCheck {
    if deliverable.progress < 80 {
        return TransitionCheck::denied(format!(
            "Progress must reach 80% before review (currently {}%)",
            deliverable.progress
        ));
    }
    if !has_required_proof(assets) {
        return TransitionCheck::denied(
            "A required proof asset must be attached before review".to_string(),
        );
    }
    TransitionCheck::ok()
}

/// Preconditions for completing a deliverable: a required-proof asset must
/// exist and the current status must be able to reach `complete` (per the
/// table, only `approved` can).
pub fn validate_complete(
    deliverable: &Deliverable,
    assets: &[DeliverableAsset],
) -> TransitionCheck {
    if !has_required_proof(assets) {
        return TransitionCheck::denied(
            "A required proof asset must be attached before completion".to_string(),
        );
    }
    if !allowed_from(deliverable.status).contains(&DeliverableStatus::Complete) {
        return TransitionCheck::denied(format!(
            "Deliverable must be approved before completion (currently {})",
            deliverable.status
        ));
    }
    TransitionCheck::ok()
}

/// One item on a deliverable's checklist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub label: String,
    pub done: bool,
}

/// Percentage of checklist items done, rounded. Empty checklist is 0.
pub fn calculate_progress(items: &[ChecklistItem]) -> i32 {
    if items.is_empty() {
        return 0;
    }
    let done = items.iter().filter(|i| i.done).count();
    ((100.0 * done as f64) / items.len() as f64).round() as i32
}

/// A deliverable at 80%+ can move into its finishing phase.
pub fn is_ready_for_finishing_touches(progress: i32) -> bool {
    progress >= 80
}
