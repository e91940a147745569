//! Report generation.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use std::sync::Arc;

use super::routes::AppState;
use super::types::{data, Data, Report, StatusCount};
use crate::access::{verify_access, WorkspaceRef};
use crate::deliverable::DeliverableStatus;
use crate::error::PortalError;
use crate::identity::Identity;
use crate::store::types::{Deliverable, Role};

/// POST /api/orgs/:org/reports/generate - aggregate the org's deliverable
/// and activity state into a report (admin).
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(org): Path<String>,
) -> Result<Json<Data<Report>>, PortalError> {
    let workspace = WorkspaceRef::parse(&org);
    let access =
        verify_access(&state.store, Some(&identity), &workspace, Some(Role::Admin)).await?;

    let deliverables = state.store.list_deliverables(access.org.id).await?;
    let updates = state.store.list_updates(access.org.id).await?;
    let roadmap = state.store.list_roadmap(access.org.id).await?;

    let report = build_report(&access.org.name, access.org.id, &deliverables, updates.len(), roadmap.len());
    tracing::info!("report generated for org {}", access.org.id);
    Ok(data(report))
}

fn build_report(
    org_name: &str,
    org_id: uuid::Uuid,
    deliverables: &[Deliverable],
    update_count: usize,
    roadmap_item_count: usize,
) -> Report {
    use DeliverableStatus::*;
    let all_statuses = [
        Planned,
        InProgress,
        InReview,
        Approved,
        Complete,
        Blocked,
        RevisionsRequested,
    ];

    let status_counts = all_statuses
        .iter()
        .map(|s| StatusCount {
            status: *s,
            count: deliverables.iter().filter(|d| d.status == *s).count(),
        })
        .filter(|c| c.count > 0)
        .collect();

    let completed_count = deliverables.iter().filter(|d| d.status == Complete).count();
    let average_progress = if deliverables.is_empty() {
        0
    } else {
        let total: i64 = deliverables.iter().map(|d| d.progress as i64).sum();
        (total as f64 / deliverables.len() as f64).round() as i32
    };

    Report {
        org_id,
        org_name: org_name.to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        deliverable_count: deliverables.len(),
        completed_count,
        average_progress,
        status_counts,
        update_count,
        roadmap_item_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn deliverable(status: DeliverableStatus, progress: i32) -> Deliverable {
        Deliverable {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            title: "x".to_string(),
            status,
            progress,
            client_visible: true,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: None,
        }
    }

    #[test]
    fn test_empty_report() {
        let report = build_report("Acme", Uuid::new_v4(), &[], 0, 0);
        assert_eq!(report.deliverable_count, 0);
        assert_eq!(report.average_progress, 0);
        assert!(report.status_counts.is_empty());
    }

    #[test]
    fn test_report_aggregates() {
        let deliverables = vec![
            deliverable(DeliverableStatus::Complete, 100),
            deliverable(DeliverableStatus::InProgress, 40),
            deliverable(DeliverableStatus::InProgress, 60),
        ];
        let report = build_report("Acme", Uuid::new_v4(), &deliverables, 2, 5);

        assert_eq!(report.deliverable_count, 3);
        assert_eq!(report.completed_count, 1);
        assert_eq!(report.average_progress, 67);
        assert_eq!(report.update_count, 2);
        assert_eq!(report.roadmap_item_count, 5);

        let in_progress = report
            .status_counts
            .iter()
            .find(|c| c.status == DeliverableStatus::InProgress)
            .unwrap();
        assert_eq!(in_progress.count, 2);
    }
}
