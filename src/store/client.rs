//! Client for the hosted datastore's PostgREST and Storage APIs.
//!
//! Every table read/write is filtered by `org_id`; no cross-tenant query is
//! ever issued. Failures surface as [`PortalError::Upstream`] with the
//! store's status and body for diagnosis.

use reqwest::Client;
use uuid::Uuid;

use crate::deliverable::DeliverableStatus;
use crate::error::PortalError;
use crate::store::types::*;

/// Client for database and storage operations.
pub struct PortalStore {
    client: Client,
    url: String,
    service_key: String,
}

impl PortalStore {
    pub fn new(url: &str, service_key: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        }
    }

    fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.url)
    }

    fn storage_url(&self) -> String {
        format!("{}/storage/v1", self.url)
    }

    fn auth_headers(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
    }

    async fn expect_success(
        resp: reqwest::Response,
        what: &str,
    ) -> Result<reqwest::Response, PortalError> {
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PortalError::Upstream(format!(
                "{} failed: {} - {}",
                what, status, text
            )));
        }
        Ok(resp)
    }

    /// Fetch rows and return the first one, if any.
    async fn fetch_first<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        what: &str,
    ) -> Result<Option<T>, PortalError> {
        let resp = self.auth_headers(self.client.get(url)).send().await?;
        let resp = Self::expect_success(resp, what).await?;
        let mut rows: Vec<T> = resp.json().await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    async fn fetch_all<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        what: &str,
    ) -> Result<Vec<T>, PortalError> {
        let resp = self.auth_headers(self.client.get(url)).send().await?;
        let resp = Self::expect_success(resp, what).await?;
        Ok(resp.json().await?)
    }

    /// Insert a row and return the stored representation.
    async fn insert_returning<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        body: serde_json::Value,
    ) -> Result<T, PortalError> {
        let resp = self
            .auth_headers(self.client.post(format!("{}/{}", self.rest_url(), table)))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;
        let what = format!("insert into {}", table);
        let resp = Self::expect_success(resp, &what).await?;
        let rows: Vec<T> = resp.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| PortalError::Upstream(format!("{}: no row returned", what)))
    }

    // ==================== Orgs ====================

    pub async fn get_org(&self, id: Uuid) -> Result<Option<Org>, PortalError> {
        self.fetch_first(format!("{}/orgs?id=eq.{}", self.rest_url(), id), "get org")
            .await
    }

    pub async fn find_org_by_external_ref(
        &self,
        external_ref: &str,
    ) -> Result<Option<Org>, PortalError> {
        self.fetch_first(
            format!(
                "{}/orgs?external_ref=eq.{}",
                self.rest_url(),
                urlencoding::encode(external_ref)
            ),
            "find org by external ref",
        )
        .await
    }

    pub async fn create_org(
        &self,
        name: &str,
        kind: OrgKind,
        external_ref: Option<&str>,
    ) -> Result<Org, PortalError> {
        self.insert_returning(
            "orgs",
            serde_json::json!({
                "name": name,
                "kind": kind,
                "external_ref": external_ref,
            }),
        )
        .await
    }

    // ==================== Memberships ====================

    pub async fn find_membership(
        &self,
        org_id: Uuid,
        user_id: &str,
    ) -> Result<Option<Membership>, PortalError> {
        self.fetch_first(
            format!(
                "{}/org_members?org_id=eq.{}&user_id=eq.{}",
                self.rest_url(),
                org_id,
                urlencoding::encode(user_id)
            ),
            "find membership",
        )
        .await
    }

    pub async fn list_memberships(&self, org_id: Uuid) -> Result<Vec<Membership>, PortalError> {
        self.fetch_all(
            format!(
                "{}/org_members?org_id=eq.{}&order=created_at",
                self.rest_url(),
                org_id
            ),
            "list memberships",
        )
        .await
    }

    pub async fn create_membership(
        &self,
        org_id: Uuid,
        user_id: &str,
        role: Role,
    ) -> Result<Membership, PortalError> {
        self.insert_returning(
            "org_members",
            serde_json::json!({
                "org_id": org_id,
                "user_id": user_id,
                "role": role,
            }),
        )
        .await
    }

    // ==================== Deliverables ====================

    pub async fn list_deliverables(&self, org_id: Uuid) -> Result<Vec<Deliverable>, PortalError> {
        self.fetch_all(
            format!(
                "{}/deliverables?org_id=eq.{}&order=created_at",
                self.rest_url(),
                org_id
            ),
            "list deliverables",
        )
        .await
    }

    pub async fn get_deliverable(
        &self,
        org_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Deliverable>, PortalError> {
        self.fetch_first(
            format!(
                "{}/deliverables?org_id=eq.{}&id=eq.{}",
                self.rest_url(),
                org_id,
                id
            ),
            "get deliverable",
        )
        .await
    }

    pub async fn create_deliverable(
        &self,
        org_id: Uuid,
        title: &str,
        client_visible: bool,
    ) -> Result<Deliverable, PortalError> {
        self.insert_returning(
            "deliverables",
            serde_json::json!({
                "org_id": org_id,
                "title": title,
                "status": DeliverableStatus::Planned,
                "progress": 0,
                "client_visible": client_visible,
            }),
        )
        .await
    }

    pub async fn update_deliverable_status(
        &self,
        org_id: Uuid,
        id: Uuid,
        status: DeliverableStatus,
    ) -> Result<(), PortalError> {
        let resp = self
            .auth_headers(self.client.patch(format!(
                "{}/deliverables?org_id=eq.{}&id=eq.{}",
                self.rest_url(),
                org_id,
                id
            )))
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "status": status,
                "updated_at": chrono::Utc::now().to_rfc3339(),
            }))
            .send()
            .await?;
        Self::expect_success(resp, "update deliverable status").await?;
        Ok(())
    }

    pub async fn list_assets(
        &self,
        deliverable_id: Uuid,
    ) -> Result<Vec<DeliverableAsset>, PortalError> {
        self.fetch_all(
            format!(
                "{}/deliverable_assets?deliverable_id=eq.{}&order=created_at",
                self.rest_url(),
                deliverable_id
            ),
            "list assets",
        )
        .await
    }

    pub async fn insert_asset(
        &self,
        deliverable_id: Uuid,
        kind: &str,
        url: &str,
        is_required_proof: bool,
        proof_type: Option<&str>,
    ) -> Result<DeliverableAsset, PortalError> {
        self.insert_returning(
            "deliverable_assets",
            serde_json::json!({
                "deliverable_id": deliverable_id,
                "kind": kind,
                "url": url,
                "is_required_proof": is_required_proof,
                "proof_type": proof_type,
            }),
        )
        .await
    }

    // ==================== Onboarding ====================

    pub async fn list_onboarding_progress(
        &self,
        org_id: Uuid,
        user_id: &str,
    ) -> Result<Vec<OnboardingProgress>, PortalError> {
        self.fetch_all(
            format!(
                "{}/onboarding_progress?org_id=eq.{}&user_id=eq.{}&order=node_id",
                self.rest_url(),
                org_id,
                urlencoding::encode(user_id)
            ),
            "list onboarding progress",
        )
        .await
    }

    /// Upsert one (org, user, node) onboarding row.
    pub async fn upsert_onboarding_progress(
        &self,
        row: &OnboardingProgress,
    ) -> Result<OnboardingProgress, PortalError> {
        let resp = self
            .auth_headers(self.client.post(format!(
                "{}/onboarding_progress?on_conflict=org_id,user_id,node_id",
                self.rest_url()
            )))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation,resolution=merge-duplicates")
            .json(row)
            .send()
            .await?;
        let resp = Self::expect_success(resp, "upsert onboarding progress").await?;
        let rows: Vec<OnboardingProgress> = resp.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| PortalError::Upstream("upsert: no row returned".to_string()))
    }

    // ==================== Contract signatures ====================

    pub async fn insert_contract_signature(
        &self,
        org_id: Uuid,
        user_id: &str,
        signer_name: &str,
    ) -> Result<ContractSignature, PortalError> {
        self.insert_returning(
            "contract_signatures",
            serde_json::json!({
                "org_id": org_id,
                "user_id": user_id,
                "signer_name": signer_name,
                "signed_at": chrono::Utc::now().to_rfc3339(),
            }),
        )
        .await
    }

    // ==================== Weekly updates ====================

    pub async fn list_updates(&self, org_id: Uuid) -> Result<Vec<WeeklyUpdate>, PortalError> {
        self.fetch_all(
            format!(
                "{}/weekly_updates?org_id=eq.{}&order=created_at.desc",
                self.rest_url(),
                org_id
            ),
            "list updates",
        )
        .await
    }

    pub async fn insert_update(
        &self,
        org_id: Uuid,
        author_id: &str,
        title: &str,
        body: &str,
    ) -> Result<WeeklyUpdate, PortalError> {
        self.insert_returning(
            "weekly_updates",
            serde_json::json!({
                "org_id": org_id,
                "author_id": author_id,
                "title": title,
                "body": body,
            }),
        )
        .await
    }

    // ==================== Roadmap ====================

    pub async fn list_roadmap(&self, org_id: Uuid) -> Result<Vec<RoadmapItem>, PortalError> {
        self.fetch_all(
            format!(
                "{}/roadmap_items?org_id=eq.{}&order=sort_order",
                self.rest_url(),
                org_id
            ),
            "list roadmap",
        )
        .await
    }

    pub async fn insert_roadmap_item(
        &self,
        org_id: Uuid,
        title: &str,
        status: &str,
        sort_order: i32,
    ) -> Result<RoadmapItem, PortalError> {
        self.insert_returning(
            "roadmap_items",
            serde_json::json!({
                "org_id": org_id,
                "title": title,
                "status": status,
                "sort_order": sort_order,
            }),
        )
        .await
    }

    // ==================== Storage ====================

    /// Upload a file and return its durable public URL.
    pub async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<String, PortalError> {
        let resp = self
            .auth_headers(
                self.client
                    .post(format!("{}/object/{}/{}", self.storage_url(), bucket, path)),
            )
            .header("Content-Type", content_type)
            .body(content)
            .send()
            .await?;
        Self::expect_success(resp, "upload object").await?;
        Ok(format!(
            "{}/object/public/{}/{}",
            self.storage_url(),
            bucket,
            path
        ))
    }
}

/// Storage object key for an uploaded asset:
/// `{org_id}/{resource_id}/{timestamp}-{filename}`.
pub fn object_key(org_id: Uuid, resource_id: Uuid, filename: &str) -> String {
    // Keep only the final path component so the key stays under the org prefix.
    let safe = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    format!(
        "{}/{}/{}-{}",
        org_id,
        resource_id,
        chrono::Utc::now().timestamp_millis(),
        safe
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_is_org_scoped() {
        let org = Uuid::new_v4();
        let resource = Uuid::new_v4();
        let key = object_key(org, resource, "proof.pdf");
        assert!(key.starts_with(&format!("{}/{}/", org, resource)));
        assert!(key.ends_with("-proof.pdf"));
    }

    #[test]
    fn test_object_key_strips_separators() {
        let key = object_key(Uuid::new_v4(), Uuid::new_v4(), "../../escape.pdf");
        assert!(!key.contains(".."), "key: {}", key);
        let tail = key.rsplit('/').next().unwrap();
        assert!(tail.ends_with("escape.pdf"));
    }
}
