//! Router assembly and server startup.

use std::sync::Arc;

use axum::middleware;
use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::identity::IdentityProvider;
use crate::provision::ProvisionPolicy;
use crate::store::PortalStore;

use super::auth;
use super::deliverables;
use super::onboarding;
use super::orgs;
use super::reports;
use super::roadmap;
use super::types::HealthResponse;
use super::updates;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Hosted relational store + object storage.
    pub store: PortalStore,
    /// Identity provider management API, when configured.
    pub identity_provider: Option<IdentityProvider>,
    /// The portal-wide resolve-or-provision retry policy.
    pub provision_policy: ProvisionPolicy,
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let store = PortalStore::new(&config.store_url, &config.store_service_key);

    let identity_provider = match (&config.identity_api_url, &config.identity_api_key) {
        (Some(url), Some(key)) => Some(IdentityProvider::new(url, key)),
        _ => {
            tracing::info!("identity provider management API not configured");
            None
        }
    };

    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        identity_provider,
        provision_policy: ProvisionPolicy::default(),
    });

    let public_routes = Router::new().route("/api/health", get(health));

    // Asset uploads carry files; give them a larger body limit.
    let upload_route = Router::new()
        .route(
            "/api/orgs/:org/deliverables/:id/upload",
            post(deliverables::upload_asset),
        )
        .layer(DefaultBodyLimit::max(100 * 1024 * 1024));

    let protected_routes = Router::new()
        .route("/api/orgs/bootstrap", post(orgs::bootstrap))
        .route("/api/orgs/:org/members", get(orgs::list_members))
        .route(
            "/api/orgs/:org/onboarding/progress",
            get(onboarding::list_progress).post(onboarding::complete_node),
        )
        .route(
            "/api/orgs/:org/onboarding/contract",
            post(onboarding::sign_contract),
        )
        .route(
            "/api/orgs/:org/deliverables",
            get(deliverables::list).post(deliverables::create),
        )
        .route(
            "/api/orgs/:org/deliverables/:id/status",
            post(deliverables::transition),
        )
        .merge(upload_route)
        .route(
            "/api/orgs/:org/updates",
            get(updates::list).post(updates::create),
        )
        .route(
            "/api/orgs/:org/roadmap",
            get(roadmap::list).post(roadmap::create),
        )
        .route("/api/orgs/:org/reports/generate", post(reports::generate))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_identity,
        ));

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::clone(&state));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Portal API listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        dev_mode: state.config.dev_mode,
    })
}
