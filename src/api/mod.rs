//! HTTP API surface.

pub mod auth;
pub mod deliverables;
pub mod onboarding;
pub mod orgs;
pub mod reports;
pub mod roadmap;
pub mod routes;
pub mod types;
pub mod updates;
