//! # Agency Portal
//!
//! A multi-tenant agency/client portal API on top of a hosted relational
//! store, a hosted identity provider, and object storage.
//!
//! ## Request flow
//!
//! ```text
//!   request ──▶ require_identity ──▶ verify_access ──▶ handler
//!                 (session token)     (membership,      (store reads/
//!                                      role floor)       writes)
//! ```
//!
//! Every workspace-scoped route resolves the caller's identity, verifies
//! membership and role through `access::verify_access`, and only then
//! touches org data. Deliverable status changes additionally pass through
//! the transition table in `deliverable`.
//!
//! ## Modules
//! - `access`: workspace access verification (the single enforcement point)
//! - `deliverable`: status machine, precondition validators, progress
//! - `provision`: resolve-or-provision with the portal's one retry policy
//! - `store`: typed PostgREST + Storage client
//! - `identity`: session-token verification and provider metadata
//! - `api`: axum routes and handlers

pub mod access;
pub mod api;
pub mod config;
pub mod deliverable;
pub mod error;
pub mod identity;
pub mod provision;
pub mod store;

pub use config::Config;
pub use error::PortalError;
