//! Hosted relational store and object storage.

pub mod client;
pub mod types;

pub use client::{object_key, PortalStore};
