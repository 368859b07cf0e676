//! Hearth - multi-tenant family account service
//!
//! Users register with a role (Parent / family_member / individual);
//! parents automatically get a family group, and family groups can have
//! members added and removed under parent-only authorization.
//!
//! ## Components
//!
//! - **auth**: password hashing, token issuance/verification, and the
//!   authentication/role gates
//! - **db**: MongoDB client, typed collections, and document schemas
//! - **store**: narrow account-store interface with MongoDB and
//!   in-memory implementations
//! - **family**: the family membership manager and its invariants
//! - **routes** / **server**: hyper HTTP surface

pub mod auth;
pub mod config;
pub mod db;
pub mod family;
pub mod routes;
pub mod server;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{HearthError, Result};
