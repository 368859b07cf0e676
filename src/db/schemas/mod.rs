//! Database schemas for Hearth
//!
//! Defines MongoDB document structures for users and family groups.

mod family_group;
mod metadata;
mod user;

pub use family_group::{FamilyGroupDoc, FAMILY_GROUP_COLLECTION};
pub use metadata::Metadata;
pub use user::{validate_email, Role, UserDoc, UserSummary, USER_COLLECTION};
