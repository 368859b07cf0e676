//! User document schema
//!
//! Stores account credentials, the user's role, and the optional
//! reference to the family group the user belongs to.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// Closed set of account roles.
///
/// Wire names are "Parent", "family_member", and "individual";
/// anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Role {
    Parent,
    #[serde(rename = "family_member")]
    FamilyMember,
    #[default]
    #[serde(rename = "individual")]
    Individual,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Parent => write!(f, "Parent"),
            Role::FamilyMember => write!(f, "family_member"),
            Role::Individual => write!(f, "individual"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Parent" => Ok(Role::Parent),
            "family_member" => Ok(Role::FamilyMember),
            "individual" => Ok(Role::Individual),
            other => Err(format!("{} is not a valid role", other)),
        }
    }
}

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Display name
    pub name: String,

    /// Email address (stored lowercase, unique)
    pub email: String,

    /// Argon2 password hash, never exposed in responses
    pub password_hash: String,

    /// Account role
    #[serde(default)]
    pub role: Role,

    /// Family group this user belongs to, if any.
    /// Mutated only through the family membership service.
    #[serde(default)]
    pub family_group_id: Option<ObjectId>,
}

impl UserDoc {
    /// Create a new user document
    pub fn new(name: String, email: String, password_hash: String, role: Role) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            name,
            email,
            password_hash,
            role,
            family_group_id: None,
        }
    }

    /// Display-safe summary for API responses (no password hash)
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self._id.map(|id| id.to_hex()).unwrap_or_default(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            family_group_id: self.family_group_id.map(|id| id.to_hex()),
        }
    }
}

/// Display-safe user projection returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_group_id: Option<String>,
}

/// Validate email format: one @, non-empty local and domain parts,
/// domain with a dotted TLD of at least two characters.
pub fn validate_email(email: &str) -> bool {
    if email.contains(' ') || email.matches('@').count() != 1 {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.is_empty() {
        return false;
    }

    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };

    !host.is_empty()
        && !host.starts_with('.')
        && !host.ends_with('.')
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Unique index on email
            (
                doc! { "email": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("email_unique".to_string())
                        .build(),
                ),
            ),
            // Index on family_group_id for membership lookups
            (
                doc! { "family_group_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("family_group_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for UserDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
