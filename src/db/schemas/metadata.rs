//! Lifecycle bookkeeping embedded in every stored document
//!
//! Documents are never hard-deleted: reads filter on `is_deleted` and
//! the delete path stamps `deleted_at`, which is what lets a failed
//! registration roll its writes back without losing history.

use bson::DateTime;
use serde::{Deserialize, Serialize};

/// Timestamps and soft-delete state carried by each document
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,

    /// Set instead of removing the document
    #[serde(default)]
    pub is_deleted: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime>,
}

impl Metadata {
    /// Fresh metadata stamped with the current time
    pub fn new() -> Self {
        let now = DateTime::now();
        Self {
            created_at: Some(now),
            updated_at: Some(now),
            is_deleted: false,
            deleted_at: None,
        }
    }
}
