//! Family group document schema
//!
//! A group has exactly one owning parent (the head) and a set of member
//! references. Members are distinct from the head and from each other.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for family groups
pub const FAMILY_GROUP_COLLECTION: &str = "family_groups";

/// Family group document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct FamilyGroupDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Group display name
    pub name: String,

    /// The parent user owning this group
    pub parent_id: ObjectId,

    /// Member user ids, never containing parent_id
    #[serde(default)]
    pub members: Vec<ObjectId>,
}

impl FamilyGroupDoc {
    /// Create a new group for a parent with an empty member set
    pub fn new(name: String, parent_id: ObjectId) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            name,
            parent_id,
            members: Vec::new(),
        }
    }
}

impl IntoIndexes for FamilyGroupDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // One group per head
            (
                doc! { "parent_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("parent_unique".to_string())
                        .build(),
                ),
            ),
            // Index on members for head-or-member lookups
            (
                doc! { "members": 1 },
                Some(
                    IndexOptions::builder()
                        .name("members_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for FamilyGroupDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
