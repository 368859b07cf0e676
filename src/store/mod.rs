//! Credential store interface
//!
//! Narrow lookup/update surface over users and family groups - allows
//! swapping implementations (in-memory for tests, MongoDB for prod).

#[cfg(test)]
mod memory;
mod mongo;

#[cfg(test)]
pub use memory::MemoryStore;
pub use mongo::MongoAccountStore;

use bson::oid::ObjectId;

use crate::db::schemas::{FamilyGroupDoc, UserDoc};
use crate::types::Result;

/// Partial profile update. Role and password are immutable through
/// the profile path and have no fields here.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

#[async_trait::async_trait]
pub trait AccountStore: Send + Sync {
    // Users

    async fn find_user_by_id(&self, user_id: &ObjectId) -> Result<Option<UserDoc>>;

    /// Email lookups are exact-match on the stored lowercase form
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserDoc>>;

    /// Insert a user. A duplicate email reports as a conflict, even
    /// when two registrations race past the caller's duplicate check.
    async fn insert_user(&self, user: UserDoc) -> Result<ObjectId>;

    async fn update_user_profile(&self, user_id: &ObjectId, update: ProfileUpdate) -> Result<()>;

    /// Set the user's family group only if it is currently unset.
    /// Returns false when the user was already affiliated (or missing),
    /// so concurrent claims cannot double-affiliate a user.
    async fn claim_user_for_group(&self, user_id: &ObjectId, group_id: &ObjectId) -> Result<bool>;

    async fn clear_user_family_group(&self, user_id: &ObjectId) -> Result<()>;

    async fn delete_user(&self, user_id: &ObjectId) -> Result<()>;

    // Family groups

    async fn find_group_by_id(&self, group_id: &ObjectId) -> Result<Option<FamilyGroupDoc>>;

    async fn find_group_by_parent(&self, parent_id: &ObjectId) -> Result<Option<FamilyGroupDoc>>;

    /// Group where the user is either the head or a listed member
    async fn find_group_for_user(&self, user_id: &ObjectId) -> Result<Option<FamilyGroupDoc>>;

    async fn insert_group(&self, group: FamilyGroupDoc) -> Result<ObjectId>;

    /// Add a member id to the group's member set (no duplicates)
    async fn push_group_member(&self, group_id: &ObjectId, member_id: &ObjectId) -> Result<()>;

    /// Remove a member id from the group's member set (absent id is a no-op)
    async fn pull_group_member(&self, group_id: &ObjectId, member_id: &ObjectId) -> Result<()>;

    async fn rename_group(&self, group_id: &ObjectId, name: &str) -> Result<()>;

    async fn delete_group(&self, group_id: &ObjectId) -> Result<()>;
}
