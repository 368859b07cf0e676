//! In-memory account store
//!
//! Backs the membership invariant tests; mirrors the MongoDB store's
//! semantics, including the conditional claim on family_group_id.

use bson::oid::ObjectId;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::db::schemas::{FamilyGroupDoc, UserDoc};
use crate::store::{AccountStore, ProfileUpdate};
use crate::types::{HearthError, Result};

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<ObjectId, UserDoc>>,
    groups: Mutex<HashMap<ObjectId, FamilyGroupDoc>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl AccountStore for MemoryStore {
    async fn find_user_by_id(&self, user_id: &ObjectId) -> Result<Option<UserDoc>> {
        Ok(self.users.lock().unwrap().get(user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserDoc>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert_user(&self, mut user: UserDoc) -> Result<ObjectId> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(HearthError::Conflict("User already exists".into()));
        }

        let id = ObjectId::new();
        user._id = Some(id);
        users.insert(id, user);
        Ok(id)
    }

    async fn update_user_profile(&self, user_id: &ObjectId, update: ProfileUpdate) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| HearthError::NotFound("User not found".into()))?;

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        Ok(())
    }

    async fn claim_user_for_group(&self, user_id: &ObjectId, group_id: &ObjectId) -> Result<bool> {
        let mut users = self.users.lock().unwrap();
        match users.get_mut(user_id) {
            Some(user) if user.family_group_id.is_none() => {
                user.family_group_id = Some(*group_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear_user_family_group(&self, user_id: &ObjectId) -> Result<()> {
        if let Some(user) = self.users.lock().unwrap().get_mut(user_id) {
            user.family_group_id = None;
        }
        Ok(())
    }

    async fn delete_user(&self, user_id: &ObjectId) -> Result<()> {
        self.users.lock().unwrap().remove(user_id);
        Ok(())
    }

    async fn find_group_by_id(&self, group_id: &ObjectId) -> Result<Option<FamilyGroupDoc>> {
        Ok(self.groups.lock().unwrap().get(group_id).cloned())
    }

    async fn find_group_by_parent(&self, parent_id: &ObjectId) -> Result<Option<FamilyGroupDoc>> {
        Ok(self
            .groups
            .lock()
            .unwrap()
            .values()
            .find(|g| g.parent_id == *parent_id)
            .cloned())
    }

    async fn find_group_for_user(&self, user_id: &ObjectId) -> Result<Option<FamilyGroupDoc>> {
        Ok(self
            .groups
            .lock()
            .unwrap()
            .values()
            .find(|g| g.parent_id == *user_id || g.members.contains(user_id))
            .cloned())
    }

    async fn insert_group(&self, mut group: FamilyGroupDoc) -> Result<ObjectId> {
        let id = ObjectId::new();
        group._id = Some(id);
        self.groups.lock().unwrap().insert(id, group);
        Ok(id)
    }

    async fn push_group_member(&self, group_id: &ObjectId, member_id: &ObjectId) -> Result<()> {
        let mut groups = self.groups.lock().unwrap();
        let group = groups
            .get_mut(group_id)
            .ok_or_else(|| HearthError::NotFound("Family group not found".into()))?;

        if !group.members.contains(member_id) {
            group.members.push(*member_id);
        }
        Ok(())
    }

    async fn pull_group_member(&self, group_id: &ObjectId, member_id: &ObjectId) -> Result<()> {
        let mut groups = self.groups.lock().unwrap();
        let group = groups
            .get_mut(group_id)
            .ok_or_else(|| HearthError::NotFound("Family group not found".into()))?;

        group.members.retain(|m| m != member_id);
        Ok(())
    }

    async fn rename_group(&self, group_id: &ObjectId, name: &str) -> Result<()> {
        let mut groups = self.groups.lock().unwrap();
        let group = groups
            .get_mut(group_id)
            .ok_or_else(|| HearthError::NotFound("Family group not found".into()))?;

        group.name = name.to_string();
        Ok(())
    }

    async fn delete_group(&self, group_id: &ObjectId) -> Result<()> {
        self.groups.lock().unwrap().remove(group_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::Role;

    #[tokio::test]
    async fn test_insert_user_duplicate_email_is_conflict() {
        let store = MemoryStore::new();
        let user = |name: &str| {
            UserDoc::new(
                name.into(),
                "a@x.com".into(),
                "$argon2id$fake".into(),
                Role::Individual,
            )
        };

        store.insert_user(user("Alice")).await.unwrap();

        // Insert without a prior lookup, as a racing registration would
        let err = store.insert_user(user("Other")).await.unwrap_err();
        assert!(matches!(err, HearthError::Conflict(_)));
        assert_eq!(err.to_string(), "User already exists");
    }
}
