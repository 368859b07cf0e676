//! Family membership management
//!
//! Enforces the invariants governing group creation, single-group
//! membership, and parent-only mutation rights:
//! - a Parent owns exactly one group, created with registration
//! - a non-head belongs to at most one group at a time
//! - the user's family_group_id and the group's member set must agree
//! - only the head may mutate a group's name or member set

use bson::oid::ObjectId;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::db::schemas::{FamilyGroupDoc, Role, UserDoc, UserSummary};
use crate::store::AccountStore;
use crate::types::{HearthError, Result};

/// Group with head and members resolved to display-safe summaries
#[derive(Debug, Clone, Serialize)]
pub struct GroupView {
    pub id: String,
    pub name: String,
    pub head: UserSummary,
    pub members: Vec<UserSummary>,
}

/// Family membership manager over the account store
#[derive(Clone)]
pub struct FamilyService {
    store: Arc<dyn AccountStore>,
}

impl FamilyService {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Create the group owned by a freshly registered parent and link the
    /// parent to it. The link uses the same conditional claim as member
    /// adds; if it fails the group is rolled back so no orphaned group
    /// remains.
    pub async fn create_group_for_parent(&self, parent: &UserDoc) -> Result<FamilyGroupDoc> {
        let parent_id = parent
            ._id
            .ok_or_else(|| HearthError::Internal("Parent user has no id".into()))?;

        let mut group = FamilyGroupDoc::new(format!("{}'s Family", parent.name), parent_id);
        let group_id = self.store.insert_group(group.clone()).await?;
        group._id = Some(group_id);

        let claimed = self.store.claim_user_for_group(&parent_id, &group_id).await;
        match claimed {
            Ok(true) => Ok(group),
            Ok(false) => {
                self.store.delete_group(&group_id).await?;
                Err(HearthError::Conflict(
                    "User is already part of a family group".into(),
                ))
            }
            Err(e) => {
                // Roll back the group so the parent is not left half-linked
                if let Err(rollback) = self.store.delete_group(&group_id).await {
                    warn!("Failed to roll back group {}: {}", group_id, rollback);
                }
                Err(e)
            }
        }
    }

    /// Group where the requesting user is the head or a listed member
    pub async fn get_group(&self, requesting_user: &UserDoc) -> Result<GroupView> {
        let user_id = requesting_user
            ._id
            .ok_or_else(|| HearthError::Internal("User has no id".into()))?;

        let group = self
            .store
            .find_group_for_user(&user_id)
            .await?
            .ok_or_else(|| HearthError::NotFound("Family group not found".into()))?;

        self.resolve_view(group).await
    }

    /// Add a member to the requesting parent's group
    pub async fn add_member(
        &self,
        requesting_user: &UserDoc,
        member_id: &ObjectId,
    ) -> Result<GroupView> {
        self.require_parent(requesting_user, "Only parents can add family members")?;
        let group = self.owned_group(requesting_user).await?;
        let group_id = group
            ._id
            .ok_or_else(|| HearthError::Internal("Group has no id".into()))?;

        let candidate = self
            .store
            .find_user_by_id(member_id)
            .await?
            .ok_or_else(|| HearthError::NotFound("User not found".into()))?;

        if candidate.family_group_id.is_some() {
            return Err(HearthError::Conflict(
                "User is already part of a family group".into(),
            ));
        }

        // Drift guard: a listed member with an unset family_group_id can
        // only happen if the two fields have diverged. Treat the add as a
        // no-op instead of inserting a duplicate.
        if group.members.contains(member_id) {
            return self.resolve_view(group).await;
        }

        // Conditional claim closes the read-check-write race: two
        // concurrent adds cannot both see an unaffiliated candidate and win.
        let claimed = self.store.claim_user_for_group(member_id, &group_id).await?;
        if !claimed {
            return Err(HearthError::Conflict(
                "User is already part of a family group".into(),
            ));
        }

        self.store.push_group_member(&group_id, member_id).await?;

        let updated = self
            .store
            .find_group_by_id(&group_id)
            .await?
            .ok_or_else(|| HearthError::NotFound("Family group not found".into()))?;
        self.resolve_view(updated).await
    }

    /// Remove a member from the requesting parent's group. Removing an id
    /// that is not in the member set succeeds and leaves the group
    /// unchanged; the target user's group reference is cleared either way.
    pub async fn remove_member(
        &self,
        requesting_user: &UserDoc,
        member_id: &ObjectId,
    ) -> Result<GroupView> {
        self.require_parent(requesting_user, "Only parents can remove family members")?;
        let group = self.owned_group(requesting_user).await?;
        let group_id = group
            ._id
            .ok_or_else(|| HearthError::Internal("Group has no id".into()))?;

        self.store.pull_group_member(&group_id, member_id).await?;
        self.store.clear_user_family_group(member_id).await?;

        let updated = self
            .store
            .find_group_by_id(&group_id)
            .await?
            .ok_or_else(|| HearthError::NotFound("Family group not found".into()))?;
        self.resolve_view(updated).await
    }

    /// Rename the requesting parent's group
    pub async fn rename_group(
        &self,
        requesting_user: &UserDoc,
        new_name: &str,
    ) -> Result<GroupView> {
        self.require_parent(requesting_user, "Only parents can update family group")?;
        let group = self.owned_group(requesting_user).await?;
        let group_id = group
            ._id
            .ok_or_else(|| HearthError::Internal("Group has no id".into()))?;

        self.store.rename_group(&group_id, new_name).await?;

        let updated = self
            .store
            .find_group_by_id(&group_id)
            .await?
            .ok_or_else(|| HearthError::NotFound("Family group not found".into()))?;
        self.resolve_view(updated).await
    }

    /// Role contract re-asserted here even though routes gate upstream
    fn require_parent(&self, user: &UserDoc, message: &str) -> Result<()> {
        match user.role {
            Role::Parent => Ok(()),
            Role::FamilyMember | Role::Individual => {
                Err(HearthError::Forbidden(message.to_string()))
            }
        }
    }

    async fn owned_group(&self, user: &UserDoc) -> Result<FamilyGroupDoc> {
        let user_id = user
            ._id
            .ok_or_else(|| HearthError::Internal("User has no id".into()))?;

        self.store
            .find_group_by_parent(&user_id)
            .await?
            .ok_or_else(|| HearthError::NotFound("Family group not found".into()))
    }

    async fn resolve_view(&self, group: FamilyGroupDoc) -> Result<GroupView> {
        let group_id = group
            ._id
            .ok_or_else(|| HearthError::Internal("Group has no id".into()))?;

        let head = self
            .store
            .find_user_by_id(&group.parent_id)
            .await?
            .ok_or_else(|| HearthError::Internal("Group head not found".into()))?;

        let mut members = Vec::with_capacity(group.members.len());
        for member_id in &group.members {
            match self.store.find_user_by_id(member_id).await? {
                Some(member) => members.push(member.summary()),
                None => warn!("Group {} references missing member {}", group_id, member_id),
            }
        }

        Ok(GroupView {
            id: group_id.to_hex(),
            name: group.name,
            head: head.summary(),
            members,
        })
    }
}
