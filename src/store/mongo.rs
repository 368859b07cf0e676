//! MongoDB-backed account store

use bson::{doc, oid::ObjectId, DateTime};

use crate::db::schemas::{
    FamilyGroupDoc, UserDoc, FAMILY_GROUP_COLLECTION, USER_COLLECTION,
};
use crate::db::{MongoClient, MongoCollection};
use crate::store::{AccountStore, ProfileUpdate};
use crate::types::{HearthError, Result};

/// Account store over MongoDB collections
#[derive(Clone)]
pub struct MongoAccountStore {
    mongo: MongoClient,
}

impl MongoAccountStore {
    pub fn new(mongo: MongoClient) -> Self {
        Self { mongo }
    }

    async fn users(&self) -> Result<MongoCollection<UserDoc>> {
        self.mongo.collection::<UserDoc>(USER_COLLECTION).await
    }

    async fn groups(&self) -> Result<MongoCollection<FamilyGroupDoc>> {
        self.mongo
            .collection::<FamilyGroupDoc>(FAMILY_GROUP_COLLECTION)
            .await
    }
}

#[async_trait::async_trait]
impl AccountStore for MongoAccountStore {
    async fn find_user_by_id(&self, user_id: &ObjectId) -> Result<Option<UserDoc>> {
        self.users().await?.find_one(doc! { "_id": user_id }).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserDoc>> {
        self.users().await?.find_one(doc! { "email": email }).await
    }

    async fn insert_user(&self, user: UserDoc) -> Result<ObjectId> {
        // The unique email index catches registrations racing past the
        // duplicate check; report those as the same conflict
        self.users()
            .await?
            .insert_one(user)
            .await
            .map_err(|e| match e {
                HearthError::Conflict(_) => HearthError::Conflict("User already exists".into()),
                other => other,
            })
    }

    async fn update_user_profile(&self, user_id: &ObjectId, update: ProfileUpdate) -> Result<()> {
        let mut set = doc! { "metadata.updated_at": DateTime::now() };
        if let Some(name) = update.name {
            set.insert("name", name);
        }
        if let Some(email) = update.email {
            set.insert("email", email);
        }

        self.users()
            .await?
            .update_one(doc! { "_id": user_id }, doc! { "$set": set })
            .await?;
        Ok(())
    }

    async fn claim_user_for_group(&self, user_id: &ObjectId, group_id: &ObjectId) -> Result<bool> {
        // Conditional update: matches only while family_group_id is unset
        let result = self
            .users()
            .await?
            .update_one(
                doc! { "_id": user_id, "family_group_id": null },
                doc! { "$set": {
                    "family_group_id": group_id,
                    "metadata.updated_at": DateTime::now(),
                } },
            )
            .await?;

        Ok(result.matched_count == 1)
    }

    async fn clear_user_family_group(&self, user_id: &ObjectId) -> Result<()> {
        self.users()
            .await?
            .update_one(
                doc! { "_id": user_id },
                doc! { "$set": {
                    "family_group_id": null,
                    "metadata.updated_at": DateTime::now(),
                } },
            )
            .await?;
        Ok(())
    }

    async fn delete_user(&self, user_id: &ObjectId) -> Result<()> {
        self.users().await?.soft_delete(doc! { "_id": user_id }).await?;
        Ok(())
    }

    async fn find_group_by_id(&self, group_id: &ObjectId) -> Result<Option<FamilyGroupDoc>> {
        self.groups().await?.find_one(doc! { "_id": group_id }).await
    }

    async fn find_group_by_parent(&self, parent_id: &ObjectId) -> Result<Option<FamilyGroupDoc>> {
        self.groups()
            .await?
            .find_one(doc! { "parent_id": parent_id })
            .await
    }

    async fn find_group_for_user(&self, user_id: &ObjectId) -> Result<Option<FamilyGroupDoc>> {
        self.groups()
            .await?
            .find_one(doc! {
                "$or": [
                    { "parent_id": user_id },
                    { "members": user_id },
                ]
            })
            .await
    }

    async fn insert_group(&self, group: FamilyGroupDoc) -> Result<ObjectId> {
        self.groups().await?.insert_one(group).await
    }

    async fn push_group_member(&self, group_id: &ObjectId, member_id: &ObjectId) -> Result<()> {
        self.groups()
            .await?
            .update_one(
                doc! { "_id": group_id },
                doc! {
                    "$addToSet": { "members": member_id },
                    "$set": { "metadata.updated_at": DateTime::now() },
                },
            )
            .await?;
        Ok(())
    }

    async fn pull_group_member(&self, group_id: &ObjectId, member_id: &ObjectId) -> Result<()> {
        self.groups()
            .await?
            .update_one(
                doc! { "_id": group_id },
                doc! {
                    "$pull": { "members": member_id },
                    "$set": { "metadata.updated_at": DateTime::now() },
                },
            )
            .await?;
        Ok(())
    }

    async fn rename_group(&self, group_id: &ObjectId, name: &str) -> Result<()> {
        self.groups()
            .await?
            .update_one(
                doc! { "_id": group_id },
                doc! { "$set": {
                    "name": name,
                    "metadata.updated_at": DateTime::now(),
                } },
            )
            .await?;
        Ok(())
    }

    async fn delete_group(&self, group_id: &ObjectId) -> Result<()> {
        self.groups()
            .await?
            .soft_delete(doc! { "_id": group_id })
            .await?;
        Ok(())
    }
}
