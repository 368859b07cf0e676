//! Authentication and role gates
//!
//! The authentication gate resolves an inbound bearer credential to a
//! stored user; the role gate authorizes an already-authenticated user
//! against a required role. Neither writes to the store.

use bson::oid::ObjectId;

use crate::auth::token::{extract_token_from_header, TokenSigner};
use crate::db::schemas::{Role, UserDoc};
use crate::store::AccountStore;
use crate::types::{HearthError, Result};

/// Resolve the Authorization header to a user record.
///
/// Fails with 401 when the token is missing, rejected by the verifier,
/// or does not resolve to an existing user.
pub async fn authenticate(
    signer: &TokenSigner,
    store: &dyn AccountStore,
    auth_header: Option<&str>,
) -> Result<UserDoc> {
    let token = extract_token_from_header(auth_header).ok_or_else(|| {
        HearthError::Unauthorized("No authentication token, access denied".into())
    })?;

    let claims = signer.verify(token)?;

    let user_id = ObjectId::parse_str(&claims.sub)
        .map_err(|_| HearthError::Unauthorized("Invalid token".into()))?;

    store
        .find_user_by_id(&user_id)
        .await?
        .ok_or_else(|| HearthError::Unauthorized("User not found".into()))
}

/// Authorize an authenticated user against a required role
pub fn require_role(user: &UserDoc, required: Role) -> Result<()> {
    if user.role == required {
        return Ok(());
    }

    let message = match required {
        Role::Parent => "Access denied. Parent role required.",
        Role::FamilyMember => "Access denied. Family member role required.",
        Role::Individual => "Access denied. Individual role required.",
    };
    Err(HearthError::Forbidden(message.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn signer() -> TokenSigner {
        TokenSigner::new(
            "test-secret-that-is-at-least-32-characters-long".into(),
            3600,
        )
        .unwrap()
    }

    async fn seed_user(store: &MemoryStore, role: Role) -> UserDoc {
        let user = UserDoc::new(
            "Alice".into(),
            "a@x.com".into(),
            "$argon2id$fake".into(),
            role,
        );
        let id = store.insert_user(user).await.unwrap();
        store.find_user_by_id(&id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let store = MemoryStore::new();
        let signer = signer();
        let user = seed_user(&store, Role::Parent).await;

        let token = signer.issue(&user._id.unwrap().to_hex()).unwrap();
        let header = format!("Bearer {}", token);

        let resolved = authenticate(&signer, &store, Some(&header)).await.unwrap();
        assert_eq!(resolved._id, user._id);
        assert_eq!(resolved.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_authenticate_missing_header() {
        let store = MemoryStore::new();
        let err = authenticate(&signer(), &store, None).await.unwrap_err();
        assert!(matches!(err, HearthError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_authenticate_garbage_token() {
        let store = MemoryStore::new();
        let err = authenticate(&signer(), &store, Some("Bearer not-a-jwt"))
            .await
            .unwrap_err();
        assert!(matches!(err, HearthError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user() {
        let store = MemoryStore::new();
        let signer = signer();

        // Valid token for an id that does not exist in the store
        let token = signer.issue(&ObjectId::new().to_hex()).unwrap();
        let header = format!("Bearer {}", token);

        let err = authenticate(&signer, &store, Some(&header))
            .await
            .unwrap_err();
        assert!(matches!(err, HearthError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_require_role() {
        let store = MemoryStore::new();
        let parent = seed_user(&store, Role::Parent).await;

        assert!(require_role(&parent, Role::Parent).is_ok());
        assert!(matches!(
            require_role(&parent, Role::FamilyMember).unwrap_err(),
            HearthError::Forbidden(_)
        ));
    }
}
