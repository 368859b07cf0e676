//! HTTP routes for user accounts
//!
//! - POST /api/users/register - Create an account and get a token
//! - POST /api/users/login    - Authenticate and get a token
//! - GET  /api/users/profile  - Get the authenticated user's profile
//! - PUT  /api/users/profile  - Update name/email (role and password are
//!   immutable through this path and silently ignored)

use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{authenticate, hash_password, verify_password};
use crate::db::schemas::{validate_email, Role, UserDoc, UserSummary};
use crate::family::FamilyService;
use crate::routes::respond::{
    cors_preflight, error_response, get_auth_header, json_response, parse_json_body, BoxBody,
    ErrorResponse,
};
use crate::server::AppState;
use crate::store::{AccountStore, ProfileUpdate};
use crate::types::HearthError;

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserSummary,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub message: String,
    pub user: UserSummary,
}

// =============================================================================
// Validation
// =============================================================================

/// Validate and normalize registration input.
/// Returns (name, email, password, role) with the email lowercased.
fn validate_registration(
    body: RegisterRequest,
) -> Result<(String, String, String, Role), HearthError> {
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Err(HearthError::Validation("Name is required".into()));
    }

    let email = body.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(HearthError::Validation("Email is required".into()));
    }
    if !validate_email(&email) {
        return Err(HearthError::Validation(
            "Please provide a valid email".into(),
        ));
    }

    if body.password.is_empty() {
        return Err(HearthError::Validation("Password is required".into()));
    }
    if body.password.len() < 6 {
        return Err(HearthError::Validation(
            "Password must be at least 6 characters".into(),
        ));
    }

    if body.role.is_empty() {
        return Err(HearthError::Validation("Role is required".into()));
    }
    let role: Role = body.role.parse().map_err(HearthError::Validation)?;

    Ok((name, email, body.password, role))
}

// =============================================================================
// Account Operations
// =============================================================================

/// Core registration flow over the account store.
///
/// 1. Reject duplicate emails
/// 2. Hash password with argon2
/// 3. Store the user
/// 4. For parents, create and link the family group; a failure rolls the
///    user back so registration is atomic from the caller's view
///
/// A concurrent registration that slips past the duplicate check hits
/// the unique email index and surfaces as the same conflict.
async fn register_account(
    store: &dyn AccountStore,
    families: &FamilyService,
    name: String,
    email: String,
    password: String,
    role: Role,
) -> Result<UserDoc, HearthError> {
    if store.find_user_by_email(&email).await?.is_some() {
        return Err(HearthError::Conflict("User already exists".into()));
    }

    let password_hash = hash_password(&password)?;

    let user = UserDoc::new(name, email.clone(), password_hash, role);
    let user_id = store.insert_user(user).await?;

    if role == Role::Parent {
        let parent = store
            .find_user_by_id(&user_id)
            .await?
            .ok_or_else(|| HearthError::Internal("Registered user not found".into()))?;

        if let Err(e) = families.create_group_for_parent(&parent).await {
            warn!("Family group creation failed for {}: {}", email, e);
            if let Err(rollback) = store.delete_user(&user_id).await {
                warn!("Failed to roll back user {}: {}", user_id, rollback);
            }
            return Err(HearthError::Internal(
                "Registration failed, please try again".into(),
            ));
        }
    }

    // Re-fetch to pick up the linked family_group_id
    store
        .find_user_by_id(&user_id)
        .await?
        .ok_or_else(|| HearthError::Internal("Registered user not found".into()))
}

/// Core login flow: succeeds only when the email resolves to a user and
/// the password verifies. Unknown email and wrong password produce the
/// same generic error so accounts cannot be enumerated.
async fn login_account(
    store: &dyn AccountStore,
    email: &str,
    password: &str,
) -> Result<UserDoc, HearthError> {
    let user = match store.find_user_by_email(email).await? {
        Some(u) => u,
        None => {
            warn!("Login failed - user not found: {}", email);
            return Err(HearthError::Validation("Invalid credentials".into()));
        }
    };

    if !verify_password(password, &user.password_hash) {
        warn!("Login failed - invalid password: {}", email);
        return Err(HearthError::Validation("Invalid credentials".into()));
    }

    Ok(user)
}

// =============================================================================
// Route Handlers
// =============================================================================

/// POST /api/users/register
async fn handle_register(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: RegisterRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    let (name, email, password, role) = match validate_registration(body) {
        Ok(v) => v,
        Err(e) => return error_response(&e),
    };

    let user = match register_account(
        state.store.as_ref(),
        &state.families,
        name,
        email.clone(),
        password,
        role,
    )
    .await
    {
        Ok(u) => u,
        Err(e) => return error_response(&e),
    };

    let user_id = match user._id {
        Some(id) => id,
        None => return error_response(&HearthError::Internal("Stored user has no id".into())),
    };

    let token = match state.tokens.issue(&user_id.to_hex()) {
        Ok(t) => t,
        Err(e) => return error_response(&e),
    };

    info!("User registered: {} ({})", email, role);

    json_response(
        StatusCode::CREATED,
        &AuthResponse {
            message: "User registered successfully".into(),
            user: user.summary(),
            token,
        },
    )
}

/// POST /api/users/login
async fn handle_login(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: LoginRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    if body.email.is_empty() || body.password.is_empty() {
        return error_response(&HearthError::Validation(
            "Missing required fields: email, password".into(),
        ));
    }

    let email = body.email.trim().to_lowercase();

    let user = match login_account(state.store.as_ref(), &email, &body.password).await {
        Ok(u) => u,
        Err(e) => return error_response(&e),
    };

    let user_id = match user._id {
        Some(id) => id,
        None => return error_response(&HearthError::Internal("Stored user has no id".into())),
    };

    let token = match state.tokens.issue(&user_id.to_hex()) {
        Ok(t) => t,
        Err(e) => return error_response(&e),
    };

    info!("Login successful: {}", email);

    json_response(
        StatusCode::OK,
        &AuthResponse {
            message: "Login successful".into(),
            user: user.summary(),
            token,
        },
    )
}

/// GET /api/users/profile
async fn handle_get_profile(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let user = match authenticate(&state.tokens, state.store.as_ref(), get_auth_header(&req)).await
    {
        Ok(u) => u,
        Err(e) => return error_response(&e),
    };

    json_response(StatusCode::OK, &user.summary())
}

/// PUT /api/users/profile
///
/// Accepts partial updates to name and email. Role and password fields
/// are not part of the request type and are ignored if supplied.
async fn handle_update_profile(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req).map(str::to_string);
    let user = match authenticate(&state.tokens, state.store.as_ref(), auth_header.as_deref()).await
    {
        Ok(u) => u,
        Err(e) => return error_response(&e),
    };

    let body: UpdateProfileRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    let mut update = ProfileUpdate::default();

    if let Some(name) = body.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return error_response(&HearthError::Validation("Name is required".into()));
        }
        update.name = Some(name);
    }

    if let Some(email) = body.email {
        let email = email.trim().to_lowercase();
        if !validate_email(&email) {
            return error_response(&HearthError::Validation(
                "Please provide a valid email".into(),
            ));
        }

        // Reject an email already held by another account
        match state.store.find_user_by_email(&email).await {
            Ok(Some(existing)) if existing._id != user._id => {
                return error_response(&HearthError::Conflict("User already exists".into()));
            }
            Ok(_) => {}
            Err(e) => return error_response(&e),
        }
        update.email = Some(email);
    }

    let user_id = match user._id {
        Some(id) => id,
        None => return error_response(&HearthError::Internal("Stored user has no id".into())),
    };

    if !update.is_empty() {
        if let Err(e) = state.store.update_user_profile(&user_id, update).await {
            return error_response(&e);
        }
    }

    let updated = match state.store.find_user_by_id(&user_id).await {
        Ok(Some(u)) => u,
        Ok(None) => return error_response(&HearthError::NotFound("User not found".into())),
        Err(e) => return error_response(&e),
    };

    json_response(
        StatusCode::OK,
        &ProfileResponse {
            message: "Profile updated successfully".into(),
            user: updated.summary(),
        },
    )
}

// =============================================================================
// Dispatch
// =============================================================================

/// Route /api/users/* requests. Returns None for other paths.
pub async fn handle_user_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path();
    let method = req.method();

    if !path.starts_with("/api/users") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    let path = path.split('?').next().unwrap_or(path);

    let response = match (method, path) {
        (&Method::POST, "/api/users/register") => handle_register(req, state).await,
        (&Method::POST, "/api/users/login") => handle_login(req, state).await,
        (&Method::GET, "/api/users/profile") => handle_get_profile(req, state).await,
        (&Method::PUT, "/api/users/profile") => handle_update_profile(req, state).await,

        (_, "/api/users/register") | (_, "/api/users/login") | (_, "/api/users/profile") => {
            json_response(
                StatusCode::METHOD_NOT_ALLOWED,
                &ErrorResponse {
                    message: "Method not allowed".into(),
                    code: None,
                },
            )
        }

        _ => json_response(
            StatusCode::NOT_FOUND,
            &ErrorResponse {
                message: "Endpoint not found".into(),
                code: None,
            },
        ),
    };

    Some(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn register_body(name: &str, email: &str, password: &str, role: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            role: role.into(),
        }
    }

    fn service() -> (Arc<MemoryStore>, FamilyService) {
        let store = Arc::new(MemoryStore::new());
        let families = FamilyService::new(store.clone());
        (store, families)
    }

    async fn register(
        store: &MemoryStore,
        families: &FamilyService,
        name: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> Result<UserDoc, HearthError> {
        let (name, email, password, role) =
            validate_registration(register_body(name, email, password, role))?;
        register_account(store, families, name, email, password, role).await
    }

    #[test]
    fn test_validate_registration_ok() {
        let (name, email, password, role) =
            validate_registration(register_body("Alice", "A@X.com", "secret1", "Parent")).unwrap();
        assert_eq!(name, "Alice");
        assert_eq!(email, "a@x.com");
        assert_eq!(password, "secret1");
        assert_eq!(role, Role::Parent);
    }

    #[test]
    fn test_validate_registration_missing_fields() {
        assert!(validate_registration(register_body("", "a@x.com", "secret1", "Parent")).is_err());
        assert!(validate_registration(register_body("Alice", "", "secret1", "Parent")).is_err());
        assert!(validate_registration(register_body("Alice", "a@x.com", "", "Parent")).is_err());
        assert!(validate_registration(register_body("Alice", "a@x.com", "secret1", "")).is_err());
    }

    #[test]
    fn test_validate_registration_short_password() {
        let err =
            validate_registration(register_body("Alice", "a@x.com", "short", "Parent"))
                .unwrap_err();
        assert!(matches!(err, HearthError::Validation(_)));
    }

    #[test]
    fn test_validate_registration_bad_email() {
        assert!(
            validate_registration(register_body("Alice", "not-an-email", "secret1", "Parent"))
                .is_err()
        );
    }

    #[test]
    fn test_validate_registration_unknown_role() {
        let err = validate_registration(register_body("Alice", "a@x.com", "secret1", "admin"))
            .unwrap_err();
        assert!(matches!(err, HearthError::Validation(_)));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_is_conflict() {
        let (store, families) = service();
        register(&store, &families, "Alice", "a@x.com", "secret1", "individual")
            .await
            .unwrap();

        let err = register(&store, &families, "Other", "a@x.com", "secret2", "individual")
            .await
            .unwrap_err();
        assert!(matches!(err, HearthError::Conflict(_)));
        assert_eq!(err.to_string(), "User already exists");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_parent_links_group() {
        let (store, families) = service();
        let user = register(&store, &families, "Alice", "a@x.com", "secret1", "Parent")
            .await
            .unwrap();
        assert!(user.family_group_id.is_some());
    }

    #[tokio::test]
    async fn test_login_succeeds_only_with_matching_password() {
        let (store, families) = service();
        register(&store, &families, "Bob", "b@x.com", "secret1", "individual")
            .await
            .unwrap();

        let user = login_account(store.as_ref(), "b@x.com", "secret1")
            .await
            .unwrap();
        assert_eq!(user.email, "b@x.com");

        assert!(login_account(store.as_ref(), "b@x.com", "secret2")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (store, families) = service();
        register(&store, &families, "Bob", "b@x.com", "secret1", "individual")
            .await
            .unwrap();

        let wrong_password = login_account(store.as_ref(), "b@x.com", "secret2")
            .await
            .unwrap_err();
        let unknown_email = login_account(store.as_ref(), "nobody@x.com", "secret1")
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, HearthError::Validation(_)));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert_eq!(wrong_password.status_code(), unknown_email.status_code());
    }
}
