//! HTTP routes for family group management
//!
//! - GET    /api/family                    - Group for the authenticated user
//! - PUT    /api/family                    - Rename the group (parent only)
//! - POST   /api/family/member             - Add a member (parent only)
//! - DELETE /api/family/member/{memberId}  - Remove a member (parent only)

use bson::oid::ObjectId;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::{authenticate, require_role};
use crate::db::schemas::{Role, UserDoc};
use crate::family::GroupView;
use crate::routes::respond::{
    cors_preflight, error_response, get_auth_header, json_response, parse_json_body, BoxBody,
    ErrorResponse,
};
use crate::server::AppState;
use crate::types::HearthError;

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    #[serde(rename = "memberId", default)]
    pub member_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameGroupRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub message: String,
    #[serde(rename = "familyGroup")]
    pub family_group: GroupView,
}

/// Parse a member id path/body parameter. An id that cannot be an
/// ObjectId cannot resolve to a user, so it reports as not found.
fn parse_member_id(raw: &str) -> Result<ObjectId, HearthError> {
    ObjectId::parse_str(raw).map_err(|_| HearthError::NotFound("User not found".into()))
}

async fn authenticated_user(
    req: &Request<hyper::body::Incoming>,
    state: &AppState,
) -> Result<UserDoc, HearthError> {
    authenticate(&state.tokens, state.store.as_ref(), get_auth_header(req)).await
}

// =============================================================================
// Route Handlers
// =============================================================================

/// GET /api/family
async fn handle_get_group(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let user = match authenticated_user(&req, &state).await {
        Ok(u) => u,
        Err(e) => return error_response(&e),
    };

    match state.families.get_group(&user).await {
        Ok(view) => json_response(StatusCode::OK, &view),
        Err(e) => error_response(&e),
    }
}

/// POST /api/family/member
async fn handle_add_member(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req).map(str::to_string);
    let user = match authenticate(&state.tokens, state.store.as_ref(), auth_header.as_deref())
        .await
    {
        Ok(u) => u,
        Err(e) => return error_response(&e),
    };

    if let Err(e) = require_role(&user, Role::Parent) {
        return error_response(&e);
    }

    let body: AddMemberRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    let member_id = match parse_member_id(&body.member_id) {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };

    match state.families.add_member(&user, &member_id).await {
        Ok(view) => {
            info!("Member {} added to group {}", member_id, view.id);
            json_response(
                StatusCode::OK,
                &GroupResponse {
                    message: "Family member added successfully".into(),
                    family_group: view,
                },
            )
        }
        Err(e) => error_response(&e),
    }
}

/// DELETE /api/family/member/{memberId}
async fn handle_remove_member(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    raw_member_id: &str,
) -> Response<BoxBody> {
    let user = match authenticated_user(&req, &state).await {
        Ok(u) => u,
        Err(e) => return error_response(&e),
    };

    if let Err(e) = require_role(&user, Role::Parent) {
        return error_response(&e);
    }

    let member_id = match parse_member_id(raw_member_id) {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };

    match state.families.remove_member(&user, &member_id).await {
        Ok(view) => {
            info!("Member {} removed from group {}", member_id, view.id);
            json_response(
                StatusCode::OK,
                &GroupResponse {
                    message: "Family member removed successfully".into(),
                    family_group: view,
                },
            )
        }
        Err(e) => error_response(&e),
    }
}

/// PUT /api/family
async fn handle_rename_group(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req).map(str::to_string);
    let user = match authenticate(&state.tokens, state.store.as_ref(), auth_header.as_deref())
        .await
    {
        Ok(u) => u,
        Err(e) => return error_response(&e),
    };

    if let Err(e) = require_role(&user, Role::Parent) {
        return error_response(&e);
    }

    let body: RenameGroupRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    let name = body.name.trim();
    if name.is_empty() {
        return error_response(&HearthError::Validation(
            "Family group name is required".into(),
        ));
    }

    match state.families.rename_group(&user, name).await {
        Ok(view) => json_response(
            StatusCode::OK,
            &GroupResponse {
                message: "Family group updated successfully".into(),
                family_group: view,
            },
        ),
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Route /api/family* requests. Returns None for other paths.
pub async fn handle_family_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path();
    let method = req.method();

    if !path.starts_with("/api/family") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    let path = path.split('?').next().unwrap_or(path).to_string();

    // DELETE /api/family/member/{memberId}
    if let Some(raw_id) = path.strip_prefix("/api/family/member/") {
        let response = if method == Method::DELETE && !raw_id.is_empty() && !raw_id.contains('/') {
            let raw_id = raw_id.to_string();
            handle_remove_member(req, state, &raw_id).await
        } else {
            json_response(
                StatusCode::METHOD_NOT_ALLOWED,
                &ErrorResponse {
                    message: "Method not allowed".into(),
                    code: None,
                },
            )
        };
        return Some(response);
    }

    let response = match (method, path.as_str()) {
        (&Method::GET, "/api/family") => handle_get_group(req, state).await,
        (&Method::PUT, "/api/family") => handle_rename_group(req, state).await,
        (&Method::POST, "/api/family/member") => handle_add_member(req, state).await,

        (_, "/api/family") | (_, "/api/family/member") => json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &ErrorResponse {
                message: "Method not allowed".into(),
                code: None,
            },
        ),

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
