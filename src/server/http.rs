//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Each accepted
//! connection is served on its own tokio task; request handlers share
//! state through Arc<AppState>.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::auth::TokenSigner;
use crate::config::Args;
use crate::db::MongoClient;
use crate::family::FamilyService;
use crate::routes;
use crate::routes::respond::{cors_preflight, json_response, BoxBody, ErrorResponse};
use crate::store::{AccountStore, MongoAccountStore};
use crate::types::HearthError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub mongo: MongoClient,
    pub store: Arc<dyn AccountStore>,
    pub families: FamilyService,
    pub tokens: TokenSigner,
}

impl AppState {
    /// Build state from validated configuration and a connected client
    pub fn new(args: Args, mongo: MongoClient) -> Result<Self, HearthError> {
        let secret = args
            .jwt_secret
            .clone()
            .ok_or_else(|| HearthError::Config("JWT_SECRET is required".into()))?;
        let tokens = TokenSigner::new(secret, args.jwt_expiry_seconds)?;

        let store: Arc<dyn AccountStore> = Arc::new(MongoAccountStore::new(mongo.clone()));
        let families = FamilyService::new(Arc::clone(&store));

        Ok(Self {
            args,
            mongo,
            store,
            families,
            tokens,
        })
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), HearthError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Hearth listening on {}", state.args.listen);

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    // User account routes (/api/users/*) - these consume the request
    if path.starts_with("/api/users") {
        if let Some(response) = routes::handle_user_request(req, Arc::clone(&state)).await {
            return Ok(response);
        }
        return Ok(not_found_response());
    }

    // Family group routes (/api/family*)
    if path.starts_with("/api/family") {
        if let Some(response) = routes::handle_family_request(req, Arc::clone(&state)).await {
            return Ok(response);
        }
        return Ok(not_found_response());
    }

    let response = match (method, path.as_str()) {
        // Liveness probe
        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::health_check(),

        // Readiness probe - 200 only if MongoDB answers
        (Method::GET, "/ready") | (Method::GET, "/readyz") => {
            routes::readiness_check(Arc::clone(&state)).await
        }

        // CORS preflight
        (Method::OPTIONS, _) => cors_preflight(),

        _ => not_found_response(),
    };

    Ok(response)
}

fn not_found_response() -> Response<BoxBody> {
    json_response(
        StatusCode::NOT_FOUND,
        &ErrorResponse {
            message: "Endpoint not found".into(),
            code: None,
        },
    )
}
