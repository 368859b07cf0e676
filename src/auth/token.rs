//! JWT token handling for user authentication
//!
//! Security notes:
//! - Tokens are signed with HS256 (HMAC-SHA256)
//! - Expiry is enforced; default is 24 hours
//! - JWT_SECRET must be a strong random value from the environment

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::HearthError;

/// Payload stored in a JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id (hex ObjectId)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Signs and verifies identity tokens with a process-wide secret
/// injected at startup.
#[derive(Clone)]
pub struct TokenSigner {
    secret: String,
    expiry_seconds: u64,
}

impl TokenSigner {
    /// Create a new token signer
    ///
    /// Returns an error if the secret is empty or too short.
    pub fn new(secret: String, expiry_seconds: u64) -> Result<Self, HearthError> {
        if secret.is_empty() {
            return Err(HearthError::Config("JWT_SECRET is required".into()));
        }

        if secret.len() < 32 {
            return Err(HearthError::Config(
                "JWT_SECRET must be at least 32 characters".into(),
            ));
        }

        Ok(Self {
            secret,
            expiry_seconds,
        })
    }

    /// Issue a signed token for an authenticated user
    pub fn issue(&self, user_id: &str) -> Result<String, HearthError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| HearthError::Internal(format!("System time error: {}", e)))?
            .as_secs();

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.expiry_seconds,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| HearthError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Verify and decode a token, rejecting tampered or expired tokens
    pub fn verify(&self, token: &str) -> Result<Claims, HearthError> {
        let validation = Validation::default();

        match decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        ) {
            Ok(token_data) => Ok(token_data.claims),
            Err(err) => {
                use jsonwebtoken::errors::ErrorKind;
                let error_msg = match err.kind() {
                    ErrorKind::ExpiredSignature => "Token expired",
                    ErrorKind::InvalidToken => "Invalid token",
                    ErrorKind::InvalidSignature => "Invalid signature",
                    _ => "Token validation failed",
                };
                Err(HearthError::Unauthorized(error_msg.into()))
            }
        }
    }
}

/// Extract token from Authorization header.
/// Supports the "Bearer <token>" format.
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    let header = auth_header?;

    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }

    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_signer() -> TokenSigner {
        TokenSigner::new(
            "test-secret-that-is-at-least-32-characters-long".into(),
            86400,
        )
        .unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let signer = test_signer();

        let token = signer.issue("64b0c8f2a1d2e3f4a5b6c7d8").unwrap();
        assert!(!token.is_empty());

        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, "64b0c8f2a1d2e3f4a5b6c7d8");
        assert!(claims.exp > claims.iat);
        assert_eq!(claims.exp - claims.iat, 86400);
    }

    #[test]
    fn test_invalid_token() {
        let signer = test_signer();
        assert!(signer.verify("invalid-token").is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let signer1 = test_signer();
        let signer2 = TokenSigner::new(
            "different-secret-that-is-at-least-32-characters".into(),
            86400,
        )
        .unwrap();

        let token = signer1.issue("64b0c8f2a1d2e3f4a5b6c7d8").unwrap();
        assert!(signer2.verify(&token).is_err());
    }

    #[test]
    fn test_expired_token() {
        // Issue a token that expired in the past by signing claims directly
        let signer = test_signer();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        let claims = Claims {
            sub: "64b0c8f2a1d2e3f4a5b6c7d8".into(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-secret-that-is-at-least-32-characters-long".as_bytes()),
        )
        .unwrap();

        assert!(signer.verify(&token).is_err());
    }

    #[test]
    fn test_secret_validation() {
        assert!(TokenSigner::new("short".into(), 86400).is_err());
        assert!(TokenSigner::new("".into(), 86400).is_err());
        assert!(TokenSigner::new("this-secret-is-at-least-32-chars-long".into(), 86400).is_ok());
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(
            extract_token_from_header(Some("Bearer abc123")),
            Some("abc123")
        );

        assert_eq!(extract_token_from_header(None), None);
        assert_eq!(extract_token_from_header(Some("")), None);
        assert_eq!(extract_token_from_header(Some("Bearer ")), None);
        assert_eq!(extract_token_from_header(Some("Basic abc123")), None);
        assert_eq!(extract_token_from_header(Some("abc123")), None);
    }
}
