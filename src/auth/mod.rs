//! Authentication and authorization for Hearth
//!
//! Provides:
//! - JWT token issuance and verification
//! - Password hashing with Argon2
//! - Authentication and role gates for request handling

pub mod gate;
pub mod password;
pub mod token;

pub use gate::{authenticate, require_role};
pub use password::{hash_password, verify_password};
pub use token::{extract_token_from_header, Claims, TokenSigner};
