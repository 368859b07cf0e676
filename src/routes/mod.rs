//! HTTP routes for Hearth

pub mod family;
pub mod health;
pub mod respond;
pub mod users;

pub use family::handle_family_request;
pub use health::{health_check, readiness_check};
pub use users::handle_user_request;
