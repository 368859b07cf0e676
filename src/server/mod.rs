//! HTTP server for Hearth

pub mod http;

pub use http::{run, AppState};
