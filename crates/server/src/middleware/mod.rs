//! Request middleware and extractors.

pub mod auth;

pub use auth::{CurrentUser, Principal, RequireAdmin, dev_header_auth};
