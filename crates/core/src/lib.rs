//! Licorera Core - Shared types library.
//!
//! This crate provides common types used across all Licorera components:
//! - `server` - Order-taking HTTP backend
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, the order status state machine, user roles,
//!   and Colombian phone number normalization

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
