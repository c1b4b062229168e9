//! Licorera order backend library.
//!
//! The binary in `main.rs` wires configuration, storage, and the router; the
//! modules here are public so the integration-tests crate can drive the
//! workflow and router directly against the in-memory store.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod coverage;
pub mod error;
pub mod geo;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
