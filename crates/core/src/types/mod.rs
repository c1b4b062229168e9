//! Core types for Licorera.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod phone;
pub mod status;

pub use id::*;
pub use phone::Phone;
pub use status::{NotificationKind, OrderStatus, Role, StatusParseError, TransitionError};
