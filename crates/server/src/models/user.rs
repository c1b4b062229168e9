//! User model (read-only collaborator data for the order workflow).

use licorera_core::{Role, UserId};
use serde::Serialize;

/// The slice of a user the order workflow needs: identity for authorization
/// and a phone number for notifications.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
}
