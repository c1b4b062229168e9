//! Delivery address model.

use licorera_core::{AddressId, UserId};
use serde::Serialize;

/// A stored delivery address.
///
/// Coordinates are optional: addresses created before the mobile client
/// captured GPS fixes have none, and such addresses cannot receive orders
/// until they are edited with coordinates.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub label: String,
    pub recipient: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub notes: Option<String>,
    pub is_default: bool,
}

impl Address {
    /// One-line summary used in notifications and order responses.
    #[must_use]
    pub fn summary_line(&self) -> String {
        [
            Some(self.line1.as_str()),
            self.neighborhood.as_deref(),
            self.city.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address {
            id: AddressId::new(1),
            user_id: UserId::new(1),
            label: "Casa".to_owned(),
            recipient: "Cliente Uno".to_owned(),
            phone: "3001234567".to_owned(),
            line1: "Cra 9 #12-34".to_owned(),
            line2: None,
            neighborhood: Some("Centro".to_owned()),
            city: Some("Villa de Leyva".to_owned()),
            lat: Some(5.6339),
            lng: Some(-73.5256),
            notes: None,
            is_default: true,
        }
    }

    #[test]
    fn summary_joins_present_parts() {
        assert_eq!(
            address().summary_line(),
            "Cra 9 #12-34, Centro, Villa de Leyva"
        );
    }

    #[test]
    fn summary_skips_missing_parts() {
        let mut addr = address();
        addr.neighborhood = None;
        addr.city = None;
        assert_eq!(addr.summary_line(), "Cra 9 #12-34");
    }
}
