//! Order status state machine, user roles, and notification kinds.
//!
//! Status and role tokens on the wire (and in the database) are the Spanish
//! values the mobile client was built against (`RECIBIDO`, `EN_CAMINO`, ...).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A status or role token that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown token: {0}")]
pub struct StatusParseError(pub String);

/// An order status transition that is not in the legal transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal order status transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// Order lifecycle status.
///
/// Legal transitions:
///
/// ```text
/// RECIBIDO ---> EN_CAMINO ---> ENTREGADO (terminal)
///     \             \
///      \             +-------> CANCELADO (terminal)
///       +--------------------> CANCELADO (terminal)
/// ```
///
/// Everything else, including self-transitions and any move out of a
/// terminal state, is rejected with [`TransitionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Order placed, awaiting dispatch.
    #[serde(rename = "RECIBIDO")]
    Received,
    /// Courier is on the way.
    #[serde(rename = "EN_CAMINO")]
    EnRoute,
    /// Delivered to the customer. Terminal.
    #[serde(rename = "ENTREGADO")]
    Delivered,
    /// Cancelled before delivery. Terminal.
    #[serde(rename = "CANCELADO")]
    Cancelled,
}

impl OrderStatus {
    /// The wire/database token for this status.
    #[must_use]
    pub const fn as_token(self) -> &'static str {
        match self {
            Self::Received => "RECIBIDO",
            Self::EnRoute => "EN_CAMINO",
            Self::Delivered => "ENTREGADO",
            Self::Cancelled => "CANCELADO",
        }
    }

    /// Whether no further transition is expected out of this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether `self -> next` is in the legal transition table.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Received, Self::EnRoute)
                | (Self::Received, Self::Cancelled)
                | (Self::EnRoute, Self::Delivered)
                | (Self::EnRoute, Self::Cancelled)
        )
    }

    /// Validate a transition, returning the target status on success.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when `self -> next` is not legal.
    pub const fn transition_to(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

impl FromStr for OrderStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RECIBIDO" => Ok(Self::Received),
            "EN_CAMINO" => Ok(Self::EnRoute),
            "ENTREGADO" => Ok(Self::Delivered),
            "CANCELADO" => Ok(Self::Cancelled),
            other => Err(StatusParseError(other.to_owned())),
        }
    }
}

/// User role for authorization decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "CLIENTE")]
    Cliente,
}

impl Role {
    /// The wire/database token for this role.
    #[must_use]
    pub const fn as_token(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Cliente => "CLIENTE",
        }
    }

    /// Whether this role may act on resources it does not own.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

impl FromStr for Role {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Self::Admin),
            "CLIENTE" => Ok(Self::Cliente),
            other => Err(StatusParseError(other.to_owned())),
        }
    }
}

/// Kind of customer notification, used as half of the idempotency key
/// on the notification log (`(order_id, kind)` is unique).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// Order confirmation sent right after checkout.
    OrderCreated,
    /// Short message sent when an order enters the given status.
    StatusChanged(OrderStatus),
}

impl NotificationKind {
    /// The token stored in the `type` column of the notification log.
    #[must_use]
    pub fn as_token(self) -> String {
        match self {
            Self::OrderCreated => "ORDER_CREATED".to_owned(),
            Self::StatusChanged(status) => format!("STATUS_{}", status.as_token()),
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_legal() {
        assert!(OrderStatus::Received.can_transition_to(OrderStatus::EnRoute));
        assert!(OrderStatus::EnRoute.can_transition_to(OrderStatus::Delivered));
        assert!(OrderStatus::Received.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::EnRoute.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn terminal_states_admit_no_transitions() {
        for terminal in [OrderStatus::Delivered, OrderStatus::Cancelled] {
            assert!(terminal.is_terminal());
            for next in [
                OrderStatus::Received,
                OrderStatus::EnRoute,
                OrderStatus::Delivered,
                OrderStatus::Cancelled,
            ] {
                assert!(!terminal.can_transition_to(next), "{terminal} -> {next}");
            }
        }
    }

    #[test]
    fn self_transitions_are_illegal() {
        for status in [
            OrderStatus::Received,
            OrderStatus::EnRoute,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn skipping_en_route_is_illegal() {
        let err = OrderStatus::Received
            .transition_to(OrderStatus::Delivered)
            .expect_err("must be rejected");
        assert_eq!(err.from, OrderStatus::Received);
        assert_eq!(err.to, OrderStatus::Delivered);
    }

    #[test]
    fn status_tokens_round_trip() {
        for status in [
            OrderStatus::Received,
            OrderStatus::EnRoute,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            let parsed: OrderStatus = status.as_token().parse().expect("parse");
            assert_eq!(parsed, status);
        }
        assert!("DESPACHADO".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn status_serializes_as_spanish_token() {
        let json = serde_json::to_string(&OrderStatus::EnRoute).expect("serialize");
        assert_eq!(json, "\"EN_CAMINO\"");
        let back: OrderStatus = serde_json::from_str("\"ENTREGADO\"").expect("deserialize");
        assert_eq!(back, OrderStatus::Delivered);
    }

    #[test]
    fn notification_kind_tokens() {
        assert_eq!(NotificationKind::OrderCreated.as_token(), "ORDER_CREATED");
        assert_eq!(
            NotificationKind::StatusChanged(OrderStatus::EnRoute).as_token(),
            "STATUS_EN_CAMINO"
        );
        assert_eq!(
            NotificationKind::StatusChanged(OrderStatus::Cancelled).as_token(),
            "STATUS_CANCELADO"
        );
    }

    #[test]
    fn role_parsing() {
        assert_eq!("ADMIN".parse::<Role>().expect("parse"), Role::Admin);
        assert_eq!("CLIENTE".parse::<Role>().expect("parse"), Role::Cliente);
        assert!(Role::Admin.is_admin());
        assert!(!Role::Cliente.is_admin());
        assert!("ROOT".parse::<Role>().is_err());
    }
}
