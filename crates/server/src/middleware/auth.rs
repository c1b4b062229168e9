//! Authenticated principal extraction.
//!
//! Authentication itself is a collaborator outside this service: the fronting
//! auth layer (API gateway or the `dev_header_auth` middleware below in local
//! development) validates credentials and installs a [`Principal`] as a
//! request extension. The extractors here only enforce its presence and role.

use axum::{
    extract::{FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use licorera_core::{Role, UserId};
use serde::{Deserialize, Serialize};

/// The authenticated caller: identity plus role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
}

/// Rejection for missing or insufficient authentication.
pub enum AuthRejection {
    /// No principal on the request.
    Unauthorized,
    /// Principal present but the route needs `ADMIN`.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        };
        (status, Json(serde_json::json!({ "error": code }))).into_response()
    }
}

/// Extractor that requires an authenticated principal.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Principal);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .copied()
            .map(Self)
            .ok_or(AuthRejection::Unauthorized)
    }
}

/// Extractor that requires an authenticated `ADMIN` principal.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin(pub Principal);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = parts
            .extensions
            .get::<Principal>()
            .copied()
            .ok_or(AuthRejection::Unauthorized)?;
        if !principal.role.is_admin() {
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(principal))
    }
}

/// Development-only auth layer: trusts `x-user-id` and `x-user-role` headers.
///
/// Enabled by `DEV_HEADER_AUTH=true`. Never deploy with this on; it exists so
/// the server can run end-to-end without the gateway.
pub async fn dev_header_auth(mut request: Request, next: Next) -> Response {
    let principal = principal_from_headers(&request);
    if let Some(principal) = principal {
        request.extensions_mut().insert(principal);
    }
    next.run(request).await
}

fn principal_from_headers(request: &Request) -> Option<Principal> {
    let id = request
        .headers()
        .get("x-user-id")?
        .to_str()
        .ok()?
        .parse::<i32>()
        .ok()?;
    let role = request
        .headers()
        .get("x-user-role")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Role>().ok())
        .unwrap_or(Role::Cliente);
    Some(Principal {
        id: UserId::new(id),
        role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn headers_produce_a_principal() {
        let request = Request::builder()
            .header("x-user-id", "7")
            .header("x-user-role", "ADMIN")
            .body(Body::empty())
            .expect("request");
        let principal = principal_from_headers(&request).expect("principal");
        assert_eq!(principal.id, UserId::new(7));
        assert_eq!(principal.role, Role::Admin);
    }

    #[test]
    fn missing_or_bad_id_yields_none() {
        let request = Request::builder().body(Body::empty()).expect("request");
        assert!(principal_from_headers(&request).is_none());

        let request = Request::builder()
            .header("x-user-id", "not-a-number")
            .body(Body::empty())
            .expect("request");
        assert!(principal_from_headers(&request).is_none());
    }

    #[test]
    fn unknown_role_defaults_to_cliente() {
        let request = Request::builder()
            .header("x-user-id", "3")
            .header("x-user-role", "ROOT")
            .body(Body::empty())
            .expect("request");
        let principal = principal_from_headers(&request).expect("principal");
        assert_eq!(principal.role, Role::Cliente);
    }
}
