//! Acting-user extractor
//!
//! Authentication happens at the gateway, which forwards the verified
//! identity as `x-user-id` and `x-user-role` headers.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::domain::{Actor, Role};
use crate::ShopError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The authenticated caller. Rejects with 401 when the identity is missing
/// or malformed.
pub struct AuthUser(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ShopError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| parts.headers.get(name).and_then(|v| v.to_str().ok());

        let id = header(USER_ID_HEADER)
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .ok_or(ShopError::Unauthorized("Authentication required"))?;
        let role = match header(USER_ROLE_HEADER) {
            Some(raw) => raw.parse::<Role>().map_err(|_| ShopError::Unauthorized("Unknown role"))?,
            None => Role::default(),
        };
        Ok(Self(Actor { id, role }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(headers: &[(&str, &str)]) -> Result<Actor, ShopError> {
        let mut builder = Request::builder().uri("/");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AuthUser::from_request_parts(&mut parts, &()).await.map(|AuthUser(a)| a)
    }

    #[tokio::test]
    async fn test_identity_headers() {
        let id = Uuid::now_v7();
        let actor = extract(&[(USER_ID_HEADER, &id.to_string())]).await.unwrap();
        assert_eq!(actor, Actor::user(id));
        let actor = extract(&[(USER_ID_HEADER, &id.to_string()), (USER_ROLE_HEADER, "Admin")]).await.unwrap();
        assert!(actor.is_admin());
    }

    #[tokio::test]
    async fn test_missing_or_bad_identity() {
        assert!(matches!(extract(&[]).await, Err(ShopError::Unauthorized(_))));
        assert!(matches!(extract(&[(USER_ID_HEADER, "42")]).await, Err(ShopError::Unauthorized(_))));
        let id = Uuid::now_v7().to_string();
        assert!(matches!(extract(&[(USER_ID_HEADER, &id), (USER_ROLE_HEADER, "root")]).await, Err(ShopError::Unauthorized(_))));
    }
}
