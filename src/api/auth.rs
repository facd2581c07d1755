//! Caller identity as forwarded by the upstream auth gateway.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::StorefrontError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Clone, Copy, Debug)]
pub struct CurrentUser {
    pub id: Uuid,
    pub is_admin: bool,
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = StorefrontError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| parts.headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim);
        let id = header(USER_ID_HEADER)
            .and_then(|v| Uuid::parse_str(v).ok())
            .ok_or(StorefrontError::Unauthorized)?;
        let is_admin = header(USER_ROLE_HEADER).is_some_and(|role| role.eq_ignore_ascii_case("admin"));
        Ok(Self { id, is_admin })
    }
}

/// A [`CurrentUser`] carrying the admin role.
#[derive(Clone, Copy, Debug)]
pub struct AdminUser(pub CurrentUser);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AdminUser {
    type Rejection = StorefrontError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin { return Err(StorefrontError::Forbidden); }
        Ok(Self(user))
    }
}
