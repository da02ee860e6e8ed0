//! Caller identity forwarded by the upstream gateway.

use super::error::ApiError;
use crate::identity::{Actor, Role, UserId};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

/// Header carrying the authenticated user's UUID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the authenticated user's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Extractor yielding the [`Actor`] for the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Actor);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw_id = header_value(parts, USER_ID_HEADER)?;
        let raw_role = header_value(parts, USER_ROLE_HEADER)?;
        let id = Uuid::parse_str(raw_id)
            .map_err(|_| ApiError::unauthorized("caller identity is not a valid user id"))?;
        let role = Role::try_from(raw_role)
            .map_err(|_| ApiError::unauthorized("caller role is not recognised"))?;
        Ok(Self(Actor::new(UserId::from_uuid(id), role)))
    }
}

fn header_value<'a>(parts: &'a Parts, name: &'static str) -> Result<&'a str, ApiError> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized(format!("missing {name} header")))
}
