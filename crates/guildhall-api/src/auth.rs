//! Caller identity.
//!
//! Authentication happens upstream; the gateway forwards the Discord id in
//! `X-User-Id` and the display name in `X-User-Name`.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use guildhall_core::actor::Actor;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the caller's Discord id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the caller's display name.
pub const USER_NAME_HEADER: &str = "x-user-name";

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct AuthenticatedActor(pub Actor);

impl FromRequestParts<AppState> for AuthenticatedActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        actor_from_headers(&parts.headers, state).map(Self)
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, ApiError> {
    headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map(str::trim)
                .map_err(|_| ApiError::Unauthenticated(format!("{name} is not valid text")))
        })
        .transpose()
        .map(|value| value.filter(|v| !v.is_empty()))
}

/// Builds the actor for a request. Guild leadership comes from configuration,
/// never from the request.
///
/// # Errors
///
/// Returns `ApiError::Unauthenticated` when no user id is present.
pub fn actor_from_headers(headers: &HeaderMap, state: &AppState) -> Result<Actor, ApiError> {
    let user_id = header_value(headers, USER_ID_HEADER)?
        .ok_or_else(|| ApiError::Unauthenticated("missing X-User-Id header".into()))?;
    let display_name = header_value(headers, USER_NAME_HEADER)?.unwrap_or(user_id);

    Ok(Actor {
        user_id: user_id.to_owned(),
        display_name: display_name.to_owned(),
        is_guild_leader: state.is_guild_leader(user_id),
    })
}
