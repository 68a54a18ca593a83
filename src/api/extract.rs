use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request, rejection::JsonRejection},
    http::{header, request::Parts},
};
use chrono::Utc;
use entity::user;
use tower_cookies::Cookies;

use super::AppState;
use crate::Error;

/// Cookie set at login; read when no bearer header is sent.
pub const AUTH_COOKIE: &str = "Authorization";

/// The user behind the request's access token.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub user::Model);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = access_token(parts).ok_or_else(|| Error::unauthenticated("Missing token"))?;
        let user = state.accounts().authenticate(&token, Utc::now()).await?;
        Ok(Self(user))
    }
}

/// `Authorization: Bearer <token>` first, then the login cookie.
fn access_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned);

    bearer.or_else(|| {
        parts
            .extensions
            .get::<Cookies>()
            .and_then(|cookies| cookies.get(AUTH_COOKIE))
            .map(|cookie| cookie.value().to_owned())
            .filter(|token| !token.is_empty())
    })
}

/// A numeric id taken from the `{id}` path segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathId(pub i32);

impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| Error::invalid("ID cannot be empty"))?;
        parse_id(&raw).map(Self)
    }
}

fn parse_id(raw: &str) -> Result<i32, Error> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::invalid("ID cannot be empty"));
    }
    raw.parse().map_err(|_| Error::invalid("Invalid ID format"))
}

/// `Json<T>` whose rejection is reported like every other bad request.
#[derive(Clone, Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| Error::invalid(rejection.body_text()))?;
        Ok(Self(value))
    }
}
