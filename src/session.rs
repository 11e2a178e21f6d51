//! Identity and allow-list gate.
//!
//! Requests carry a `mentiva_session=<token>` cookie. The token resolves
//! to a user through the sessions table; the user's email must also be on
//! the allow-list. Session creation itself (login, OAuth callback) is
//! handled by an external identity flow that writes the sessions table.

use axum::http::HeaderMap;

use crate::db::DbHandle;
use crate::errors::AppError;
use crate::models::User;

pub const SESSION_COOKIE: &str = "mentiva_session";

/// Pull the session token out of the Cookie header, if any.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

/// Resolve the request to an allowed user or fail with 401/403.
pub async fn authenticate(db: &DbHandle, headers: &HeaderMap) -> Result<User, AppError> {
    let token = session_token(headers).ok_or(AppError::Unauthorized)?;

    let user = db
        .call(move |db| db.resolve_session(&token))
        .await
        .map_err(AppError::Database)?
        .ok_or(AppError::Unauthorized)?;

    let email = user.email.clone();
    let allowed = db
        .call(move |db| db.is_allowed(&email))
        .await
        .map_err(AppError::Database)?;
    if !allowed {
        return Err(AppError::Forbidden);
    }

    Ok(user)
}
