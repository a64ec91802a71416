//! Password hashing and cookie sessions.
//!
//! A session is an opaque random id stored in the database and handed to the
//! browser in an HttpOnly cookie. Handlers that need a logged-in user take a
//! [`CurrentUser`]; pages that only behave differently for one take a
//! [`MaybeUser`].

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{extract::FromRequestParts, http::{HeaderMap, request::Parts}};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use rand_core::OsRng;
use ripoti_core::{
  store::BoardStore,
  user::{NewSession, User},
};
use tracing::debug;
use uuid::Uuid;

use crate::{AppState, ServerConfig, error::Error};

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::Internal(format!("argon2 error: {e}")))
}

/// `false` for a wrong password and for a malformed hash alike.
pub fn verify_password(password: &str, hash: &str) -> bool {
  PasswordHash::new(hash)
    .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
    .is_ok()
}

// ─── Sessions ────────────────────────────────────────────────────────────────

/// Open a session for `user` and add its cookie to `jar`.
pub async fn start_session<S>(
  state: &AppState<S>,
  jar: CookieJar,
  user: &User,
) -> Result<CookieJar, Error>
where
  S: BoardStore + Clone + 'static,
{
  let session_id = Uuid::new_v4().to_string();
  let expires_at = Utc::now() + chrono::Duration::hours(state.config.session_ttl_hours);

  state
    .store
    .create_session(NewSession {
      session_id: session_id.clone(),
      user_id: user.user_id,
      expires_at,
    })
    .await
    .map_err(Error::from_store)?;

  debug!(username = %user.username, "session started");
  Ok(jar.add(session_cookie(&state.config, session_id)))
}

/// Forget the session named by `jar`, if any, and expire its cookie.
pub async fn end_session<S>(state: &AppState<S>, jar: CookieJar) -> Result<CookieJar, Error>
where
  S: BoardStore + Clone + 'static,
{
  if let Some(cookie) = jar.get(&state.config.session_cookie) {
    state
      .store
      .delete_session(cookie.value())
      .await
      .map_err(Error::from_store)?;
  }
  Ok(jar.remove(Cookie::build((state.config.session_cookie.clone(), "")).path("/")))
}

fn session_cookie(config: &ServerConfig, session_id: String) -> Cookie<'static> {
  Cookie::build((config.session_cookie.clone(), session_id))
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax)
    .secure(config.secure_cookies)
    .max_age(cookie::time::Duration::hours(config.session_ttl_hours))
    .build()
}

async fn session_user<S>(headers: &HeaderMap, state: &AppState<S>) -> Result<Option<User>, Error>
where
  S: BoardStore + Clone + 'static,
{
  let jar = CookieJar::from_headers(headers);
  let Some(cookie) = jar.get(&state.config.session_cookie) else {
    return Ok(None);
  };

  state
    .store
    .session_user(cookie.value(), Utc::now())
    .await
    .map_err(Error::from_store)
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// The logged-in user. Rejects with [`Error::Unauthorized`] otherwise.
pub struct CurrentUser(pub User);

/// The logged-in user, if there is one.
pub struct MaybeUser(pub Option<User>);

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: BoardStore + Clone + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    session_user(&parts.headers, state)
      .await?
      .map(CurrentUser)
      .ok_or(Error::Unauthorized)
  }
}

impl<S> FromRequestParts<AppState<S>> for MaybeUser
where
  S: BoardStore + Clone + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    Ok(MaybeUser(session_user(&parts.headers, state).await?))
  }
}
