//! The public pages and the register / login / logout forms.

use axum::{
  Form,
  extract::State,
  response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use ripoti_core::{store::BoardStore, user::NewUser};
use serde::Deserialize;
use tracing::info;

use crate::{
  AppState,
  auth::{CurrentUser, MaybeUser, end_session, hash_password, start_session, verify_password},
  error::Error,
  handlers::{non_blank, profile_path, serve_page},
};

/// `GET /`, `/index.html`, `/login`, `/register`: the landing page, or the
/// user's own profile when already logged in.
pub async fn index<S>(
  State(state): State<AppState<S>>,
  MaybeUser(user): MaybeUser,
) -> Result<Response, Error>
where
  S: BoardStore + Clone + 'static,
{
  match user {
    Some(user) => Ok(Redirect::to(&profile_path(&user.username)).into_response()),
    None => serve_page(&state.config, "index.html").await,
  }
}

/// `GET /dashboard.html`
pub async fn dashboard<S>(
  State(state): State<AppState<S>>,
  CurrentUser(_): CurrentUser,
) -> Result<Response, Error>
where
  S: BoardStore + Clone + 'static,
{
  serve_page(&state.config, "dashboard.html").await
}

#[derive(Deserialize)]
pub struct RegisterForm {
  jina:     Option<String>,
  ukoo:     Option<String>,
  namba:    Option<String>,
  kituo:    Option<String>,
  password: Option<String>,
  #[serde(rename = "confirmPassword")]
  confirm:  Option<String>,
}

/// `POST /register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Form(form): Form<RegisterForm>,
) -> Result<Redirect, Error>
where
  S: BoardStore + Clone + 'static,
{
  let (Some(jina), Some(ukoo), Some(namba), Some(kituo)) = (
    non_blank(form.jina),
    non_blank(form.ukoo),
    non_blank(form.namba),
    non_blank(form.kituo),
  ) else {
    return Err(Error::bad_request("Jaza sehemu zote muhimu."));
  };
  let (Some(password), Some(confirm)) = (
    form.password.filter(|p| !p.is_empty()),
    form.confirm.filter(|p| !p.is_empty()),
  ) else {
    return Err(Error::bad_request("Jaza sehemu zote muhimu."));
  };
  if password != confirm {
    return Err(Error::bad_request("Password hazifanani."));
  }

  let user = state
    .store
    .create_user(NewUser {
      jina,
      ukoo,
      namba,
      kituo,
      password_hash: hash_password(&password)?,
    })
    .await
    .map_err(Error::from_store)?;

  info!(username = %user.username, kituo = %user.kituo, "user registered");
  Ok(Redirect::to("/index.html"))
}

#[derive(Deserialize)]
pub struct LoginForm {
  username: Option<String>,
  password: Option<String>,
}

/// `POST /login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  jar: CookieJar,
  Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), Error>
where
  S: BoardStore + Clone + 'static,
{
  let (Some(username), Some(password)) =
    (non_blank(form.username), form.password.filter(|p| !p.is_empty()))
  else {
    return Err(Error::bad_request("Jaza username na password."));
  };

  let record = state
    .store
    .find_login(&username)
    .await
    .map_err(Error::from_store)?
    .ok_or_else(|| Error::bad_request("User hajapatikana."))?;

  if !verify_password(&password, &record.password_hash) {
    return Err(Error::bad_request("Password si sahihi."));
  }

  let jar = start_session(&state, jar, &record.user).await?;
  info!(username = %record.user.username, "user logged in");
  Ok((jar, Redirect::to(&profile_path(&record.user.username))))
}

/// `GET /logout`
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  jar: CookieJar,
) -> Result<(CookieJar, Redirect), Error>
where
  S: BoardStore + Clone + 'static,
{
  let jar = end_session(&state, jar).await?;
  Ok((jar, Redirect::to("/index.html")))
}
