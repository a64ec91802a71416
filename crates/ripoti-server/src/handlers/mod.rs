pub mod comments;
pub mod mentions;
pub mod pages;
pub mod reactions;
pub mod reports;
pub mod users;

use std::io;

use axum::{
  Form, Json,
  extract::{FromRequest, FromRequestParts, Path, Request},
  http::{header, request::Parts},
  response::{Html, IntoResponse, Response},
};
use serde::de::DeserializeOwned;

use crate::{ServerConfig, error::Error};

/// A request body sent either as JSON or as an urlencoded form, chosen by
/// `Content-Type`. The browser scripts use both.
pub struct JsonOrForm<T>(pub T);

impl<T, S> FromRequest<S> for JsonOrForm<T>
where
  T: DeserializeOwned + Send,
  S: Send + Sync,
{
  type Rejection = Error;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let is_json = req
      .headers()
      .get(header::CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .is_some_and(|ct| ct.starts_with("application/json"));

    if is_json {
      let Json(value) = Json::<T>::from_request(req, state)
        .await
        .map_err(Error::malformed)?;
      Ok(JsonOrForm(value))
    } else {
      let Form(value) = Form::<T>::from_request(req, state)
        .await
        .map_err(Error::malformed)?;
      Ok(JsonOrForm(value))
    }
  }
}

/// A numeric `{id}` path segment. Anything else is a 400 with the usual
/// JSON error body.
pub struct Id(pub i64);

impl<S> FromRequestParts<S> for Id
where
  S: Send + Sync,
{
  type Rejection = Error;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let Path(id) = Path::<i64>::from_request_parts(parts, state)
      .await
      .map_err(Error::malformed)?;
    Ok(Id(id))
  }
}

/// Serve `name` from the public directory.
pub(crate) async fn serve_page(config: &ServerConfig, name: &str) -> Result<Response, Error> {
  let path = config.public_dir.join(name);
  match tokio::fs::read_to_string(&path).await {
    Ok(html) => Ok(Html(html).into_response()),
    Err(e) if e.kind() == io::ErrorKind::NotFound => {
      Err(Error::not_found(format!("Ukurasa {name} haupo.")))
    }
    Err(e) => Err(Error::Internal(format!("reading {}: {e}", path.display()))),
  }
}

/// Trim `value` and treat a blank string as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
  value
    .map(|s| s.trim().to_owned())
    .filter(|s| !s.is_empty())
}

pub(crate) fn profile_path(username: &str) -> String { format!("/user/{username}") }
