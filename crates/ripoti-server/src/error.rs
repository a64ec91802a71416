//! Error types and axum `IntoResponse` implementation.
//!
//! Client errors are answered with a JSON body `{ "error": "<message>" }`
//! carrying a Swahili message meant to be shown to the user as-is.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Redirect, Response},
};
use ripoti_core::DomainError;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

/// Shown for every failure the user cannot fix.
const SERVER_FAILURE: &str = "Tatizo kwenye seva, jaribu tena baadaye.";

/// Shown for a request axum could not parse: bad path ids, broken bodies.
pub const MALFORMED_REQUEST: &str = "Ombi si sahihi.";

#[derive(Debug, Error)]
pub enum Error {
  /// No live session; the client is sent back to the login page.
  #[error("unauthorized")]
  Unauthorized,
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("forbidden: {0}")]
  Forbidden(String),
  #[error("not found: {0}")]
  NotFound(String),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("internal error: {0}")]
  Internal(String),
}

impl Error {
  pub fn bad_request(msg: impl Into<String>) -> Self { Error::BadRequest(msg.into()) }

  pub fn not_found(msg: impl Into<String>) -> Self { Error::NotFound(msg.into()) }

  /// An extractor rejection. axum's own text is only logged.
  pub fn malformed(rejection: impl std::fmt::Display) -> Self {
    debug!(%rejection, "rejected malformed request");
    Error::BadRequest(MALFORMED_REQUEST.into())
  }

  /// Map a backend error, turning rule violations into client errors.
  pub fn from_store<E>(e: E) -> Self
  where
    E: std::error::Error + DomainError + Send + Sync + 'static,
  {
    match e.as_domain() {
      Some(domain) => Self::from_domain(domain),
      None => Error::Store(Box::new(e)),
    }
  }

  fn from_domain(e: &ripoti_core::Error) -> Self {
    use ripoti_core::Error as E;
    match e {
      E::UnknownReaction(_) => Error::bad_request("Aina ya thumbs si sahihi."),
      E::EmptyUsername(_) => {
        Error::bad_request("Jina na ukoo lazima viwe na herufi au namba.")
      }
      E::ReportNotFound(_) => Error::not_found("Ripoti haipo."),
      E::OwnReport(_) => {
        Error::Forbidden("Huwezi kutoa thumbs kwenye ripoti yako.".into())
      }
      E::AlreadyReacted(_) => {
        Error::bad_request("Umesha toa thumbs kwenye ripoti hii.")
      }
    }
  }
}

impl From<ripoti_core::Error> for Error {
  fn from(e: ripoti_core::Error) -> Self { Self::from_domain(&e) }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let (status, message) = match self {
      Error::Unauthorized => return Redirect::to("/").into_response(),
      Error::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
      Error::Forbidden(m) => (StatusCode::FORBIDDEN, m),
      Error::NotFound(m) => (StatusCode::NOT_FOUND, m),
      e @ (Error::Store(_) | Error::Internal(_)) => {
        error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, SERVER_FAILURE.to_owned())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
