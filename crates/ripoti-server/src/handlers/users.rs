//! The session user, the username list for mention suggestions, and profiles.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, HeaderValue, header},
  response::{IntoResponse, Response},
};
use chrono::Utc;
use ripoti_core::{
  query::ReportQuery,
  report::{MentionView, ReportPage},
  store::BoardStore,
  time::greeting,
  user::User,
};
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  auth::CurrentUser,
  error::Error,
  handlers::serve_page,
};

#[derive(Serialize)]
pub struct Me {
  username: String,
  jina:     String,
  kituo:    String,
  greeting: &'static str,
}

/// `GET /api/user`
pub async fn me<S>(CurrentUser(user): CurrentUser) -> Json<Me>
where
  S: BoardStore + Clone + 'static,
{
  Json(Me {
    username: user.username,
    jina:     user.jina,
    kituo:    user.kituo,
    greeting: greeting(Utc::now()),
  })
}

#[derive(Deserialize)]
pub struct UserSearch {
  search: Option<String>,
}

/// `GET /api/users[?search=<prefix>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(_): CurrentUser,
  Query(params): Query<UserSearch>,
) -> Result<Json<Vec<String>>, Error>
where
  S: BoardStore + Clone + 'static,
{
  let names = state
    .store
    .list_usernames(params.search.as_deref())
    .await
    .map_err(Error::from_store)?;
  Ok(Json(names))
}

#[derive(Deserialize)]
pub struct ProfileParams {
  page: Option<String>,
}

/// Public part of a user shown on a profile; the phone number stays private.
#[derive(Serialize)]
pub struct ProfileUser {
  username: String,
  jina:     String,
  ukoo:     String,
  kituo:    String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  user:         ProfileUser,
  /// Whether the viewer is looking at their own profile.
  is_own:       bool,
  #[serde(flatten)]
  reports:      ReportPage,
  /// Only present on the viewer's own profile.
  #[serde(skip_serializing_if = "Option::is_none")]
  mentions:     Option<Vec<MentionView>>,
}

/// `GET /user/{username}[?page=<n>]`
///
/// Browsers navigating here get `profile.html`, which fetches the same URL
/// again as JSON. Both answers carry `Vary: Accept`.
pub async fn profile<S>(
  State(state): State<AppState<S>>,
  CurrentUser(viewer): CurrentUser,
  Path(username): Path<String>,
  Query(params): Query<ProfileParams>,
  headers: HeaderMap,
) -> Result<Response, Error>
where
  S: BoardStore + Clone + 'static,
{
  let mut resp = if wants_html(&headers) {
    serve_page(&state.config, "profile.html").await?
  } else {
    profile_json(&state, &viewer, &username, params).await?.into_response()
  };
  resp.headers_mut().insert(header::VARY, HeaderValue::from_static("accept"));
  Ok(resp)
}

async fn profile_json<S>(
  state: &AppState<S>,
  viewer: &User,
  username: &str,
  params: ProfileParams,
) -> Result<Json<Profile>, Error>
where
  S: BoardStore + Clone + 'static,
{
  let user = state
    .store
    .get_user_by_username(username)
    .await
    .map_err(Error::from_store)?
    .ok_or_else(|| Error::not_found("Mtumiaji hajapatikana."))?;

  let query = ReportQuery {
    username: Some(user.username.clone()),
    page: params.page.and_then(|p| p.trim().parse().ok()),
    ..Default::default()
  };
  let reports = state
    .store
    .list_reports(&query, Some(viewer.user_id))
    .await
    .map_err(Error::from_store)?;

  let is_own = viewer.user_id == user.user_id;
  let mentions = if is_own {
    Some(
      state
        .store
        .unread_mentions(user.user_id)
        .await
        .map_err(Error::from_store)?,
    )
  } else {
    None
  };

  Ok(Json(Profile {
    user: ProfileUser {
      username: user.username,
      jina:     user.jina,
      ukoo:     user.ukoo,
      kituo:    user.kituo,
    },
    is_own,
    reports,
    mentions,
  }))
}

fn wants_html(headers: &HeaderMap) -> bool {
  headers
    .get(header::ACCEPT)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|accept| accept.contains("text/html"))
}
