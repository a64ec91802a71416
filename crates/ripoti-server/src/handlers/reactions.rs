//! `POST /api/reactions/{id}`

use axum::{
  Json,
  extract::State,
};
use ripoti_core::{
  report::{ReactionKind, ThumbCounts},
  store::BoardStore,
};
use serde::Deserialize;

use crate::{AppState, auth::CurrentUser, error::Error, handlers::{Id, JsonOrForm}};

#[derive(Deserialize)]
pub struct ReactBody {
  #[serde(rename = "type")]
  kind: Option<String>,
}

/// Give a report a thumbs up or down and return its new totals.
///
/// Authors cannot react to their own reports, and each user reacts to a
/// report at most once.
pub async fn react<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Id(report_id): Id,
  JsonOrForm(body): JsonOrForm<ReactBody>,
) -> Result<Json<ThumbCounts>, Error>
where
  S: BoardStore + Clone + 'static,
{
  let kind: ReactionKind = body.kind.as_deref().unwrap_or_default().trim().parse()?;

  let counts = state
    .store
    .react(report_id, user.user_id, kind)
    .await
    .map_err(Error::from_store)?;
  Ok(Json(counts))
}
