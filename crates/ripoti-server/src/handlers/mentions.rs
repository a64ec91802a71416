//! The session user's unread mentions.

use axum::{
  Json,
  extract::State,
};
use ripoti_core::{report::MentionView, store::BoardStore};
use serde_json::{Value, json};

use crate::{AppState, auth::CurrentUser, error::Error, handlers::Id};

/// `GET /api/mentions`
pub async fn unread<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<MentionView>>, Error>
where
  S: BoardStore + Clone + 'static,
{
  let mentions = state
    .store
    .unread_mentions(user.user_id)
    .await
    .map_err(Error::from_store)?;
  Ok(Json(mentions))
}

/// `POST /api/mentions/{id}/read`
pub async fn mark_read<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Id(mention_id): Id,
) -> Result<Json<Value>, Error>
where
  S: BoardStore + Clone + 'static,
{
  let marked = state
    .store
    .mark_mention_read(mention_id, user.user_id)
    .await
    .map_err(Error::from_store)?;

  if !marked {
    return Err(Error::not_found("Taarifa haipo."));
  }
  Ok(Json(json!({ "success": true })))
}
