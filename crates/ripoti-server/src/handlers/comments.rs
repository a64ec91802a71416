//! `POST /api/comments/{id}`

use axum::{
  Json,
  extract::State,
};
use ripoti_core::{
  report::{CommentView, NewComment},
  store::BoardStore,
};
use serde::Deserialize;
use tracing::debug;

use crate::{
  AppState,
  auth::CurrentUser,
  error::Error,
  handlers::{Id, JsonOrForm, non_blank},
};

#[derive(Deserialize)]
pub struct CommentBody {
  comment: Option<String>,
}

/// Add a comment to a report. Every `@username` naming a registered user
/// leaves that user an unread mention.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Id(report_id): Id,
  JsonOrForm(body): JsonOrForm<CommentBody>,
) -> Result<Json<CommentView>, Error>
where
  S: BoardStore + Clone + 'static,
{
  let text = non_blank(body.comment).ok_or_else(|| Error::bad_request("Andika maoni."))?;

  let (comment, mentions) = state
    .store
    .add_comment(NewComment { report_id, user_id: user.user_id, text })
    .await
    .map_err(Error::from_store)?;

  debug!(
    report_id,
    comment_id = comment.comment.comment_id,
    mentions = mentions.len(),
    "comment added"
  );
  Ok(Json(comment))
}
