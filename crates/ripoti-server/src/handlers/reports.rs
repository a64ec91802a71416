//! Submitting, listing, and viewing reports.

use axum::{
  Json,
  extract::{Multipart, Query, State, multipart::{Field, MultipartRejection}},
};
use bytes::Bytes;
use ripoti_core::{
  query::ReportQuery,
  report::{NewReport, ReportPage, ReportView},
  store::BoardStore,
  time::parse_date_bound,
};
use serde::Deserialize;
use tracing::{error, info};

use crate::{
  AppState,
  auth::CurrentUser,
  error::Error,
  handlers::{Id, non_blank},
  images::Upload,
};

/// `POST /submit` (multipart: `title`, `description`, optional `image`)
///
/// A failed image upload does not fail the submission; the report is saved
/// without an image.
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ReportView>, Error>
where
  S: BoardStore + Clone + 'static,
{
  let mut multipart = multipart.map_err(Error::malformed)?;
  let mut title = None;
  let mut description = None;
  let mut image = None;

  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(Error::malformed)?
  {
    let name = field.name().map(str::to_owned);
    match name.as_deref() {
      Some("title") => title = Some(text(field).await?),
      Some("description") => description = Some(text(field).await?),
      Some("image") => image = file(field).await?,
      _ => {}
    }
  }

  let (Some(title), Some(description)) = (non_blank(title), non_blank(description)) else {
    return Err(Error::bad_request("Jaza title na description."));
  };

  let image = match image {
    Some(upload) => match state.images.store(upload).await {
      Ok(url) => url,
      Err(e) => {
        error!(error = %e, "image upload failed; saving report without image");
        None
      }
    },
    None => None,
  };

  let report = state
    .store
    .create_report(NewReport { user_id: user.user_id, title, description, image })
    .await
    .map_err(Error::from_store)?;

  info!(
    report_id = report.report.report_id,
    username = %user.username,
    "report submitted"
  );
  Ok(Json(report))
}

async fn text(field: Field<'_>) -> Result<String, Error> {
  field.text().await.map_err(Error::malformed)
}

/// A file input left empty still arrives as a part with no name and no bytes.
async fn file(field: Field<'_>) -> Result<Option<Upload>, Error> {
  let file_name = field.file_name().map(str::to_owned).filter(|n| !n.is_empty());
  let content_type = field.content_type().map(str::to_owned);
  let bytes: Bytes = field.bytes().await.map_err(Error::malformed)?;

  if bytes.is_empty() {
    return Ok(None);
  }
  Ok(Some(Upload { bytes, file_name, content_type }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  clinic:     Option<String>,
  username:   Option<String>,
  search:     Option<String>,
  start_date: Option<String>,
  end_date:   Option<String>,
  page:       Option<String>,
  limit:      Option<String>,
}

impl ListParams {
  fn into_query(self) -> Result<ReportQuery, Error> {
    let bound = |value: Option<String>, end_of_day: bool| match non_blank(value) {
      Some(s) => parse_date_bound(&s, end_of_day)
        .map(Some)
        .ok_or_else(|| Error::bad_request("Tarehe si sahihi.")),
      None => Ok(None),
    };

    Ok(ReportQuery {
      clinic:   non_blank(self.clinic),
      username: non_blank(self.username),
      search:   non_blank(self.search),
      start:    bound(self.start_date, false)?,
      end:      bound(self.end_date, true)?,
      page:     self.page.and_then(|p| p.trim().parse().ok()),
      limit:    self.limit.and_then(|l| l.trim().parse().ok()),
    })
  }
}

/// `GET /api/reports`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(viewer): CurrentUser,
  Query(params): Query<ListParams>,
) -> Result<Json<ReportPage>, Error>
where
  S: BoardStore + Clone + 'static,
{
  let query = params.into_query()?;
  let page = state
    .store
    .list_reports(&query, Some(viewer.user_id))
    .await
    .map_err(Error::from_store)?;
  Ok(Json(page))
}

/// `GET /reports/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(viewer): CurrentUser,
  Id(report_id): Id,
) -> Result<Json<ReportView>, Error>
where
  S: BoardStore + Clone + 'static,
{
  state
    .store
    .get_report(report_id, Some(viewer.user_id))
    .await
    .map_err(Error::from_store)?
    .map(Json)
    .ok_or_else(|| Error::not_found("Ripoti haipo."))
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;

  fn params(start: &str, end: &str) -> ListParams {
    ListParams {
      clinic:     Some("  ".into()),
      username:   Some("AminaJuma".into()),
      search:     None,
      start_date: Some(start.into()),
      end_date:   Some(end.into()),
      page:       Some("2".into()),
      limit:      Some("abc".into()),
    }
  }

  #[test]
  fn params_become_query() {
    let q = params("2024-03-05", "").into_query().unwrap();
    assert_eq!(q.clinic, None);
    assert_eq!(q.username.as_deref(), Some("AminaJuma"));
    assert_eq!(q.start, Some(Utc.with_ymd_and_hms(2024, 3, 4, 21, 0, 0).unwrap()));
    assert_eq!(q.end, None);
    assert_eq!(q.page(), 2);
    assert_eq!(q.limit(), 15);
  }

  #[test]
  fn bad_date_is_rejected() {
    assert!(matches!(params("jana", "").into_query(), Err(Error::BadRequest(_))));
  }
}
