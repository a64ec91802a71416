//! Report listing filters and pagination math.

use chrono::{DateTime, Utc};

use crate::report::{ReportPage, ReportView};

pub const DEFAULT_PAGE_SIZE: u32 = 15;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Parameters for [`crate::store::BoardStore::list_reports`].
///
/// Every filter is optional; absent filters match everything. Results are
/// always newest first.
#[derive(Debug, Clone, Default)]
pub struct ReportQuery {
  /// Case-insensitive exact match on the author's clinic.
  pub clinic:   Option<String>,
  /// Exact match on the author's username (compared lowercased).
  pub username: Option<String>,
  /// Case-insensitive substring of the title or description.
  pub search:   Option<String>,
  /// Inclusive lower bound on the report timestamp.
  pub start:    Option<DateTime<Utc>>,
  /// Inclusive upper bound on the report timestamp.
  pub end:      Option<DateTime<Utc>>,
  /// 1-based page number; defaults to 1.
  pub page:     Option<u32>,
  /// Page size; defaults to [`DEFAULT_PAGE_SIZE`], capped at [`MAX_PAGE_SIZE`].
  pub limit:    Option<u32>,
}

impl ReportQuery {
  pub fn page(&self) -> u32 { self.page.unwrap_or(1).max(1) }

  pub fn limit(&self) -> u32 {
    self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
  }

  pub fn offset(&self) -> u64 { u64::from(self.page() - 1) * u64::from(self.limit()) }

  /// Wrap one page of results in the pagination envelope.
  pub fn into_page(&self, reports: Vec<ReportView>, total: u64) -> ReportPage {
    ReportPage {
      reports,
      page: self.page(),
      total_pages: total_pages(total, self.limit()),
      total,
    }
  }
}

/// Number of pages needed for `total` items at `limit` per page.
pub fn total_pages(total: u64, limit: u32) -> u32 {
  let limit = u64::from(limit.max(1));
  u32::try_from(total.div_ceil(limit)).unwrap_or(u32::MAX)
}
