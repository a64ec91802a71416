//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings in UTC
//! (`2024-03-05T09:00:00.000000Z`), so comparing the text compares the time.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use ripoti_core::{
  report::{
    Comment, CommentView, Mention, MentionView, ReactionKind, Report,
    ReportView, ThumbCounts,
  },
  time::format_eat,
  user::User,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// The current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

// ─── LIKE patterns ───────────────────────────────────────────────────────────

/// Escape `%`, `_` and `\` so `s` matches literally inside a
/// `LIKE … ESCAPE '\'` pattern.
pub fn escape_like(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawUser`]; every query selecting users uses it.
pub const USER_COLUMNS: &str = "user_id, jina, ukoo, namba, kituo, username";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:  i64,
  pub jina:     String,
  pub ukoo:     String,
  pub namba:    String,
  pub kituo:    String,
  pub username: String,
}

impl RawUser {
  /// Read the [`USER_COLUMNS`] starting at column `first`.
  pub fn from_row(row: &rusqlite::Row<'_>, first: usize) -> rusqlite::Result<Self> {
    Ok(RawUser {
      user_id:  row.get(first)?,
      jina:     row.get(first + 1)?,
      ukoo:     row.get(first + 2)?,
      namba:    row.get(first + 3)?,
      kituo:    row.get(first + 4)?,
      username: row.get(first + 5)?,
    })
  }

  pub fn into_user(self) -> User {
    User {
      user_id:  self.user_id,
      jina:     self.jina,
      ukoo:     self.ukoo,
      namba:    self.namba,
      kituo:    self.kituo,
      username: self.username,
    }
  }
}

/// A `reports` row joined with its author and aggregated reactions.
pub struct RawReport {
  pub report_id:   i64,
  pub user_id:     i64,
  pub title:       String,
  pub description: String,
  pub image:       Option<String>,
  pub created_at:  String,
  // users join
  pub username:    String,
  pub clinic:      String,
  // reactions aggregate
  pub thumbs_up:   i64,
  pub thumbs_down: i64,
  pub user_thumb:  Option<String>,
}

impl RawReport {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawReport {
      report_id:   row.get(0)?,
      user_id:     row.get(1)?,
      title:       row.get(2)?,
      description: row.get(3)?,
      image:       row.get(4)?,
      created_at:  row.get(5)?,
      username:    row.get(6)?,
      clinic:      row.get(7)?,
      thumbs_up:   row.get(8)?,
      thumbs_down: row.get(9)?,
      user_thumb:  row.get(10)?,
    })
  }

  pub fn into_view(self, comments: Vec<CommentView>) -> Result<ReportView> {
    let report = Report {
      report_id:   self.report_id,
      user_id:     self.user_id,
      title:       self.title,
      description: self.description,
      image:       self.image.filter(|url| !url.is_empty()),
      created_at:  decode_dt(&self.created_at)?,
    };

    let mut view = ReportView::new(report, self.username, self.clinic);
    view.thumbs = ThumbCounts {
      thumbs_up:   self.thumbs_up,
      thumbs_down: self.thumbs_down,
    };
    view.user_thumb = self
      .user_thumb
      .as_deref()
      .map(str::parse::<ReactionKind>)
      .transpose()?;
    view.comments = comments;
    Ok(view)
  }
}

/// A `comments` row joined with its author.
pub struct RawComment {
  pub comment_id: i64,
  pub report_id:  i64,
  pub user_id:    i64,
  pub body:       String,
  pub created_at: String,
  pub username:   String,
  pub clinic:     String,
}

impl RawComment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawComment {
      comment_id: row.get(0)?,
      report_id:  row.get(1)?,
      user_id:    row.get(2)?,
      body:       row.get(3)?,
      created_at: row.get(4)?,
      username:   row.get(5)?,
      clinic:     row.get(6)?,
    })
  }

  pub fn into_view(self) -> Result<CommentView> {
    let comment = Comment {
      comment_id: self.comment_id,
      report_id:  self.report_id,
      user_id:    self.user_id,
      text:       self.body,
      created_at: decode_dt(&self.created_at)?,
    };
    Ok(CommentView::new(comment, self.username, self.clinic))
  }
}

/// A `mentions` row joined with the comment, the report, and both users.
pub struct RawMention {
  pub mention_id:        i64,
  pub report_id:         i64,
  pub comment_id:        i64,
  pub mentioned_user_id: i64,
  pub created_at:        String,
  pub is_read:           bool,
  pub comment:           String,
  pub title:             String,
  pub comment_user:      String,
  pub report_user:       String,
}

impl RawMention {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawMention {
      mention_id:        row.get(0)?,
      report_id:         row.get(1)?,
      comment_id:        row.get(2)?,
      mentioned_user_id: row.get(3)?,
      created_at:        row.get(4)?,
      is_read:           row.get(5)?,
      comment:           row.get(6)?,
      title:             row.get(7)?,
      comment_user:      row.get(8)?,
      report_user:       row.get(9)?,
    })
  }

  pub fn into_view(self) -> Result<MentionView> {
    let created_at = decode_dt(&self.created_at)?;
    Ok(MentionView {
      mention:      Mention {
        mention_id:        self.mention_id,
        report_id:         self.report_id,
        comment_id:        self.comment_id,
        mentioned_user_id: self.mentioned_user_id,
        created_at,
        is_read:           self.is_read,
      },
      comment:      self.comment,
      title:        self.title,
      comment_user: self.comment_user,
      report_user:  self.report_user,
      timestamp:    format_eat(created_at),
    })
  }
}
