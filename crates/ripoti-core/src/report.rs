//! Reports and everything attached to them: comments, reactions, mentions.
//!
//! Reports, comments and reactions are append-only. The only mutable state is
//! the read flag on a [`Mention`].

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, mention::link_mentions, time::format_eat};

// ─── Reactions ───────────────────────────────────────────────────────────────

/// A thumbs-up or thumbs-down on a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
  Up,
  Down,
}

impl ReactionKind {
  /// The value stored in the `reactions.kind` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Up => "up",
      Self::Down => "down",
    }
  }
}

impl FromStr for ReactionKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "up" => Ok(Self::Up),
      "down" => Ok(Self::Down),
      other => Err(Error::UnknownReaction(other.to_owned())),
    }
  }
}

impl fmt::Display for ReactionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Aggregated reaction totals for one report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbCounts {
  pub thumbs_up:   i64,
  pub thumbs_down: i64,
}

// ─── Reports ─────────────────────────────────────────────────────────────────

/// A report as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
  #[serde(rename = "id")]
  pub report_id:   i64,
  pub user_id:     i64,
  pub title:       String,
  pub description: String,
  /// Public URL on the image host, if an image was attached.
  pub image:       Option<String>,
  /// Server-assigned; never changes after creation.
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::BoardStore::create_report`].
#[derive(Debug, Clone)]
pub struct NewReport {
  pub user_id:     i64,
  pub title:       String,
  pub description: String,
  pub image:       Option<String>,
}

/// The read model for a report: the stored row plus author details, reaction
/// totals, the viewer's own reaction and the comment thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportView {
  #[serde(flatten)]
  pub report:     Report,
  pub username:   String,
  pub clinic:     String,
  /// `created_at` rendered in East Africa Time.
  pub timestamp:  String,
  #[serde(flatten)]
  pub thumbs:     ThumbCounts,
  /// The reaction left by the requesting user, if any.
  pub user_thumb: Option<ReactionKind>,
  /// Oldest first.
  pub comments:   Vec<CommentView>,
}

impl ReportView {
  pub fn new(report: Report, username: String, clinic: String) -> Self {
    Self {
      timestamp: format_eat(report.created_at),
      report,
      username,
      clinic,
      thumbs: ThumbCounts::default(),
      user_thumb: None,
      comments: Vec::new(),
    }
  }
}

/// One page of [`ReportView`]s plus the pagination envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPage {
  pub reports:     Vec<ReportView>,
  pub page:        u32,
  pub total_pages: u32,
  pub total:       u64,
}

// ─── Comments ────────────────────────────────────────────────────────────────

/// A comment as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  #[serde(rename = "id")]
  pub comment_id: i64,
  pub report_id:  i64,
  pub user_id:    i64,
  #[serde(rename = "comment")]
  pub text:       String,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::BoardStore::add_comment`].
#[derive(Debug, Clone)]
pub struct NewComment {
  pub report_id: i64,
  pub user_id:   i64,
  pub text:      String,
}

/// A comment with its author's details and a display rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
  #[serde(flatten)]
  pub comment:   Comment,
  pub username:  String,
  pub clinic:    String,
  pub timestamp: String,
  /// HTML-escaped text with `@name` turned into profile links.
  pub html:      String,
}

impl CommentView {
  pub fn new(comment: Comment, username: String, clinic: String) -> Self {
    Self {
      timestamp: format_eat(comment.created_at),
      html: link_mentions(&comment.text),
      comment,
      username,
      clinic,
    }
  }
}

// ─── Mentions ────────────────────────────────────────────────────────────────

/// A notification that a user was named in a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
  #[serde(rename = "id")]
  pub mention_id:        i64,
  pub report_id:         i64,
  pub comment_id:        i64,
  pub mentioned_user_id: i64,
  pub created_at:        DateTime<Utc>,
  pub is_read:           bool,
}

/// An unread mention joined with enough context to render a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentionView {
  #[serde(flatten)]
  pub mention:      Mention,
  pub comment:      String,
  /// Title of the report the comment was left on.
  pub title:        String,
  /// Author of the comment.
  pub comment_user: String,
  /// Owner of the report.
  pub report_user:  String,
  pub timestamp:    String,
}
