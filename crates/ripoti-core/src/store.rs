//! The `BoardStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `ripoti-store-sqlite`).
//! The server depends on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  error::DomainError,
  query::ReportQuery,
  report::{
    CommentView, Mention, MentionView, NewComment, NewReport, ReactionKind,
    ReportPage, ReportView, ThumbCounts,
  },
  user::{LoginRecord, NewSession, NewUser, User},
};

/// Abstraction over a Ripoti store backend.
///
/// Reports, comments and reactions are append-only. Methods that read reports
/// take the id of the requesting user (`viewer`) so the view can carry that
/// user's own reaction.
///
/// Rule violations (unknown report, own report, second reaction, …) surface
/// as errors whose [`DomainError::as_domain`] yields the matching
/// [`crate::Error`].
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait BoardStore: Send + Sync {
  type Error: std::error::Error + DomainError + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Register a user. The username is derived from the name fields and
  /// suffixed with a number if the base is already taken.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Look up a user and their password hash by (case-insensitive) username.
  fn find_login<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<LoginRecord>, Self::Error>> + Send + 'a;

  fn get_user(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn get_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// All usernames in ascending order, optionally restricted to a prefix.
  fn list_usernames<'a>(
    &'a self,
    prefix: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'a;

  // ── Sessions ──────────────────────────────────────────────────────────

  fn create_session(
    &self,
    input: NewSession,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The user owning session `session_id`, if the session exists and has not
  /// expired at `now`.
  fn session_user<'a>(
    &'a self,
    session_id: &'a str,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn delete_session<'a>(
    &'a self,
    session_id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove every session that expired before `now`; returns how many.
  fn purge_expired_sessions(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Reports ───────────────────────────────────────────────────────────

  /// Persist a report. The timestamp is set by the store.
  fn create_report(
    &self,
    input: NewReport,
  ) -> impl Future<Output = Result<ReportView, Self::Error>> + Send + '_;

  /// A single report with its comments. Returns `None` if not found.
  fn get_report(
    &self,
    report_id: i64,
    viewer: Option<i64>,
  ) -> impl Future<Output = Result<Option<ReportView>, Self::Error>> + Send + '_;

  /// One page of reports matching `query`, newest first.
  fn list_reports<'a>(
    &'a self,
    query: &'a ReportQuery,
    viewer: Option<i64>,
  ) -> impl Future<Output = Result<ReportPage, Self::Error>> + Send + 'a;

  // ── Comments ──────────────────────────────────────────────────────────

  /// Record a comment and one mention per `@username` in its text that
  /// resolves to a registered user.
  ///
  /// Returns an error if the report does not exist.
  fn add_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<(CommentView, Vec<Mention>), Self::Error>> + Send + '_;

  // ── Reactions ─────────────────────────────────────────────────────────

  /// Record a reaction and return the new totals for the report.
  ///
  /// Returns an error if the report does not exist, if `user_id` wrote the
  /// report, or if the user has already reacted to it.
  fn react(
    &self,
    report_id: i64,
    user_id: i64,
    kind: ReactionKind,
  ) -> impl Future<Output = Result<ThumbCounts, Self::Error>> + Send + '_;

  // ── Mentions ──────────────────────────────────────────────────────────

  /// Unread mentions of `user_id`, newest first.
  fn unread_mentions(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<Vec<MentionView>, Self::Error>> + Send + '_;

  /// Mark a mention read. Only the mentioned user may do so; returns `false`
  /// when no mention of `user_id` has that id.
  fn mark_mention_read(
    &self,
    mention_id: i64,
    user_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
