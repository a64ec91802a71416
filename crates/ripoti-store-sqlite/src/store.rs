//! [`SqliteStore`]: the SQLite implementation of [`BoardStore`].

use std::{collections::HashMap, path::Path};

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, types::Value};
use tracing::debug;

use ripoti_core::{
  Error as CoreError,
  mention::extract_mentions,
  query::ReportQuery,
  report::{
    Comment, CommentView, Mention, MentionView, NewComment, NewReport,
    ReactionKind, Report, ReportPage, ReportView, ThumbCounts,
  },
  store::BoardStore,
  user::{LoginRecord, NewSession, NewUser, User},
  username::{base_username, candidate},
};

use crate::{
  Error, Result,
  encode::{
    RawComment, RawMention, RawReport, RawUser, USER_COLUMNS, encode_dt,
    escape_like, now,
  },
  schema::SCHEMA,
};

/// Reports joined with their author and reaction totals. `?1` is the viewer.
const REPORT_SELECT: &str = "
  SELECT r.report_id, r.user_id, r.title, r.description, r.image, r.created_at,
         u.username, u.kituo,
         COALESCE(SUM(x.kind = 'up'), 0)   AS thumbs_up,
         COALESCE(SUM(x.kind = 'down'), 0) AS thumbs_down,
         MAX(CASE WHEN x.user_id = ?1 THEN x.kind END) AS user_thumb
  FROM reports r
  JOIN users u           ON u.user_id   = r.user_id
  LEFT JOIN reactions x  ON x.report_id = r.report_id";

const COMMENT_SELECT: &str = "
  SELECT c.comment_id, c.report_id, c.user_id, c.body, c.created_at,
         u.username, u.kituo
  FROM comments c
  JOIN users u ON u.user_id = c.user_id";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Ripoti store backed by a single SQLite file.
///
/// Clones share the same background connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// What happened to a reaction attempt, decided on the database thread.
enum ReactOutcome {
  Recorded(ThumbCounts),
  ReportMissing,
  OwnReport,
  AlreadyReacted,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a private in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn user_where(&self, column: &'static str, value: Value) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
        Ok(
          conn
            .query_row(&sql, [value], |row| RawUser::from_row(row, 0))
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawUser::into_user))
  }
}

/// Comments for every report in `report_ids`, grouped by report, oldest first.
fn comments_for(
  conn: &rusqlite::Connection,
  report_ids: &[i64],
) -> rusqlite::Result<HashMap<i64, Vec<RawComment>>> {
  let mut grouped: HashMap<i64, Vec<RawComment>> = HashMap::new();
  if report_ids.is_empty() {
    return Ok(grouped);
  }

  let placeholders = vec!["?"; report_ids.len()].join(", ");
  let sql = format!(
    "{COMMENT_SELECT} WHERE c.report_id IN ({placeholders}) ORDER BY c.comment_id ASC"
  );
  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt.query_map(rusqlite::params_from_iter(report_ids), RawComment::from_row)?;
  for row in rows {
    let row = row?;
    grouped.entry(row.report_id).or_default().push(row);
  }
  Ok(grouped)
}

/// Attach comments to report rows, preserving the report order.
fn assemble(
  raws: Vec<RawReport>,
  mut comments: HashMap<i64, Vec<RawComment>>,
) -> Result<Vec<ReportView>> {
  raws
    .into_iter()
    .map(|raw| {
      let thread = comments
        .remove(&raw.report_id)
        .unwrap_or_default()
        .into_iter()
        .map(RawComment::into_view)
        .collect::<Result<Vec<_>>>()?;
      raw.into_view(thread)
    })
    .collect()
}

/// Build the `WHERE` clause and its parameters for a [`ReportQuery`].
/// Parameters are positional and follow any the caller has already bound.
fn report_filters(query: &ReportQuery) -> (String, Vec<Value>) {
  let mut conds: Vec<&'static str> = vec![];
  let mut params: Vec<Value> = vec![];

  if let Some(clinic) = query.clinic.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
    conds.push("LOWER(u.kituo) = LOWER(?)");
    params.push(Value::Text(clinic.to_owned()));
  }
  if let Some(username) = query.username.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
    conds.push("u.username = ?");
    params.push(Value::Text(username.to_lowercase()));
  }
  if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
    let pattern = format!("%{}%", escape_like(search));
    conds.push("(r.title LIKE ? ESCAPE '\\' OR r.description LIKE ? ESCAPE '\\')");
    params.push(Value::Text(pattern.clone()));
    params.push(Value::Text(pattern));
  }
  if let Some(start) = query.start {
    conds.push("r.created_at >= ?");
    params.push(Value::Text(encode_dt(start)));
  }
  if let Some(end) = query.end {
    conds.push("r.created_at <= ?");
    params.push(Value::Text(encode_dt(end)));
  }

  let where_clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };
  (where_clause, params)
}

fn viewer_param(viewer: Option<i64>) -> Value { viewer.map_or(Value::Null, Value::Integer) }

fn thumb_counts(conn: &rusqlite::Connection, report_id: i64) -> rusqlite::Result<ThumbCounts> {
  conn.query_row(
    "SELECT COALESCE(SUM(kind = 'up'), 0), COALESCE(SUM(kind = 'down'), 0)
     FROM reactions WHERE report_id = ?1",
    [report_id],
    |row| {
      Ok(ThumbCounts {
        thumbs_up:   row.get(0)?,
        thumbs_down: row.get(1)?,
      })
    },
  )
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

// ─── BoardStore impl ─────────────────────────────────────────────────────────

impl BoardStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let base = base_username(&input.jina, &input.ukoo).ok_or_else(|| {
      CoreError::EmptyUsername(format!("{}{}", input.jina, input.ukoo))
    })?;

    let user = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let username = {
          let mut taken = tx.prepare("SELECT 1 FROM users WHERE username = ?1")?;
          let mut n = 1;
          loop {
            let name = candidate(&base, n);
            if !taken.exists([&name])? {
              break name;
            }
            n += 1;
          }
        };

        tx.execute(
          "INSERT INTO users (jina, ukoo, namba, kituo, username, password)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            input.jina,
            input.ukoo,
            input.namba,
            input.kituo,
            username,
            input.password_hash,
          ],
        )?;
        let user_id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(User {
          user_id,
          jina: input.jina,
          ukoo: input.ukoo,
          namba: input.namba,
          kituo: input.kituo,
          username,
        })
      })
      .await?;

    debug!(username = %user.username, "registered user");
    Ok(user)
  }

  async fn find_login(&self, username: &str) -> Result<Option<LoginRecord>> {
    let username = username.trim().to_lowercase();

    let raw: Option<(RawUser, String)> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {USER_COLUMNS}, password FROM users WHERE username = ?1");
        Ok(
          conn
            .query_row(&sql, [username], |row| {
              Ok((RawUser::from_row(row, 0)?, row.get(6)?))
            })
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(|(user, password_hash)| LoginRecord {
      user: user.into_user(),
      password_hash,
    }))
  }

  async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
    self.user_where("user_id", Value::Integer(user_id)).await
  }

  async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
    self
      .user_where("username", Value::Text(username.trim().to_lowercase()))
      .await
  }

  async fn list_usernames(&self, prefix: Option<&str>) -> Result<Vec<String>> {
    let pattern = prefix
      .map(str::trim)
      .filter(|p| !p.is_empty())
      .map(|p| format!("{}%", escape_like(&p.to_lowercase())));

    let names = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT username FROM users
           WHERE ?1 IS NULL OR username LIKE ?1 ESCAPE '\\'
           ORDER BY username ASC",
        )?;
        let rows = stmt
          .query_map([pattern], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(names)
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn create_session(&self, input: NewSession) -> Result<()> {
    let expires_at = encode_dt(input.expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (session_id, user_id, expires_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![input.session_id, input.user_id, expires_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn session_user(&self, session_id: &str, now: DateTime<Utc>) -> Result<Option<User>> {
    let session_id = session_id.to_owned();
    let now_str    = encode_dt(now);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT u.user_id, u.jina, u.ukoo, u.namba, u.kituo, u.username
               FROM sessions s JOIN users u ON u.user_id = s.user_id
               WHERE s.session_id = ?1 AND s.expires_at > ?2",
              rusqlite::params![session_id, now_str],
              |row| {
                RawUser::from_row(row, 0)
              },
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawUser::into_user))
  }

  async fn delete_session(&self, session_id: &str) -> Result<()> {
    let session_id = session_id.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM sessions WHERE session_id = ?1", [session_id])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
    let now_str = encode_dt(now);

    let removed = self
      .conn
      .call(move |conn| Ok(conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", [now_str])?))
      .await?;

    if removed > 0 {
      debug!(removed, "purged expired sessions");
    }
    Ok(removed)
  }

  // ── Reports ───────────────────────────────────────────────────────────────

  async fn create_report(&self, input: NewReport) -> Result<ReportView> {
    let created_at = now();
    let at_str     = encode_dt(created_at);
    let title       = input.title.clone();
    let description = input.description.clone();
    let image       = input.image.clone();

    let (report_id, username, clinic): (i64, String, String) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO reports (user_id, title, description, image, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![input.user_id, title, description, image, at_str],
        )?;
        let report_id = tx.last_insert_rowid();
        let (username, clinic): (String, String) = tx.query_row(
          "SELECT username, kituo FROM users WHERE user_id = ?1",
          [input.user_id],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        tx.commit()?;
        Ok((report_id, username, clinic))
      })
      .await?;

    let report = Report {
      report_id,
      user_id: input.user_id,
      title: input.title,
      description: input.description,
      image: input.image,
      created_at,
    };
    Ok(ReportView::new(report, username, clinic))
  }

  async fn get_report(&self, report_id: i64, viewer: Option<i64>) -> Result<Option<ReportView>> {
    let found: Option<(RawReport, HashMap<i64, Vec<RawComment>>)> = self
      .conn
      .call(move |conn| {
        let sql = format!("{REPORT_SELECT} WHERE r.report_id = ?2 GROUP BY r.report_id");
        let raw = conn
          .query_row(
            &sql,
            rusqlite::params![viewer_param(viewer), report_id],
            RawReport::from_row,
          )
          .optional()?;

        match raw {
          Some(raw) => {
            let comments = comments_for(conn, &[raw.report_id])?;
            Ok(Some((raw, comments)))
          }
          None => Ok(None),
        }
      })
      .await?;

    match found {
      Some((raw, comments)) => Ok(assemble(vec![raw], comments)?.pop()),
      None => Ok(None),
    }
  }

  async fn list_reports(&self, query: &ReportQuery, viewer: Option<i64>) -> Result<ReportPage> {
    let (where_clause, filter_params) = report_filters(query);
    let limit  = i64::from(query.limit());
    let offset = i64::try_from(query.offset()).unwrap_or(i64::MAX);

    let (total, raws, comments): (i64, Vec<RawReport>, HashMap<i64, Vec<RawComment>>) = self
      .conn
      .call(move |conn| {
        let count_sql = format!(
          "SELECT COUNT(*) FROM reports r JOIN users u ON u.user_id = r.user_id {where_clause}"
        );
        let total: i64 = conn.query_row(
          &count_sql,
          rusqlite::params_from_iter(filter_params.iter()),
          |row| row.get(0),
        )?;

        // The viewer is ?1; the filters follow it positionally.
        let list_sql = format!(
          "{REPORT_SELECT} {where_clause}
           GROUP BY r.report_id
           ORDER BY r.report_id DESC
           LIMIT ? OFFSET ?"
        );
        let mut params = Vec::with_capacity(filter_params.len() + 3);
        params.push(viewer_param(viewer));
        params.extend(filter_params);
        params.push(Value::Integer(limit));
        params.push(Value::Integer(offset));

        let mut stmt = conn.prepare(&list_sql)?;
        let raws = stmt
          .query_map(rusqlite::params_from_iter(params), RawReport::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let ids: Vec<i64> = raws.iter().map(|r| r.report_id).collect();
        let comments = comments_for(conn, &ids)?;
        Ok((total, raws, comments))
      })
      .await?;

    let reports = assemble(raws, comments)?;
    Ok(query.into_page(reports, u64::try_from(total).unwrap_or_default()))
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn add_comment(&self, input: NewComment) -> Result<(CommentView, Vec<Mention>)> {
    let report_id  = input.report_id;
    let created_at = now();
    let at_str     = encode_dt(created_at);
    let names      = extract_mentions(&input.text);
    let text       = input.text.clone();

    let inserted: Option<(i64, String, String, Vec<(i64, i64)>)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists = tx
          .prepare("SELECT 1 FROM reports WHERE report_id = ?1")?
          .exists([report_id])?;
        if !exists {
          return Ok(None);
        }

        tx.execute(
          "INSERT INTO comments (report_id, user_id, body, created_at) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![report_id, input.user_id, text, at_str],
        )?;
        let comment_id = tx.last_insert_rowid();

        let (username, clinic): (String, String) = tx.query_row(
          "SELECT username, kituo FROM users WHERE user_id = ?1",
          [input.user_id],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let mut mentioned = Vec::new();
        for name in names {
          let user_id: Option<i64> = tx
            .query_row("SELECT user_id FROM users WHERE username = ?1", [&name], |row| row.get(0))
            .optional()?;
          if let Some(user_id) = user_id {
            tx.execute(
              "INSERT INTO mentions (report_id, comment_id, mentioned_user_id, created_at)
               VALUES (?1, ?2, ?3, ?4)",
              rusqlite::params![report_id, comment_id, user_id, at_str],
            )?;
            mentioned.push((tx.last_insert_rowid(), user_id));
          }
        }

        tx.commit()?;
        Ok(Some((comment_id, username, clinic, mentioned)))
      })
      .await?;

    let (comment_id, username, clinic, mentioned) =
      inserted.ok_or(CoreError::ReportNotFound(report_id))?;

    let comment = Comment {
      comment_id,
      report_id,
      user_id: input.user_id,
      text: input.text,
      created_at,
    };
    let mentions = mentioned
      .into_iter()
      .map(|(mention_id, mentioned_user_id)| Mention {
        mention_id,
        report_id,
        comment_id,
        mentioned_user_id,
        created_at,
        is_read: false,
      })
      .collect();

    Ok((CommentView::new(comment, username, clinic), mentions))
  }

  // ── Reactions ─────────────────────────────────────────────────────────────

  async fn react(&self, report_id: i64, user_id: i64, kind: ReactionKind) -> Result<ThumbCounts> {
    let at_str = encode_dt(now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let author: Option<i64> = tx
          .query_row("SELECT user_id FROM reports WHERE report_id = ?1", [report_id], |row| {
            row.get(0)
          })
          .optional()?;
        match author {
          None => return Ok(ReactOutcome::ReportMissing),
          Some(author) if author == user_id => return Ok(ReactOutcome::OwnReport),
          Some(_) => {}
        }

        let inserted = tx.execute(
          "INSERT INTO reactions (report_id, user_id, kind, created_at) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![report_id, user_id, kind.as_str(), at_str],
        );
        match inserted {
          Ok(_) => {}
          Err(e) if is_unique_violation(&e) => return Ok(ReactOutcome::AlreadyReacted),
          Err(e) => return Err(e.into()),
        }

        let counts = thumb_counts(&tx, report_id)?;
        tx.commit()?;
        Ok(ReactOutcome::Recorded(counts))
      })
      .await?;

    match outcome {
      ReactOutcome::Recorded(counts) => Ok(counts),
      ReactOutcome::ReportMissing => Err(CoreError::ReportNotFound(report_id).into()),
      ReactOutcome::OwnReport => Err(CoreError::OwnReport(report_id).into()),
      ReactOutcome::AlreadyReacted => Err(CoreError::AlreadyReacted(report_id).into()),
    }
  }

  // ── Mentions ──────────────────────────────────────────────────────────────

  async fn unread_mentions(&self, user_id: i64) -> Result<Vec<MentionView>> {
    let raws: Vec<RawMention> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT m.mention_id, m.report_id, m.comment_id, m.mentioned_user_id,
                  m.created_at, m.is_read,
                  c.body, r.title,
                  cu.username AS comment_user,
                  ru.username AS report_user
           FROM mentions m
           JOIN comments c  ON c.comment_id = m.comment_id
           JOIN reports  r  ON r.report_id  = m.report_id
           JOIN users    cu ON cu.user_id   = c.user_id
           JOIN users    ru ON ru.user_id   = r.user_id
           WHERE m.mentioned_user_id = ?1 AND m.is_read = 0
           ORDER BY m.created_at DESC, m.mention_id DESC",
        )?;
        let rows = stmt
          .query_map([user_id], RawMention::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMention::into_view).collect()
  }

  async fn mark_mention_read(&self, mention_id: i64, user_id: i64) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE mentions SET is_read = 1 WHERE mention_id = ?1 AND mentioned_user_id = ?2",
          [mention_id, user_id],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }
}
