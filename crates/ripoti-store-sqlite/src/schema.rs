//! SQL schema for the Ripoti SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    jina      TEXT NOT NULL,
    ukoo      TEXT NOT NULL,
    namba     TEXT NOT NULL,
    kituo     TEXT NOT NULL,
    username  TEXT NOT NULL UNIQUE,   -- always lowercase
    password  TEXT NOT NULL           -- argon2 PHC string
);

CREATE TABLE IF NOT EXISTS sessions (
    session_id  TEXT PRIMARY KEY,
    user_id     INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    expires_at  TEXT NOT NULL
);

-- Reports, comments and reactions are append-only.
CREATE TABLE IF NOT EXISTS reports (
    report_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id      INTEGER NOT NULL REFERENCES users(user_id),
    title        TEXT NOT NULL,
    description  TEXT NOT NULL,
    image        TEXT,
    created_at   TEXT NOT NULL    -- RFC 3339 UTC, fixed width
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    report_id   INTEGER NOT NULL REFERENCES reports(report_id),
    user_id     INTEGER NOT NULL REFERENCES users(user_id),
    body        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- One reaction per user per report.
CREATE TABLE IF NOT EXISTS reactions (
    report_id   INTEGER NOT NULL REFERENCES reports(report_id),
    user_id     INTEGER NOT NULL REFERENCES users(user_id),
    kind        TEXT NOT NULL CHECK (kind IN ('up', 'down')),
    created_at  TEXT NOT NULL,
    UNIQUE (report_id, user_id)
);

CREATE TABLE IF NOT EXISTS mentions (
    mention_id         INTEGER PRIMARY KEY AUTOINCREMENT,
    report_id          INTEGER NOT NULL REFERENCES reports(report_id) ON DELETE CASCADE,
    comment_id         INTEGER NOT NULL REFERENCES comments(comment_id) ON DELETE CASCADE,
    mentioned_user_id  INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at         TEXT NOT NULL,
    is_read            INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS reports_user_idx     ON reports(user_id);
CREATE INDEX IF NOT EXISTS reports_created_idx  ON reports(created_at);
CREATE INDEX IF NOT EXISTS comments_report_idx  ON comments(report_id);
CREATE INDEX IF NOT EXISTS mentions_user_idx    ON mentions(mentioned_user_id, is_read);
CREATE INDEX IF NOT EXISTS sessions_expires_idx ON sessions(expires_at);

PRAGMA user_version = 1;
";
